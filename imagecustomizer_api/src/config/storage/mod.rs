use serde::{de::Error, Deserialize, Serialize};
use strum_macros::IntoStaticStr;

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

use crate::is_default;

pub mod btrfs;
pub mod disks;
pub mod error;
pub mod filesystem;
pub mod filesystem_types;
pub mod mountpoint;
pub mod partition_size;
pub mod partition_type;
pub mod partitions;
pub mod resolver;
pub mod verity;

use disks::Disk;
use error::StorageError;
use filesystem::FileSystem;
use resolver::{ResolvedStorage, StorageResolver};
use verity::Verity;

/// Storage configuration of the image.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct Storage {
    /// Regenerate the partition and filesystem UUIDs of the base image.
    #[serde(default, skip_serializing_if = "is_default")]
    pub reset_partitions_uuids_type: ResetPartitionsUuidsType,

    /// Boot firmware the new partition layout targets. Required with `disks`.
    #[serde(default, skip_serializing_if = "is_default")]
    pub boot_type: BootType,

    /// Disks to create. Only one disk is supported.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disks: Vec<Disk>,

    /// Filesystems to create on partitions or verity devices.
    #[serde(default, rename = "filesystems", skip_serializing_if = "Vec::is_empty")]
    pub file_systems: Vec<FileSystem>,

    /// Verity devices to create or to reconfigure.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verity: Vec<Verity>,

    /// Whether verity is reinitialized on the verity partitions of the base
    /// image.
    #[serde(default, skip_serializing_if = "is_default")]
    pub reinitialize_verity: ReinitializeVerityType,
}

impl Storage {
    /// Validates the storage configuration and resolves how every device is
    /// used.
    pub fn resolve(&self) -> Result<ResolvedStorage, StorageError> {
        StorageResolver::new(self).resolve()
    }

    pub fn validate(&self) -> Result<(), StorageError> {
        self.resolve().map(|_| ())
    }

    /// Returns whether the configuration replaces the partition layout of the
    /// base image.
    pub fn customize_partitions(&self) -> bool {
        !self.disks.is_empty()
    }
}

/// Boot firmware type.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[serde(rename_all = "kebab-case", try_from = "String")]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
#[strum(serialize_all = "kebab-case")]
pub enum BootType {
    /// # None
    ///
    /// Keep the boot configuration of the base image.
    #[default]
    #[serde(rename = "")]
    #[strum(serialize = "")]
    None,

    /// # EFI
    ///
    /// Boot through UEFI. Requires an `esp` partition.
    Efi,

    /// # Legacy
    ///
    /// Boot through legacy BIOS. Requires a `bios-grub` partition.
    Legacy,
}

impl TryFrom<String> for BootType {
    type Error = serde::de::value::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "" => Ok(BootType::None),
            "efi" => Ok(BootType::Efi),
            "legacy" => Ok(BootType::Legacy),
            _ => Err(Error::custom(format!("invalid bootType value ({value})"))),
        }
    }
}

/// Partition UUID regeneration mode.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[serde(rename_all = "kebab-case", try_from = "String")]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
#[strum(serialize_all = "kebab-case")]
pub enum ResetPartitionsUuidsType {
    /// # Default
    ///
    /// Keep the existing UUIDs.
    #[default]
    #[serde(rename = "")]
    #[strum(serialize = "")]
    Default,

    /// # Reset all
    ///
    /// Regenerate the UUIDs of every partition and filesystem.
    ResetAll,
}

impl TryFrom<String> for ResetPartitionsUuidsType {
    type Error = serde::de::value::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "" => Ok(ResetPartitionsUuidsType::Default),
            "reset-all" => Ok(ResetPartitionsUuidsType::ResetAll),
            _ => Err(Error::custom(format!(
                "invalid resetPartitionsUuidsType value ({value})"
            ))),
        }
    }
}

/// Verity reinitialization mode.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[serde(rename_all = "kebab-case", try_from = "String")]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
#[strum(serialize_all = "kebab-case")]
pub enum ReinitializeVerityType {
    /// # Default
    #[default]
    #[serde(rename = "")]
    #[strum(serialize = "")]
    Default,

    /// # None
    ///
    /// Leave verity untouched.
    None,

    /// # All
    ///
    /// Reinitialize every verity device of the base image.
    All,
}

impl TryFrom<String> for ReinitializeVerityType {
    type Error = serde::de::value::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "" => Ok(ReinitializeVerityType::Default),
            "none" => Ok(ReinitializeVerityType::None),
            "all" => Ok(ReinitializeVerityType::All),
            _ => Err(Error::custom(format!("invalid value ({value})"))),
        }
    }
}
