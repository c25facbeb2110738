use lazy_static::lazy_static;
use regex::Regex;
use serde::{de::Error, Deserialize, Serialize};
use strum_macros::IntoStaticStr;

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

use crate::{
    config::storage::{
        error::{IdentifiedPartitionError, VerityError},
        mountpoint::{self, MountIdentifierType},
    },
    constants::{
        BOOT_MOUNT_POINT_PATH, MOUNT_OPTION_READ_ONLY, ROOT_MOUNT_POINT_PATH,
        ROOT_VERITY_DEVICE_NAME, USR_MOUNT_POINT_PATH, USR_VERITY_DEVICE_NAME,
    },
    is_default,
    primitives::{gpt, paths},
    DeviceId,
};

lazy_static! {
    static ref VERITY_NAME_REGEX: Regex = Regex::new("^[a-z]+$").unwrap();
}

/// Verity device configuration.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct Verity {
    /// Id of the verity device, referenced by a filesystem's `deviceId`.
    #[serde(default)]
    pub id: DeviceId,

    /// Name of the verity device, used for the device mapper name.
    ///
    /// Must be `root` for the `/` filesystem and `usr` for the `/usr`
    /// filesystem.
    #[serde(default)]
    pub name: String,

    /// Id of the partition holding the data.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data_device_id: DeviceId,

    /// Existing partition holding the data. Mutually exclusive with
    /// `dataDeviceId`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_device: Option<IdentifiedPartition>,

    /// How the data partition is referenced on the kernel command line.
    #[serde(default, skip_serializing_if = "is_default")]
    pub data_device_mount_id_type: MountIdentifierType,

    /// Id of the partition holding the hash tree.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash_device_id: DeviceId,

    /// Existing partition holding the hash tree. Mutually exclusive with
    /// `hashDeviceId`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_device: Option<IdentifiedPartition>,

    /// How the hash partition is referenced on the kernel command line.
    #[serde(default, skip_serializing_if = "is_default")]
    pub hash_device_mount_id_type: MountIdentifierType,

    /// Specifies how a mismatch between the hash and the data partition is
    /// handled.
    #[serde(default, skip_serializing_if = "is_default")]
    pub corruption_option: CorruptionOption,

    /// Path of the root hash signature file in the image. Must be under
    /// `/boot`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash_signature_path: String,
}

/// Mount of the filesystem on top of a verity device. Filled in by the
/// storage resolver from the owning filesystem.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerityMount {
    /// Path where the filesystem is mounted.
    pub mount_path: String,

    /// Mount options of the filesystem.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mount_options: String,

    /// BTRFS subvolume that is mounted, if any.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subvolume_path: String,
}

impl VerityMount {
    /// Returns whether the filesystem is mounted read-only.
    pub fn is_read_only(&self) -> bool {
        mountpoint::has_mount_option(&self.mount_options, MOUNT_OPTION_READ_ONLY)
    }
}

/// Kind of identifier of an existing partition.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub enum IdentifiedPartitionType {
    /// # Partition label
    ///
    /// The GPT partition name.
    #[default]
    PartLabel,
}

/// A partition of the base image, identified by one of its properties.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct IdentifiedPartition {
    pub id_type: IdentifiedPartitionType,

    #[serde(default)]
    pub id: String,
}

/// How a verity corruption is handled.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[serde(rename_all = "kebab-case", try_from = "String")]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
#[strum(serialize_all = "kebab-case")]
pub enum CorruptionOption {
    /// # Default
    ///
    /// Same as `io-error`.
    #[default]
    #[serde(rename = "")]
    #[strum(serialize = "")]
    Default,

    /// # IO-Error
    ///
    /// Fails the I/O operation with an I/O error.
    IoError,

    /// # Ignore
    ///
    /// Ignores the corruption and continues operation.
    Ignore,

    /// # Panic
    ///
    /// Causes the system to panic (print errors) and then try restarting.
    Panic,

    /// # Restart
    ///
    /// Attempts to restart the system.
    Restart,
}

impl TryFrom<&str> for CorruptionOption {
    type Error = serde::de::value::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "" => Ok(CorruptionOption::Default),
            "io-error" => Ok(CorruptionOption::IoError),
            "ignore" => Ok(CorruptionOption::Ignore),
            "panic" => Ok(CorruptionOption::Panic),
            "restart" => Ok(CorruptionOption::Restart),
            _ => Err(Error::custom(format!(
                "invalid CorruptionOption value ({value})"
            ))),
        }
    }
}

impl TryFrom<String> for CorruptionOption {
    type Error = serde::de::value::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CorruptionOption::try_from(value.as_str())
    }
}

/// Returns the verity device name required for a filesystem mounted at
/// `mount_path`, or `None` if verity is not supported at that path.
pub fn expected_verity_name(mount_path: &str) -> Option<&'static str> {
    match mount_path {
        ROOT_MOUNT_POINT_PATH => Some(ROOT_VERITY_DEVICE_NAME),
        USR_MOUNT_POINT_PATH => Some(USR_VERITY_DEVICE_NAME),
        _ => None,
    }
}

impl Verity {
    pub fn validate(&self) -> Result<(), VerityError> {
        if self.id.is_empty() {
            return Err(VerityError::EmptyId);
        }

        if !VERITY_NAME_REGEX.is_match(&self.name) {
            return Err(VerityError::InvalidName(self.name.clone()));
        }

        match (self.data_device_id.is_empty(), &self.data_device) {
            (true, None) => return Err(VerityError::MissingDataDevice),
            (false, Some(_)) => return Err(VerityError::BothDataDevices),
            _ => {}
        }

        match (self.hash_device_id.is_empty(), &self.hash_device) {
            (true, None) => return Err(VerityError::MissingHashDevice),
            (false, Some(_)) => return Err(VerityError::BothHashDevices),
            _ => {}
        }

        if self.uses_device_ids() && self.uses_identified_partitions() {
            return Err(VerityError::MixedDeviceStyles);
        }

        if let Some(data_device) = &self.data_device {
            data_device
                .validate()
                .map_err(VerityError::InvalidDataDevice)?;
        }

        if let Some(hash_device) = &self.hash_device {
            hash_device
                .validate()
                .map_err(VerityError::InvalidHashDevice)?;
        }

        if !self.hash_signature_path.is_empty() {
            self.validate_hash_signature_path()?;
        }

        Ok(())
    }

    fn validate_hash_signature_path(&self) -> Result<(), VerityError> {
        let path = &self.hash_signature_path;
        paths::validate_absolute_path(path).map_err(VerityError::InvalidHashSignaturePath)?;

        let cleaned = paths::clean_path(path);
        if &cleaned != path {
            return Err(VerityError::HashSignaturePathNotNormalized {
                path: path.clone(),
                cleaned,
            });
        }

        if !path.starts_with(&format!("{BOOT_MOUNT_POINT_PATH}/")) {
            return Err(VerityError::HashSignaturePathNotUnderBoot(path.clone()));
        }

        Ok(())
    }

    /// Returns whether the data or hash device is referenced by a partition
    /// id of the configuration.
    pub fn uses_device_ids(&self) -> bool {
        !self.data_device_id.is_empty() || !self.hash_device_id.is_empty()
    }

    /// Returns whether the data or hash device is an existing partition of
    /// the base image.
    pub fn uses_identified_partitions(&self) -> bool {
        self.data_device.is_some() || self.hash_device.is_some()
    }
}

impl IdentifiedPartition {
    pub fn validate(&self) -> Result<(), IdentifiedPartitionError> {
        if self.id.is_empty() {
            return Err(IdentifiedPartitionError::EmptyId);
        }

        match self.id_type {
            IdentifiedPartitionType::PartLabel => {
                gpt::validate_gpt_name(&self.id).map_err(IdentifiedPartitionError::InvalidName)
            }
        }
    }
}
