use std::{convert::Infallible, str::FromStr};

use serde::{de::Error, Deserialize, Serialize};
use strum_macros::IntoStaticStr;

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

use crate::{
    config::storage::error::{BtrfsMountOptionsError, MountPointError},
    constants::{MOUNT_OPTION_BTRFS_SUBVOL, MOUNT_OPTION_BTRFS_SUBVOLID},
    is_default,
    primitives::paths,
};

/// How a device is referenced in `/etc/fstab`.
#[derive(
    Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr,
)]
#[serde(rename_all = "kebab-case", try_from = "String")]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
#[strum(serialize_all = "kebab-case")]
pub enum MountIdentifierType {
    /// # Default
    ///
    /// Use the default identifier, which is the partition UUID.
    #[default]
    #[serde(rename = "")]
    #[strum(serialize = "")]
    Default,

    /// # UUID
    ///
    /// Reference the filesystem UUID.
    Uuid,

    /// # Partition UUID
    ///
    /// Reference the GPT partition UUID (`PARTUUID`).
    PartUuid,

    /// # Partition label
    ///
    /// Reference the GPT partition name (`PARTLABEL`). The partition must
    /// have a unique label.
    PartLabel,

    /// # Device
    ///
    /// Reference the device path.
    Dev,
}

impl TryFrom<&str> for MountIdentifierType {
    type Error = serde::de::value::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "" => Ok(MountIdentifierType::Default),
            "uuid" => Ok(MountIdentifierType::Uuid),
            "part-uuid" => Ok(MountIdentifierType::PartUuid),
            "part-label" => Ok(MountIdentifierType::PartLabel),
            "dev" => Ok(MountIdentifierType::Dev),
            _ => Err(Error::custom(format!("invalid value ({value})"))),
        }
    }
}

impl TryFrom<String> for MountIdentifierType {
    type Error = serde::de::value::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MountIdentifierType::try_from(value.as_str())
    }
}

/// Mount point configuration of a filesystem or BTRFS subvolume.
///
/// It can be written as a map, or as a plain string holding only the path.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct MountPoint {
    /// How the source device is identified in `/etc/fstab`.
    #[serde(default, skip_serializing_if = "is_default")]
    pub id_type: MountIdentifierType,

    /// Comma separated mount options, passed as is to `/etc/fstab`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub options: String,

    /// Absolute path of the mount point in the image.
    #[serde(default)]
    pub path: String,
}

impl FromStr for MountPoint {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(MountPoint {
            path: s.to_owned(),
            ..Default::default()
        })
    }
}

impl MountPoint {
    pub fn validate(&self) -> Result<(), MountPointError> {
        paths::validate_absolute_path(&self.path).map_err(MountPointError::InvalidPath)?;

        if self.options.contains([' ', '\t', '\n']) {
            return Err(MountPointError::InvalidOptions(self.options.clone()));
        }

        Ok(())
    }
}

/// Returns whether the comma separated option list `options` contains
/// `option`.
pub(crate) fn has_mount_option(options: &str, option: &str) -> bool {
    options.split(',').any(|o| o == option)
}

/// Rejects the options the BTRFS subvolume mounts manage themselves.
pub(crate) fn validate_btrfs_mount_options(options: &str) -> Result<(), BtrfsMountOptionsError> {
    if options.is_empty() {
        return Ok(());
    }

    for option in options.split(',') {
        if option.starts_with(MOUNT_OPTION_BTRFS_SUBVOL) {
            return Err(BtrfsMountOptionsError::SubvolNotAllowed);
        }

        if option.starts_with(MOUNT_OPTION_BTRFS_SUBVOLID) {
            return Err(BtrfsMountOptionsError::SubvolidNotAllowed);
        }
    }

    Ok(())
}
