use serde::{Deserialize, Serialize};

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

use crate::{
    config::storage::{
        btrfs::{BtrfsConfig, BtrfsSubvolume},
        error::FileSystemError,
        filesystem_types::FileSystemType,
        mountpoint::{self, MountPoint},
    },
    is_default, DeviceId,
};

/// A filesystem created on a partition or verity device.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct FileSystem {
    /// Id of the partition or verity device holding the filesystem.
    #[serde(default)]
    pub device_id: DeviceId,

    /// Type of the filesystem.
    #[serde(default, rename = "type", skip_serializing_if = "is_default")]
    pub fs_type: FileSystemType,

    /// The mount point of the filesystem.
    ///
    /// It can be provided as an object for more control over the mount
    /// options, or as a just a string holding the path.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::primitives::shortcuts::opt_string_or_struct"
    )]
    #[cfg_attr(
        feature = "schemars",
        schemars(
            schema_with = "crate::primitives::shortcuts::opt_string_or_struct_schema::<MountPoint>"
        )
    )]
    pub mount_point: Option<MountPoint>,

    /// BTRFS specific configuration. Only valid for `btrfs` filesystems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub btrfs: Option<BtrfsConfig>,
}

impl FileSystem {
    pub fn validate(&self) -> Result<(), FileSystemError> {
        if self.device_id.is_empty() {
            return Err(FileSystemError::EmptyDeviceId);
        }

        if let Some(btrfs) = &self.btrfs {
            if !self.fs_type.is_btrfs() {
                return Err(FileSystemError::BtrfsConfigOnNonBtrfs);
            }

            btrfs
                .validate()
                .map_err(FileSystemError::InvalidBtrfsConfig)?;

            if self.mount_point.is_some() && !btrfs.subvolumes.is_empty() {
                return Err(FileSystemError::MountPointWithSubvolumes);
            }
        }

        if let Some(mount_point) = &self.mount_point {
            mount_point
                .validate()
                .map_err(FileSystemError::InvalidMountPoint)?;

            if self.fs_type.is_none() {
                return Err(FileSystemError::MountPointWithoutType);
            }

            if self.fs_type.is_btrfs() {
                mountpoint::validate_btrfs_mount_options(&mount_point.options)
                    .map_err(FileSystemError::InvalidBtrfsMountOptions)?;
            }
        }

        Ok(())
    }

    /// Returns the BTRFS subvolumes that have a mount point.
    pub fn mounted_subvolumes(&self) -> impl Iterator<Item = (&BtrfsSubvolume, &MountPoint)> {
        self.btrfs
            .iter()
            .flat_map(|btrfs| btrfs.mounted_subvolumes())
    }

    /// Returns the path of the filesystem-level mount point, if any.
    pub fn mount_point_path(&self) -> Option<&str> {
        self.mount_point.as_ref().map(|mp| mp.path.as_str())
    }
}
