#[cfg(feature = "schemars")]
use schemars::JsonSchema;

use serde::{de::Error, Deserialize, Serialize};
use strum_macros::{EnumIs, IntoStaticStr};

/// File system types that can be created on a partition or verity device.
#[derive(
    Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, EnumIs, IntoStaticStr,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
#[strum(serialize_all = "lowercase")]
pub enum FileSystemType {
    /// # None
    ///
    /// No file system is created.
    #[default]
    #[serde(rename = "")]
    #[strum(serialize = "")]
    None,

    /// # Ext4 file system
    Ext4,

    /// # XFS file system
    Xfs,

    /// # FAT32 file system
    Fat32,

    /// # Vfat file system
    Vfat,

    /// # BTRFS file system
    ///
    /// Requires the `btrfs` preview feature.
    Btrfs,
}

impl FileSystemType {
    /// Returns whether the type can hold an EFI System Partition.
    pub fn is_fat(&self) -> bool {
        matches!(self, FileSystemType::Fat32 | FileSystemType::Vfat)
    }
}

impl TryFrom<&str> for FileSystemType {
    type Error = serde::de::value::Error;

    fn try_from(fs: &str) -> Result<Self, Self::Error> {
        match fs {
            "" => Ok(FileSystemType::None),
            "ext4" => Ok(FileSystemType::Ext4),
            "xfs" => Ok(FileSystemType::Xfs),
            "fat32" => Ok(FileSystemType::Fat32),
            "vfat" => Ok(FileSystemType::Vfat),
            "btrfs" => Ok(FileSystemType::Btrfs),
            _ => Err(Error::custom(format!("invalid fileSystemType value ({fs})"))),
        }
    }
}

impl TryFrom<String> for FileSystemType {
    type Error = serde::de::value::Error;

    fn try_from(fs: String) -> Result<Self, Self::Error> {
        FileSystemType::try_from(fs.as_str())
    }
}

impl std::fmt::Display for FileSystemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &'static str = self.into();
        f.write_str(name)
    }
}
