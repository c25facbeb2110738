use std::{fmt::Display, str::FromStr};

use crate::{
    constants::PARTITION_SIZE_GROW,
    primitives::bytes::{size_string, DiskSize, DiskSizeError},
};

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

/// Partition size.
///
/// Serialize and Deserialize are implemented manually so that the size can be
/// written as `grow` or as a `DiskSize` string.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub enum PartitionSize {
    /// # Unset
    ///
    /// No size was given. The partition extends to its `end`, or to the end
    /// of the disk when no `end` is given either.
    #[default]
    Unset,

    /// # Grow
    ///
    /// Grow a partition to use all available space.
    ///
    /// String equivalent is defined in constants::PARTITION_SIZE_GROW
    Grow,

    /// # Fixed
    ///
    /// Fixed size in bytes.
    Fixed(DiskSize),
}

impl PartitionSize {
    /// Returns the size in bytes when the size is fixed.
    pub fn fixed(&self) -> Option<u64> {
        match self {
            PartitionSize::Fixed(size) => Some(size.bytes()),
            PartitionSize::Unset | PartitionSize::Grow => None,
        }
    }
}

impl FromStr for PartitionSize {
    type Err = DiskSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "" => PartitionSize::Unset,
            PARTITION_SIZE_GROW => PartitionSize::Grow,
            _ => PartitionSize::Fixed(DiskSize::from_str(s)?),
        })
    }
}

impl From<DiskSize> for PartitionSize {
    fn from(size: DiskSize) -> Self {
        PartitionSize::Fixed(size)
    }
}

impl Display for PartitionSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartitionSize::Unset => Ok(()),
            PartitionSize::Grow => write!(f, "{}", PARTITION_SIZE_GROW),
            PartitionSize::Fixed(size) => write!(f, "{size}"),
        }
    }
}

impl<'de> serde::Deserialize<'de> for PartitionSize {
    fn deserialize<D>(deserializer: D) -> Result<PartitionSize, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = size_string(deserializer)?
            .ok_or_else(|| serde::de::Error::custom("failed to parse partition size"))?;

        PartitionSize::from_str(&value).map_err(|e| {
            serde::de::Error::custom(format!(
                "{e}:\nexpected format: grow | <NUM>(K|M|G|T) (e.g. grow, 100M, 1G)"
            ))
        })
    }
}

impl serde::Serialize for PartitionSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}
