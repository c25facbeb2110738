use serde::{Deserialize, Serialize};

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

use crate::{
    config::storage::{
        error::PartitionError, partition_size::PartitionSize, partition_type::PartitionType,
    },
    is_default,
    primitives::{bytes::DiskSize, gpt},
    DeviceId,
};

/// A GPT partition on a disk.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct Partition {
    /// Identifier used to reference the partition from filesystems and
    /// verity devices.
    pub id: DeviceId,

    /// GPT partition name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,

    /// GPT partition type, as a well known name or a type UUID.
    #[serde(default, rename = "type", skip_serializing_if = "is_default")]
    pub partition_type: PartitionType,

    /// Offset of the start of the partition. Defaults to the end of the
    /// previous partition, or to 1 MiB for the first partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DiskSize>,

    /// Offset of the end of the partition (exclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DiskSize>,

    /// Size of the partition. Cannot be combined with `end`.
    #[serde(default, skip_serializing_if = "is_default")]
    pub size: PartitionSize,
}

impl Partition {
    pub fn validate(&self) -> Result<(), PartitionError> {
        gpt::validate_gpt_name(&self.label).map_err(PartitionError::InvalidLabel)?;

        if self.end.is_some() && self.size != PartitionSize::Unset {
            return Err(PartitionError::BothEndAndSize {
                id: self.id.clone(),
            });
        }

        let non_positive = match (self.start, self.end) {
            (Some(start), Some(end)) => end <= start,
            _ => false,
        } || self.size == PartitionSize::Fixed(DiskSize(0));

        if non_positive {
            return Err(PartitionError::NonPositiveSize {
                id: self.id.clone(),
            });
        }

        Ok(())
    }

    /// Returns whether this is the EFI System Partition.
    pub fn is_esp(&self) -> bool {
        self.partition_type == PartitionType::Esp
    }

    /// Returns whether this is the BIOS boot partition.
    pub fn is_bios_boot(&self) -> bool {
        self.partition_type == PartitionType::BiosGrub
    }

    /// Returns the end offset of the partition when it starts at `start`, or
    /// `None` when the partition extends to the end of the disk.
    pub(crate) fn end_from(&self, start: u64) -> Option<u64> {
        match (self.end, self.size) {
            (Some(end), _) => Some(end.bytes()),
            (None, size) => size.fixed().map(|size| start.saturating_add(size)),
        }
    }
}
