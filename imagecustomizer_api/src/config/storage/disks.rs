use serde::{Deserialize, Serialize};

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

use crate::{
    config::storage::{error::DiskError, error::PartitionError, partitions::Partition},
    constants::FIRST_PARTITION_START,
    primitives::bytes::DiskSize,
    DeviceId,
};

/// Partition table type of a disk.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub enum PartitionTableType {
    /// # GPT
    ///
    /// GUID Partition Table.
    #[default]
    Gpt,
}

/// A disk of the output image.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct Disk {
    /// Partition table type of the disk.
    #[serde(default)]
    pub partition_table_type: PartitionTableType,

    /// Size of the disk. Required when the last partition has no fixed size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<DiskSize>,

    /// Partitions of the disk, in on-disk order.
    #[serde(default)]
    pub partitions: Vec<Partition>,
}

/// Computed placement of a partition on its disk, in bytes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PartitionLayout {
    pub id: DeviceId,
    pub start: u64,
    pub end: u64,
}

impl PartitionLayout {
    pub fn size(&self) -> u64 {
        self.end - self.start
    }
}

impl Disk {
    pub fn validate(&self) -> Result<(), DiskError> {
        if let Some(max_size) = self.max_size {
            if max_size.bytes() == 0 {
                return Err(DiskError::ZeroMaxSize(0));
            }
        }

        for (index, partition) in self.partitions.iter().enumerate() {
            partition
                .validate()
                .map_err(|error| DiskError::InvalidPartition { index, error })?;
        }

        self.layout().map(|_| ())
    }

    /// Computes where each partition starts and ends.
    ///
    /// A partition without an explicit `start` begins where the previous one
    /// ends, and the first one begins at 1 MiB. Only the last partition may
    /// leave its end open, in which case it extends to `maxSize`.
    pub fn layout(&self) -> Result<Vec<PartitionLayout>, DiskError> {
        let mut placed: Vec<(&Partition, u64, Option<u64>)> =
            Vec::with_capacity(self.partitions.len());

        for (index, partition) in self.partitions.iter().enumerate() {
            let previous = placed.last().map(|(p, _, end)| (*p, *end));

            let previous_end = match previous {
                Some((previous, None)) => {
                    return Err(DiskError::UnboundedPartitionNotLast {
                        id: previous.id.clone(),
                    })
                }
                Some((previous, Some(end))) => Some((previous, end)),
                None => None,
            };

            let start = match (partition.start, previous_end) {
                (Some(start), _) => start.bytes(),
                (None, Some((_, end))) => end,
                (None, None) => FIRST_PARTITION_START,
            };

            if let Some((previous, end)) = previous_end {
                if start < end {
                    return Err(DiskError::Overlap {
                        id: partition.id.clone(),
                        previous: previous.id.clone(),
                    });
                }
            }

            if partition.is_bios_boot() && start != FIRST_PARTITION_START {
                return Err(DiskError::BiosBootStart);
            }

            let end = partition.end_from(start);
            if let Some(end) = end {
                if end <= start {
                    return Err(DiskError::InvalidPartition {
                        index,
                        error: PartitionError::NonPositiveSize {
                            id: partition.id.clone(),
                        },
                    });
                }

                self.check_max_size(partition, end)?;
            }

            placed.push((partition, start, end));
        }

        placed
            .into_iter()
            .map(|(partition, start, end)| {
                let end = match end {
                    Some(end) => end,
                    None => {
                        let max_size = self.max_size.ok_or_else(|| DiskError::MaxSizeRequired {
                            id: partition.id.clone(),
                        })?;
                        if max_size.bytes() <= start {
                            return Err(DiskError::ExceedsMaxSize {
                                id: partition.id.clone(),
                                max_size: max_size.to_string(),
                            });
                        }
                        max_size.bytes()
                    }
                };

                Ok(PartitionLayout {
                    id: partition.id.clone(),
                    start,
                    end,
                })
            })
            .collect()
    }

    fn check_max_size(&self, partition: &Partition, end: u64) -> Result<(), DiskError> {
        match self.max_size {
            Some(max_size) if end > max_size.bytes() => Err(DiskError::ExceedsMaxSize {
                id: partition.id.clone(),
                max_size: max_size.to_string(),
            }),
            _ => Ok(()),
        }
    }
}
