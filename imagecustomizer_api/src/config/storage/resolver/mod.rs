//! # Storage resolver
//!
//! This module validates a storage configuration as a whole and resolves how
//! every device in it is used.
//!
//! The per-item checks (`Disk::validate`, `Verity::validate`,
//! `FileSystem::validate`) only look at a single item. The resolver adds the
//! checks that need the full picture:
//! - Checking which top-level sections may be combined.
//! - Checking for duplicate device IDs across partitions and verity devices.
//! - Checking that all references are valid and that every device is used by
//!   at most one other device or filesystem.
//! - Checking that mount paths are unique and that `part-label` mounts point
//!   at partitions with a unique label.
//! - Checking the special partition types (ESP, BIOS boot) and the boot type.
//! - Checking the mounts of the filesystems on top of verity devices.
//!
//! The end result is a `ResolvedStorage`, which records the owner of every
//! device, the partition backing every filesystem, the mount of every verity
//! device, the placement of every partition and the order in which the
//! devices must be created. It is a separate value; the configuration itself
//! is never modified.
//!
//! ## Layout
//!
//! ```text
//! partition ──┬──> verity ──> filesystem
//!             └──> filesystem
//! ```
//!
//! Edges point from a device to the device or filesystem that uses it.

use std::collections::BTreeMap;

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use strum_macros::EnumIs;

use crate::{
    config::storage::{
        disks::PartitionLayout, error::StorageError, verity::VerityMount, Storage,
    },
    DeviceId,
};

mod devices;
mod diagnostics;
mod graph;
mod items;
mod partitions;
mod verity;

#[cfg(test)]
mod validation_tests;

pub use diagnostics::Diagnostic;
pub use graph::StorageNode;

/// How the verity devices of a configuration reference their partitions.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, EnumIs)]
#[serde(rename_all = "kebab-case")]
pub enum VerityPartitionsType {
    /// There are no verity devices.
    #[default]
    None,

    /// The verity devices use partitions created from `disks`.
    UsesConfig,

    /// The verity devices use existing partitions of the base image.
    UsesExisting,
}

/// A device that can be referenced by its id.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, EnumIs)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum DeviceRef {
    /// A partition, by the index of its disk and its index on that disk.
    Partition {
        disk_index: usize,
        partition_index: usize,
    },

    /// A verity device, by its index in `verity`.
    Verity { index: usize },
}

/// The single user of a device.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, EnumIs)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DeviceOwner {
    /// A filesystem, by its index in `filesystems`.
    FileSystem { index: usize },

    /// A verity device, by its index in `verity`.
    Verity { index: usize },
}

/// The validated view of a storage configuration.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStorage {
    pub verity_partitions_type: VerityPartitionsType,

    /// Every partition and verity device, by id.
    pub devices: BTreeMap<DeviceId, DeviceRef>,

    /// The user of every device that is used.
    pub owners: BTreeMap<DeviceId, DeviceOwner>,

    /// Id of the partition backing each filesystem, in `filesystems` order.
    /// For a filesystem on a verity device, this is the verity data
    /// partition.
    pub filesystem_partitions: Vec<DeviceId>,

    /// Mount of the filesystem on top of each verity device, by verity id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub verity_mounts: BTreeMap<DeviceId, VerityMount>,

    /// Placement of the partitions, per disk.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disk_layouts: Vec<Vec<PartitionLayout>>,

    /// Order in which the devices and filesystems must be created.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub creation_order: Vec<StorageNode>,

    /// Non-fatal findings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolvedStorage {
    /// Returns the device with the given id.
    pub fn device(&self, id: &str) -> Option<DeviceRef> {
        self.devices.get(id).copied()
    }

    /// Returns the user of the device with the given id, if it is used.
    pub fn owner(&self, id: &str) -> Option<DeviceOwner> {
        self.owners.get(id).copied()
    }

    /// Returns the id of the partition backing the filesystem at `index`.
    pub fn filesystem_partition(&self, index: usize) -> Option<&str> {
        self.filesystem_partitions.get(index).map(String::as_str)
    }

    /// Returns the mount of the filesystem on top of the verity device with
    /// the given id.
    pub fn verity_mount(&self, id: &str) -> Option<&VerityMount> {
        self.verity_mounts.get(id)
    }
}

pub(crate) struct StorageResolver<'a> {
    storage: &'a Storage,
}

impl<'a> StorageResolver<'a> {
    pub(crate) fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Validates the storage configuration and resolves it.
    ///
    /// Checks run in a fixed order and the first failure is returned.
    pub(crate) fn resolve(self) -> Result<ResolvedStorage, StorageError> {
        debug!("Resolving storage configuration");
        let storage = self.storage;

        // Check each item on its own.
        trace!("Checking storage items");
        let verity_partitions_type = items::check_items(storage)?;

        // Check which sections may be combined.
        trace!("Checking storage sections");
        items::check_sections(storage, verity_partitions_type)?;

        // Collect all devices and check that their ids are unique.
        trace!("Building device map");
        let device_map = devices::build_device_map(storage)?;

        // Check that all references are valid and that no device has two
        // users.
        trace!("Checking device tree");
        let tree = devices::check_device_tree(storage, &device_map)?;

        trace!("Checking partition types");
        let diagnostics = partitions::check_partitions(storage, &tree.owners)?;
        for diagnostic in &diagnostics {
            info!("{diagnostic}");
        }

        trace!("Checking boot type");
        partitions::check_boot_type(storage)?;

        let verity_mounts = if verity_partitions_type.is_uses_config() {
            trace!("Checking verity mounts");
            verity::resolve_verity_mounts(storage, &tree.owners)?
        } else {
            BTreeMap::new()
        };

        trace!("Computing disk layouts");
        let disk_layouts = storage
            .disks
            .iter()
            .enumerate()
            .map(|(index, disk)| {
                disk.layout()
                    .map_err(|error| StorageError::InvalidDisk { index, error })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let graph = graph::OwnershipGraph::build(storage, &tree.owners);
        trace!("Built storage graph structure:\n{}", graph.describe());

        trace!("Computing creation order");
        let creation_order = graph.creation_order()?;

        debug!(
            "Storage configuration resolved with {} devices, {} filesystems and {} diagnostics",
            device_map.devices.len(),
            storage.file_systems.len(),
            diagnostics.len()
        );

        Ok(ResolvedStorage {
            verity_partitions_type,
            devices: device_map.devices,
            owners: tree.owners,
            filesystem_partitions: tree.filesystem_partitions,
            verity_mounts,
            disk_layouts,
            creation_order,
            diagnostics,
        })
    }
}
