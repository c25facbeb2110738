use std::collections::BTreeMap;

use log::trace;

use crate::{
    config::storage::{
        error::StorageError,
        filesystem::FileSystem,
        verity::{expected_verity_name, VerityMount},
        Storage,
    },
    DeviceId,
};

use super::DeviceOwner;

/// Finds the mount of the filesystem on top of every verity device and checks
/// it.
///
/// All mounts are collected before any of them is checked, so a verity device
/// with several mounts is reported before a missing mount on an earlier one.
pub(super) fn resolve_verity_mounts(
    storage: &Storage,
    owners: &BTreeMap<DeviceId, DeviceOwner>,
) -> Result<BTreeMap<DeviceId, VerityMount>, StorageError> {
    let mut verity_mounts = BTreeMap::new();

    for verity in &storage.verity {
        let file_system = match owners.get(&verity.id) {
            Some(DeviceOwner::FileSystem { index }) => storage.file_systems.get(*index),
            _ => None,
        };

        let mut mounts = file_system.map(filesystem_mounts).unwrap_or_default();
        if mounts.len() > 1 {
            return Err(StorageError::VerityMultipleMountPoints(verity.id.clone()));
        }

        if let Some(mount) = mounts.pop() {
            trace!(
                "Verity device '{}' is mounted at '{}'",
                verity.id,
                mount.mount_path
            );
            verity_mounts.insert(verity.id.clone(), mount);
        }
    }

    for verity in &storage.verity {
        let Some((mount, expected_name)) = verity_mounts
            .get(&verity.id)
            .and_then(|mount| Some((mount, expected_verity_name(&mount.mount_path)?)))
        else {
            return Err(StorageError::VerityInvalidMountPath(verity.id.clone()));
        };

        if verity.name != expected_name {
            return Err(StorageError::VerityNameMismatch {
                id: verity.id.clone(),
                expected: expected_name.to_owned(),
                path: mount.mount_path.clone(),
            });
        }

        if !mount.is_read_only() {
            return Err(StorageError::VerityNotReadOnly(verity.id.clone()));
        }
    }

    Ok(verity_mounts)
}

/// Returns every mount of a filesystem: the filesystem-level mount point
/// followed by the subvolume mount points.
fn filesystem_mounts(file_system: &FileSystem) -> Vec<VerityMount> {
    file_system
        .mount_point
        .iter()
        .map(|mount_point| VerityMount {
            mount_path: mount_point.path.clone(),
            mount_options: mount_point.options.clone(),
            subvolume_path: String::new(),
        })
        .chain(
            file_system
                .mounted_subvolumes()
                .map(|(subvolume, mount_point)| VerityMount {
                    mount_path: mount_point.path.clone(),
                    mount_options: mount_point.options.clone(),
                    subvolume_path: subvolume.path.clone(),
                }),
        )
        .collect()
}
