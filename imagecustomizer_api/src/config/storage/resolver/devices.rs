use std::collections::{BTreeMap, HashMap, HashSet};

use log::trace;

use crate::{
    config::storage::{
        error::{
            DeviceReferenceError, FileSystemReferenceError, StorageError, VerityReferenceError,
        },
        filesystem::FileSystem,
        mountpoint::MountIdentifierType,
        partitions::Partition,
        verity::Verity,
        Storage,
    },
    DeviceId,
};

use super::{DeviceOwner, DeviceRef};

/// All devices of a configuration, by id.
pub(super) struct DeviceMap<'a> {
    pub(super) devices: BTreeMap<DeviceId, DeviceRef>,

    /// Number of partitions using each label. Unlabeled partitions are
    /// counted under the empty label.
    pub(super) label_counts: HashMap<&'a str, usize>,
}

/// Ownership of the devices of a configuration.
pub(super) struct DeviceTree {
    pub(super) owners: BTreeMap<DeviceId, DeviceOwner>,
    pub(super) filesystem_partitions: Vec<DeviceId>,
}

/// Collects all partitions and verity devices and checks that their ids are
/// unique.
pub(super) fn build_device_map(storage: &Storage) -> Result<DeviceMap<'_>, StorageError> {
    let mut devices = BTreeMap::new();
    let mut label_counts: HashMap<&str, usize> = HashMap::new();

    for (disk_index, disk) in storage.disks.iter().enumerate() {
        for (partition_index, partition) in disk.partitions.iter().enumerate() {
            if devices.contains_key(&partition.id) {
                return Err(StorageError::DuplicatePartitionId {
                    disk: disk_index,
                    partition: partition_index,
                    id: partition.id.clone(),
                });
            }

            trace!("Adding partition '{}'", partition.id);
            devices.insert(
                partition.id.clone(),
                DeviceRef::Partition {
                    disk_index,
                    partition_index,
                },
            );

            *label_counts.entry(partition.label.as_str()).or_default() += 1;
        }
    }

    for (index, verity) in storage.verity.iter().enumerate() {
        if devices.contains_key(&verity.id) {
            return Err(StorageError::InvalidVerityReference {
                index,
                error: VerityReferenceError::DuplicateId(verity.id.clone()),
            });
        }

        trace!("Adding verity device '{}'", verity.id);
        devices.insert(verity.id.clone(), DeviceRef::Verity { index });
    }

    Ok(DeviceMap {
        devices,
        label_counts,
    })
}

/// Checks that every reference points at an existing device and that every
/// device has at most one user.
///
/// Verity devices claim their partitions before filesystems claim their
/// devices.
pub(super) fn check_device_tree(
    storage: &Storage,
    device_map: &DeviceMap,
) -> Result<DeviceTree, StorageError> {
    let mut owners = BTreeMap::new();

    for (index, verity) in storage.verity.iter().enumerate() {
        check_verity_item(verity, index, device_map, &mut owners)
            .map_err(|error| StorageError::InvalidVerityReference { index, error })?;
    }

    let mut mount_paths = HashSet::new();
    let mut filesystem_partitions = Vec::with_capacity(storage.file_systems.len());
    for (index, file_system) in storage.file_systems.iter().enumerate() {
        let partition_id = check_filesystem_item(
            storage,
            file_system,
            index,
            device_map,
            &mut owners,
            &mut mount_paths,
        )
        .map_err(|error| StorageError::InvalidFileSystemReference { index, error })?;
        filesystem_partitions.push(partition_id);
    }

    Ok(DeviceTree {
        owners,
        filesystem_partitions,
    })
}

/// Records `owner` as the user of the device `id`.
fn claim_device(
    id: &str,
    owner: DeviceOwner,
    device_map: &DeviceMap,
    owners: &mut BTreeMap<DeviceId, DeviceOwner>,
) -> Result<DeviceRef, DeviceReferenceError> {
    let device = device_map
        .devices
        .get(id)
        .copied()
        .ok_or_else(|| DeviceReferenceError::NotFound(id.to_owned()))?;

    if owners.contains_key(id) {
        return Err(DeviceReferenceError::MultipleOwners(id.to_owned()));
    }

    owners.insert(id.to_owned(), owner);
    Ok(device)
}

/// Claims a partition for a verity device.
fn claim_partition(
    id: &str,
    owner: DeviceOwner,
    device_map: &DeviceMap,
    owners: &mut BTreeMap<DeviceId, DeviceOwner>,
) -> Result<(), DeviceReferenceError> {
    if claim_device(id, owner, device_map, owners)?.is_partition() {
        Ok(())
    } else {
        Err(DeviceReferenceError::NotAPartition(id.to_owned()))
    }
}

fn check_verity_item(
    verity: &Verity,
    index: usize,
    device_map: &DeviceMap,
    owners: &mut BTreeMap<DeviceId, DeviceOwner>,
) -> Result<(), VerityReferenceError> {
    let owner = DeviceOwner::Verity { index };

    if !verity.data_device_id.is_empty() {
        claim_partition(&verity.data_device_id, owner, device_map, owners)
            .map_err(VerityReferenceError::InvalidDataDeviceId)?;
    }

    if !verity.hash_device_id.is_empty() {
        claim_partition(&verity.hash_device_id, owner, device_map, owners)
            .map_err(VerityReferenceError::InvalidHashDeviceId)?;
    }

    Ok(())
}

/// Checks a filesystem and returns the id of the partition backing it.
fn check_filesystem_item<'a>(
    storage: &'a Storage,
    file_system: &'a FileSystem,
    index: usize,
    device_map: &DeviceMap,
    owners: &mut BTreeMap<DeviceId, DeviceOwner>,
    mount_paths: &mut HashSet<&'a str>,
) -> Result<DeviceId, FileSystemReferenceError> {
    let device = claim_device(
        &file_system.device_id,
        DeviceOwner::FileSystem { index },
        device_map,
        owners,
    )
    .map_err(FileSystemReferenceError::InvalidDeviceId)?;

    if let Some(mount_point) = &file_system.mount_point {
        if !mount_paths.insert(mount_point.path.as_str()) {
            return Err(FileSystemReferenceError::DuplicateMountPath(
                mount_point.path.clone(),
            ));
        }
    }

    for (subvolume, mount_point) in file_system.mounted_subvolumes() {
        if !mount_paths.insert(mount_point.path.as_str()) {
            return Err(FileSystemReferenceError::DuplicateSubvolumeMountPath {
                path: mount_point.path.clone(),
                subvolume: subvolume.path.clone(),
            });
        }
    }

    match device {
        DeviceRef::Partition {
            disk_index,
            partition_index,
        } => {
            let partition = &storage.disks[disk_index].partitions[partition_index];
            check_partition_labels(file_system, partition, &device_map.label_counts)?;
            Ok(partition.id.clone())
        }
        DeviceRef::Verity { index } => {
            check_verity_mount_id_types(file_system)?;
            Ok(storage.verity[index].data_device_id.clone())
        }
    }
}

/// Checks that `part-label` mounts of a filesystem point at a partition with
/// a unique label.
fn check_partition_labels(
    file_system: &FileSystem,
    partition: &Partition,
    label_counts: &HashMap<&str, usize>,
) -> Result<(), FileSystemReferenceError> {
    let mut check_label_count = false;

    if file_system
        .mount_point
        .as_ref()
        .is_some_and(|mp| mp.id_type == MountIdentifierType::PartLabel)
    {
        check_label_count = true;
        if partition.label.is_empty() {
            return Err(FileSystemReferenceError::MissingPartitionLabel(
                partition.id.clone(),
            ));
        }
    }

    for (subvolume, mount_point) in file_system.mounted_subvolumes() {
        if mount_point.id_type == MountIdentifierType::PartLabel {
            check_label_count = true;
            if partition.label.is_empty() {
                return Err(FileSystemReferenceError::SubvolumeMissingPartitionLabel {
                    subvolume: subvolume.path.clone(),
                    partition: partition.id.clone(),
                });
            }
        }
    }

    if check_label_count
        && label_counts
            .get(partition.label.as_str())
            .is_some_and(|count| *count > 1)
    {
        return Err(FileSystemReferenceError::DuplicatePartitionLabel(
            partition.label.clone(),
        ));
    }

    Ok(())
}

/// Filesystems on verity devices are always mounted through the device
/// mapper path.
fn check_verity_mount_id_types(file_system: &FileSystem) -> Result<(), FileSystemReferenceError> {
    if file_system
        .mount_point
        .as_ref()
        .is_some_and(|mp| mp.id_type != MountIdentifierType::Default)
    {
        return Err(FileSystemReferenceError::VerityMountIdType(
            file_system.device_id.clone(),
        ));
    }

    for (subvolume, mount_point) in file_system.mounted_subvolumes() {
        if mount_point.id_type != MountIdentifierType::Default {
            return Err(FileSystemReferenceError::VeritySubvolumeMountIdType {
                subvolume: subvolume.path.clone(),
                verity: file_system.device_id.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn storage(yaml: &str) -> Storage {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_build_device_map() {
        let storage = self::storage(indoc! {r#"
            disks:
              - partitions:
                  - id: a
                    label: data
                  - id: b
                    label: data
                  - id: c
            verity:
              - id: v
                name: root
                dataDeviceId: a
                hashDeviceId: b
        "#});

        let device_map = build_device_map(&storage).unwrap();
        assert_eq!(device_map.devices.len(), 4);
        assert_eq!(
            device_map.devices["b"],
            DeviceRef::Partition {
                disk_index: 0,
                partition_index: 1
            }
        );
        assert_eq!(device_map.devices["v"], DeviceRef::Verity { index: 0 });
        assert_eq!(device_map.label_counts["data"], 2);
        assert_eq!(device_map.label_counts[""], 1);
    }

    #[test]
    fn test_build_device_map_duplicates() {
        let storage = self::storage(indoc! {r#"
            disks:
              - partitions:
                  - id: a
                  - id: a
        "#});
        assert_eq!(
            build_device_map(&storage).err().unwrap(),
            StorageError::DuplicatePartitionId {
                disk: 0,
                partition: 1,
                id: "a".into()
            }
        );

        let storage = self::storage(indoc! {r#"
            disks:
              - partitions:
                  - id: a
            verity:
              - id: a
                name: root
        "#});
        assert_eq!(
            build_device_map(&storage).err().unwrap(),
            StorageError::InvalidVerityReference {
                index: 0,
                error: VerityReferenceError::DuplicateId("a".into())
            }
        );
    }

    #[test]
    fn test_check_device_tree() {
        let storage = self::storage(indoc! {r#"
            disks:
              - partitions:
                  - id: data
                  - id: hash
                  - id: var
            verity:
              - id: root
                name: root
                dataDeviceId: data
                hashDeviceId: hash
            filesystems:
              - deviceId: root
                type: ext4
                mountPoint: /
              - deviceId: var
                type: ext4
                mountPoint: /var
        "#});

        let device_map = build_device_map(&storage).unwrap();
        let tree = check_device_tree(&storage, &device_map).unwrap();
        assert_eq!(tree.owners["data"], DeviceOwner::Verity { index: 0 });
        assert_eq!(tree.owners["hash"], DeviceOwner::Verity { index: 0 });
        assert_eq!(tree.owners["root"], DeviceOwner::FileSystem { index: 0 });
        assert_eq!(tree.owners["var"], DeviceOwner::FileSystem { index: 1 });
        assert_eq!(tree.filesystem_partitions, vec!["data", "var"]);
    }

    #[test]
    fn test_verity_on_verity() {
        let storage = self::storage(indoc! {r#"
            disks:
              - partitions:
                  - id: data
                  - id: hash
                  - id: hash2
            verity:
              - id: inner
                name: root
                dataDeviceId: data
                hashDeviceId: hash
              - id: outer
                name: usr
                dataDeviceId: inner
                hashDeviceId: hash2
        "#});

        let device_map = build_device_map(&storage).unwrap();
        assert_eq!(
            check_device_tree(&storage, &device_map).err().unwrap(),
            StorageError::InvalidVerityReference {
                index: 1,
                error: VerityReferenceError::InvalidDataDeviceId(
                    DeviceReferenceError::NotAPartition("inner".into())
                )
            }
        );
    }
}
