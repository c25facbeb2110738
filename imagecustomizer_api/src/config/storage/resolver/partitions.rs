use std::collections::BTreeMap;

use crate::{
    config::storage::{
        error::StorageError, filesystem::FileSystem, partition_type::PartitionType,
        partitions::Partition, BootType, Storage,
    },
    constants::ESP_MOUNT_POINT_PATH,
    DeviceId,
};

use super::{diagnostics::Diagnostic, DeviceOwner};

/// Checks the filesystems on the special partitions and collects the
/// diagnostics for the other typed partitions.
pub(super) fn check_partitions(
    storage: &Storage,
    owners: &BTreeMap<DeviceId, DeviceOwner>,
) -> Result<Vec<Diagnostic>, StorageError> {
    let mut diagnostics = Vec::new();

    for partition in storage.disks.iter().flat_map(|disk| &disk.partitions) {
        let file_system = match owners.get(&partition.id) {
            Some(DeviceOwner::FileSystem { index }) => storage.file_systems.get(*index),
            _ => None,
        };

        match partition.partition_type {
            PartitionType::Esp => check_esp(partition, file_system)?,
            PartitionType::BiosGrub => check_bios_boot(partition, file_system)?,
            _ => {
                if let Some(file_system) = file_system {
                    check_expected_mount_paths(partition, file_system, &mut diagnostics);
                }
            }
        }
    }

    Ok(diagnostics)
}

/// Checks that the partitions the boot type needs exist.
pub(super) fn check_boot_type(storage: &Storage) -> Result<(), StorageError> {
    let mut partitions = storage.disks.iter().flat_map(|disk| &disk.partitions);

    match storage.boot_type {
        BootType::Efi if !partitions.any(Partition::is_esp) => {
            Err(StorageError::MissingEspPartition)
        }
        BootType::Legacy if !partitions.any(Partition::is_bios_boot) => {
            Err(StorageError::MissingBiosBootPartition)
        }
        _ => Ok(()),
    }
}

fn check_esp(partition: &Partition, file_system: Option<&FileSystem>) -> Result<(), StorageError> {
    if !file_system.is_some_and(|fs| fs.fs_type.is_fat()) {
        return Err(StorageError::EspInvalidFileSystemType(partition.id.clone()));
    }

    if file_system.and_then(FileSystem::mount_point_path) != Some(ESP_MOUNT_POINT_PATH) {
        return Err(StorageError::EspInvalidMountPath(partition.id.clone()));
    }

    Ok(())
}

fn check_bios_boot(
    partition: &Partition,
    file_system: Option<&FileSystem>,
) -> Result<(), StorageError> {
    let Some(file_system) = file_system else {
        return Ok(());
    };

    if !file_system.fs_type.is_none() {
        return Err(StorageError::BiosBootWithFileSystemType(
            partition.id.clone(),
        ));
    }

    if file_system.mount_point.is_some() {
        return Err(StorageError::BiosBootWithMountPoint(partition.id.clone()));
    }

    Ok(())
}

/// Records where a filesystem on a typed partition is used differently from
/// what the partition type implies.
fn check_expected_mount_paths(
    partition: &Partition,
    file_system: &FileSystem,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(expected_paths) = partition.partition_type.supported_mount_paths() else {
        return;
    };

    if file_system.mounted_subvolumes().next().is_some() {
        diagnostics.push(Diagnostic::SubvolumeMountsUnsupported {
            partition_id: partition.id.clone(),
            partition_type: partition.partition_type.to_string(),
        });
    }

    if let Some(path) = file_system.mount_point_path() {
        if !expected_paths.contains(&path) {
            diagnostics.push(Diagnostic::UnexpectedMountPath {
                path: path.to_owned(),
                partition_id: partition.id.clone(),
                partition_type: partition.partition_type.to_string(),
                expected_paths: expected_paths.iter().map(|p| p.to_string()).collect(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn storage(yaml: &str) -> Storage {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn owners(storage: &Storage) -> BTreeMap<DeviceId, DeviceOwner> {
        storage
            .file_systems
            .iter()
            .enumerate()
            .map(|(index, fs)| (fs.device_id.clone(), DeviceOwner::FileSystem { index }))
            .collect()
    }

    #[test]
    fn test_check_esp() {
        let storage = self::storage(indoc! {r#"
            disks:
              - partitions:
                  - id: esp
                    type: esp
            filesystems:
              - deviceId: esp
                type: ext4
                mountPoint: /boot/efi
        "#});
        assert_eq!(
            check_partitions(&storage, &owners(&storage)).unwrap_err(),
            StorageError::EspInvalidFileSystemType("esp".into())
        );
        assert_eq!(
            check_partitions(&storage, &BTreeMap::new()).unwrap_err(),
            StorageError::EspInvalidFileSystemType("esp".into())
        );

        let storage = self::storage(indoc! {r#"
            disks:
              - partitions:
                  - id: esp
                    type: esp
            filesystems:
              - deviceId: esp
                type: vfat
                mountPoint: /boot/efi/
        "#});
        assert_eq!(
            check_partitions(&storage, &owners(&storage)).unwrap_err(),
            StorageError::EspInvalidMountPath("esp".into())
        );
    }

    #[test]
    fn test_check_bios_boot() {
        let storage = self::storage(indoc! {r#"
            disks:
              - partitions:
                  - id: bios
                    type: bios-grub
        "#});
        check_partitions(&storage, &BTreeMap::new()).unwrap();

        let storage = self::storage(indoc! {r#"
            disks:
              - partitions:
                  - id: bios
                    type: bios-grub
            filesystems:
              - deviceId: bios
                type: fat32
        "#});
        assert_eq!(
            check_partitions(&storage, &owners(&storage)).unwrap_err(),
            StorageError::BiosBootWithFileSystemType("bios".into())
        );
    }

    #[test]
    fn test_diagnostics() {
        let storage = self::storage(indoc! {r#"
            disks:
              - partitions:
                  - id: home
                    type: home
                  - id: data
                    type: linux-generic
                  - id: swap
                    type: swap
            filesystems:
              - deviceId: home
                type: ext4
                mountPoint: /data
              - deviceId: data
                type: ext4
                mountPoint: /anywhere
              - deviceId: swap
                type: ext4
                mountPoint: /swap
        "#});

        let diagnostics = check_partitions(&storage, &owners(&storage)).unwrap();
        assert_eq!(
            diagnostics,
            vec![
                Diagnostic::UnexpectedMountPath {
                    path: "/data".into(),
                    partition_id: "home".into(),
                    partition_type: "home".into(),
                    expected_paths: vec!["/home".into()],
                },
                Diagnostic::UnexpectedMountPath {
                    path: "/swap".into(),
                    partition_id: "swap".into(),
                    partition_type: "swap".into(),
                    expected_paths: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_check_boot_type() {
        let storage = self::storage(indoc! {r#"
            bootType: legacy
            disks:
              - partitions:
                  - id: esp
                    type: esp
        "#});
        assert_eq!(
            check_boot_type(&storage).unwrap_err(),
            StorageError::MissingBiosBootPartition
        );

        let storage = self::storage(indoc! {r#"
            bootType: efi
            disks:
              - partitions:
                  - id: bios
                    type: bios-grub
        "#});
        assert_eq!(
            check_boot_type(&storage).unwrap_err(),
            StorageError::MissingEspPartition
        );
    }
}
