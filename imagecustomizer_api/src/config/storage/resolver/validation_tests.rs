//! Scenario tests for resolving complete storage configurations.

use indoc::indoc;

use crate::{
    config::storage::{
        error::{
            BtrfsConfigError, DeviceReferenceError, FileSystemError, FileSystemReferenceError,
            StorageError,
        },
        Storage,
    },
    primitives::bytes::{GIB, MIB},
};

use super::{
    diagnostics::Diagnostic, DeviceOwner, DeviceRef, ResolvedStorage, StorageNode,
    VerityPartitionsType,
};

fn resolve(yaml: &str) -> Result<ResolvedStorage, StorageError> {
    let storage: Storage = serde_yaml::from_str(yaml).unwrap();
    storage.resolve()
}

const EFI_DISK: &str = indoc! {r#"
    bootType: efi
    disks:
      - partitionTableType: gpt
        maxSize: 4G
        partitions:
          - id: esp
            type: esp
            size: 8M
          - id: root
            size: grow
"#};

/// Appends `filesystems` to the single disk EFI layout.
fn efi_storage(filesystems: &str) -> String {
    format!("{EFI_DISK}filesystems:\n{filesystems}")
}

const ESP_FILESYSTEM: &str = indoc! {r#"
      - deviceId: esp
        type: fat32
        mountPoint:
          path: /boot/efi
          options: umask=0077
"#};

#[test]
fn test_efi_storage() {
    let resolved = resolve(&efi_storage(&format!(
        "{ESP_FILESYSTEM}{}",
        indoc! {r#"
              - deviceId: root
                type: ext4
                mountPoint: /
        "#}
    )))
    .unwrap();

    assert_eq!(resolved.verity_partitions_type, VerityPartitionsType::None);
    assert_eq!(
        resolved.device("root"),
        Some(DeviceRef::Partition {
            disk_index: 0,
            partition_index: 1
        })
    );
    assert_eq!(
        resolved.owner("esp"),
        Some(DeviceOwner::FileSystem { index: 0 })
    );
    assert_eq!(resolved.filesystem_partition(1), Some("root"));
    assert_eq!(resolved.disk_layouts[0][0].start, MIB);
    assert_eq!(resolved.disk_layouts[0][0].end, 9 * MIB);
    assert_eq!(resolved.disk_layouts[0][1].end, 4 * GIB);
    assert_eq!(resolved.creation_order.len(), 4);
    assert_eq!(
        resolved.creation_order[0],
        StorageNode::Partition { id: "esp".into() }
    );
    assert!(resolved.diagnostics.is_empty());
    assert!(resolved.verity_mounts.is_empty());
}

#[test]
fn test_verity_storage() {
    let resolved = resolve(indoc! {r#"
        bootType: efi
        disks:
          - partitionTableType: gpt
            maxSize: 4G
            partitions:
              - id: esp
                type: esp
                size: 8M
              - id: boot
                size: 1G
              - id: root
                type: root
                size: 2G
              - id: roothash
                type: root-verity
                size: 100M
              - id: var
                type: var
                size: grow
        verity:
          - id: verityroot
            name: root
            dataDeviceId: root
            hashDeviceId: roothash
            corruptionOption: panic
        filesystems:
          - deviceId: esp
            type: fat32
            mountPoint: /boot/efi
          - deviceId: boot
            type: ext4
            mountPoint: /boot
          - deviceId: verityroot
            type: ext4
            mountPoint:
              path: /
              options: defaults,ro
          - deviceId: var
            type: ext4
            mountPoint: /var
    "#})
    .unwrap();

    assert_eq!(
        resolved.verity_partitions_type,
        VerityPartitionsType::UsesConfig
    );
    assert_eq!(
        resolved.owner("root"),
        Some(DeviceOwner::Verity { index: 0 })
    );
    assert_eq!(
        resolved.owner("roothash"),
        Some(DeviceOwner::Verity { index: 0 })
    );
    assert_eq!(
        resolved.owner("verityroot"),
        Some(DeviceOwner::FileSystem { index: 2 })
    );
    assert_eq!(
        resolved.filesystem_partitions,
        vec!["esp", "boot", "root", "var"]
    );

    let mount = resolved.verity_mount("verityroot").unwrap();
    assert_eq!(mount.mount_path, "/");
    assert_eq!(mount.mount_options, "defaults,ro");

    let verity_position = resolved
        .creation_order
        .iter()
        .position(|node| node == &StorageNode::Verity { id: "verityroot".into() })
        .unwrap();
    assert_eq!(verity_position, 5);
    assert_eq!(resolved.creation_order.len(), 10);
}

#[test]
fn test_dangling_reference() {
    let err = resolve(&efi_storage(&format!(
        "{ESP_FILESYSTEM}{}",
        indoc! {r#"
              - deviceId: missing
                type: ext4
                mountPoint: /
        "#}
    )))
    .unwrap_err();

    assert_eq!(
        err,
        StorageError::InvalidFileSystemReference {
            index: 1,
            error: FileSystemReferenceError::InvalidDeviceId(DeviceReferenceError::NotFound(
                "missing".into()
            )),
        }
    );
    assert_eq!(
        err.to_string(),
        "invalid filesystem item at index 1:\ninvalid 'deviceId':\ndevice (missing) not found"
    );
}

#[test]
fn test_multiple_owners() {
    let err = resolve(&efi_storage(&format!(
        "{ESP_FILESYSTEM}{}",
        indoc! {r#"
              - deviceId: root
                type: ext4
                mountPoint: /
              - deviceId: root
                type: ext4
                mountPoint: /var
        "#}
    )))
    .unwrap_err();

    assert_eq!(
        err,
        StorageError::InvalidFileSystemReference {
            index: 2,
            error: FileSystemReferenceError::InvalidDeviceId(
                DeviceReferenceError::MultipleOwners("root".into())
            ),
        }
    );
}

#[test]
fn test_partition_used_by_verity_and_filesystem() {
    let err = resolve(indoc! {r#"
        bootType: efi
        disks:
          - maxSize: 4G
            partitions:
              - id: esp
                type: esp
                size: 8M
              - id: root
                size: 1G
              - id: roothash
                size: grow
        verity:
          - id: verityroot
            name: root
            dataDeviceId: root
            hashDeviceId: roothash
        filesystems:
          - deviceId: esp
            type: fat32
            mountPoint: /boot/efi
          - deviceId: root
            type: ext4
            mountPoint:
              path: /
              options: ro
    "#})
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "invalid filesystem item at index 1:\ninvalid 'deviceId':\ndevice (root) is used by multiple things"
    );
}

#[test]
fn test_duplicate_mount_path() {
    let err = resolve(indoc! {r#"
        bootType: efi
        disks:
          - maxSize: 4G
            partitions:
              - id: esp
                type: esp
                size: 8M
              - id: root
                size: 1G
              - id: data
                size: grow
        filesystems:
          - deviceId: esp
            type: fat32
            mountPoint: /boot/efi
          - deviceId: root
            type: ext4
            mountPoint: /
          - deviceId: data
            type: btrfs
            btrfs:
              subvolumes:
                - path: home
                  mountPoint: /home
                - path: root
                  mountPoint: /
    "#})
    .unwrap_err();

    assert_eq!(
        err,
        StorageError::InvalidFileSystemReference {
            index: 2,
            error: FileSystemReferenceError::DuplicateSubvolumeMountPath {
                path: "/".into(),
                subvolume: "root".into(),
            },
        }
    );
}

#[test]
fn test_partition_labels() {
    let storage = indoc! {r#"
        bootType: efi
        disks:
          - maxSize: 4G
            partitions:
              - id: esp
                type: esp
                label: esp
                size: 8M
              - id: root
                label: data
                size: 1G
              - id: data
                label: data
                size: grow
        filesystems:
          - deviceId: esp
            type: fat32
            mountPoint: /boot/efi
          - deviceId: root
            type: ext4
            mountPoint:
              idType: part-label
              path: /
    "#};
    assert_eq!(
        resolve(storage).unwrap_err(),
        StorageError::InvalidFileSystemReference {
            index: 1,
            error: FileSystemReferenceError::DuplicatePartitionLabel("data".into()),
        }
    );

    // Duplicate labels are fine when no mount refers to them.
    let storage = storage.replace("idType: part-label", "idType: part-uuid");
    resolve(&storage).unwrap();

    // Unlabeled partitions cannot be mounted by label.
    let err = resolve(&efi_storage(&format!(
        "{ESP_FILESYSTEM}{}",
        indoc! {r#"
              - deviceId: root
                type: ext4
                mountPoint:
                  idType: part-label
                  path: /
        "#}
    )))
    .unwrap_err();
    assert_eq!(
        err,
        StorageError::InvalidFileSystemReference {
            index: 1,
            error: FileSystemReferenceError::MissingPartitionLabel("root".into()),
        }
    );
}

#[test]
fn test_esp_rules() {
    let err = resolve(&efi_storage(indoc! {r#"
          - deviceId: esp
            type: ext4
            mountPoint: /boot/efi
    "#}))
    .unwrap_err();
    assert_eq!(err, StorageError::EspInvalidFileSystemType("esp".into()));

    let err = resolve(&efi_storage(indoc! {r#"
          - deviceId: esp
            type: vfat
            mountPoint: /boot
    "#}))
    .unwrap_err();
    assert_eq!(err, StorageError::EspInvalidMountPath("esp".into()));

    // The ESP must have a filesystem.
    let err = resolve(EFI_DISK).unwrap_err();
    assert_eq!(err, StorageError::EspInvalidFileSystemType("esp".into()));
}

#[test]
fn test_boot_type_partitions() {
    let err = resolve(indoc! {r#"
        bootType: efi
        disks:
          - maxSize: 4G
            partitions:
              - id: root
                size: grow
        filesystems:
          - deviceId: root
            type: ext4
            mountPoint: /
    "#})
    .unwrap_err();
    assert_eq!(err, StorageError::MissingEspPartition);

    let resolved = resolve(indoc! {r#"
        bootType: legacy
        disks:
          - maxSize: 4G
            partitions:
              - id: bios
                type: bios-grub
                size: 8M
              - id: root
                size: grow
        filesystems:
          - deviceId: root
            type: ext4
            mountPoint: /
    "#})
    .unwrap();
    assert_eq!(resolved.owner("bios"), None);

    let err = resolve(indoc! {r#"
        bootType: legacy
        disks:
          - maxSize: 4G
            partitions:
              - id: bios
                type: bios-grub
                size: 8M
              - id: root
                size: grow
        filesystems:
          - deviceId: bios
            mountPoint: /boot
    "#})
    .unwrap_err();
    assert_eq!(
        err,
        StorageError::InvalidFileSystem {
            index: 0,
            error: FileSystemError::MountPointWithoutType,
        }
    );
}

#[test]
fn test_section_rules() {
    assert_eq!(
        resolve("bootType: efi").unwrap_err(),
        StorageError::BootTypeWithoutDisks
    );

    let err = resolve(indoc! {r#"
        verity:
          - id: verityroot
            name: root
            dataDeviceId: root
            hashDeviceId: roothash
    "#})
    .unwrap_err();
    assert_eq!(err, StorageError::VerityDeviceIdsWithoutDisks);

    // Verity on partitions of the base image does not need disks.
    let resolved = resolve(indoc! {r#"
        resetPartitionsUuidsType: reset-all
        verity:
          - id: verityroot
            name: root
            dataDevice:
              idType: part-label
              id: rootfs
            hashDevice:
              idType: part-label
              id: roothash
    "#})
    .unwrap();
    assert_eq!(
        resolved.verity_partitions_type,
        VerityPartitionsType::UsesExisting
    );
    assert!(resolved.verity_mounts.is_empty());

    let err = resolve(&format!(
        "{EFI_DISK}{}",
        indoc! {r#"
            verity:
              - id: verityroot
                name: root
                dataDevice:
                  idType: part-label
                  id: rootfs
                hashDevice:
                  idType: part-label
                  id: roothash
        "#}
    ))
    .unwrap_err();
    assert_eq!(err, StorageError::VerityDevicesWithDisks);

    let err = resolve(indoc! {r#"
        bootType: efi
        disks:
          - partitions: []
          - partitions: []
    "#})
    .unwrap_err();
    assert_eq!(err, StorageError::MultipleDisks);
}

#[test]
fn test_verity_mount_id_type() {
    let err = resolve(indoc! {r#"
        bootType: efi
        disks:
          - maxSize: 4G
            partitions:
              - id: esp
                type: esp
                size: 8M
              - id: root
                size: 1G
              - id: roothash
                size: grow
        verity:
          - id: verityroot
            name: root
            dataDeviceId: root
            hashDeviceId: roothash
        filesystems:
          - deviceId: esp
            type: fat32
            mountPoint: /boot/efi
          - deviceId: verityroot
            type: ext4
            mountPoint:
              idType: part-uuid
              path: /
              options: ro
    "#})
    .unwrap_err();

    assert_eq!(
        err,
        StorageError::InvalidFileSystemReference {
            index: 1,
            error: FileSystemReferenceError::VerityMountIdType("verityroot".into()),
        }
    );
}

#[test]
fn test_verity_mount_rules() {
    let storage = indoc! {r#"
        bootType: efi
        disks:
          - maxSize: 4G
            partitions:
              - id: esp
                type: esp
                size: 8M
              - id: usr
                size: 1G
              - id: usrhash
                size: grow
        verity:
          - id: verityusr
            name: usr
            dataDeviceId: usr
            hashDeviceId: usrhash
        filesystems:
          - deviceId: esp
            type: fat32
            mountPoint: /boot/efi
          - deviceId: verityusr
            type: ext4
            mountPoint:
              path: /usr
              options: ro
    "#};
    let resolved = resolve(storage).unwrap();
    assert_eq!(resolved.filesystem_partition(1), Some("usr"));

    assert_eq!(
        resolve(&storage.replace("options: ro", "options: rw")).unwrap_err(),
        StorageError::VerityNotReadOnly("verityusr".into())
    );

    assert_eq!(
        resolve(&storage.replace("name: usr", "name: root")).unwrap_err(),
        StorageError::VerityNameMismatch {
            id: "verityusr".into(),
            expected: "usr".into(),
            path: "/usr".into(),
        }
    );

    assert_eq!(
        resolve(&storage.replace("path: /usr", "path: /opt")).unwrap_err(),
        StorageError::VerityInvalidMountPath("verityusr".into())
    );
}

#[test]
fn test_btrfs_loop() {
    let err = resolve(&efi_storage(&format!(
        "{ESP_FILESYSTEM}{}",
        indoc! {r#"
              - deviceId: root
                type: btrfs
                btrfs:
                  subvolumes:
                    - path: var
                      mountPoint: /data/var
                    - path: var/data
                      mountPoint: /data
        "#}
    )))
    .unwrap_err();

    assert_eq!(
        err,
        StorageError::InvalidFileSystem {
            index: 1,
            error: FileSystemError::InvalidBtrfsConfig(BtrfsConfigError::MountPointLoop {
                outer_path: "var".into(),
                outer_mount: "/data/var".into(),
                inner_path: "var/data".into(),
                inner_mount: "/data".into(),
            }),
        }
    );
}

#[test]
fn test_diagnostics() {
    let resolved = resolve(indoc! {r#"
        bootType: efi
        disks:
          - maxSize: 4G
            partitions:
              - id: esp
                type: esp
                size: 8M
              - id: root
                type: root
                size: 1G
              - id: var
                type: var
                size: grow
        filesystems:
          - deviceId: esp
            type: fat32
            mountPoint: /boot/efi
          - deviceId: root
            type: ext4
            mountPoint: /
          - deviceId: var
            type: btrfs
            btrfs:
              subvolumes:
                - path: log
                  mountPoint: /var/log
    "#})
    .unwrap();

    assert_eq!(
        resolved.diagnostics,
        vec![Diagnostic::SubvolumeMountsUnsupported {
            partition_id: "var".into(),
            partition_type: "var".into(),
        }]
    );
}

#[test]
fn test_serialize_resolved_storage() {
    let resolved = resolve(&efi_storage(&format!(
        "{ESP_FILESYSTEM}{}",
        indoc! {r#"
              - deviceId: root
                type: ext4
                mountPoint: /
        "#}
    )))
    .unwrap();

    let yaml = serde_yaml::to_string(&resolved).unwrap();
    assert!(yaml.contains("verityPartitionsType: none"));
    assert!(yaml.contains("kind: partition"));
    assert!(yaml.contains("diskIndex: 0"));

    let parsed: ResolvedStorage = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, resolved);
}
