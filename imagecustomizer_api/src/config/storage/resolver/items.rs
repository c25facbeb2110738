use crate::config::storage::{
    error::StorageError, BootType, ResetPartitionsUuidsType, Storage,
};

use super::VerityPartitionsType;

/// Validates every disk, verity device and filesystem on its own and
/// determines how the verity devices reference their partitions.
pub(super) fn check_items(storage: &Storage) -> Result<VerityPartitionsType, StorageError> {
    if storage.disks.len() > 1 {
        return Err(StorageError::MultipleDisks);
    }

    for (index, disk) in storage.disks.iter().enumerate() {
        disk.validate()
            .map_err(|error| StorageError::InvalidDisk { index, error })?;
    }

    let mut uses_device_ids = false;
    let mut uses_identified_partitions = false;
    for (index, verity) in storage.verity.iter().enumerate() {
        verity
            .validate()
            .map_err(|error| StorageError::InvalidVerity { index, error })?;

        uses_device_ids |= verity.uses_device_ids();
        uses_identified_partitions |= verity.uses_identified_partitions();
    }

    let verity_partitions_type = match (uses_device_ids, uses_identified_partitions) {
        (true, true) => return Err(StorageError::MixedVerityDeviceStyles),
        (true, false) => VerityPartitionsType::UsesConfig,
        (false, true) => VerityPartitionsType::UsesExisting,
        (false, false) => VerityPartitionsType::None,
    };

    for (index, file_system) in storage.file_systems.iter().enumerate() {
        file_system
            .validate()
            .map_err(|error| StorageError::InvalidFileSystem { index, error })?;
    }

    Ok(verity_partitions_type)
}

/// Checks which top-level sections of the storage configuration may be
/// combined.
pub(super) fn check_sections(
    storage: &Storage,
    verity_partitions_type: VerityPartitionsType,
) -> Result<(), StorageError> {
    let has_reset_uuids = storage.reset_partitions_uuids_type != ResetPartitionsUuidsType::Default;
    let has_boot_type = storage.boot_type != BootType::None;
    let has_disks = !storage.disks.is_empty();
    let has_file_systems = !storage.file_systems.is_empty();

    if has_reset_uuids && has_disks {
        return Err(StorageError::ResetUuidsWithDisks);
    }

    if !has_boot_type && has_disks {
        return Err(StorageError::DisksWithoutBootType);
    }

    if has_boot_type && !has_disks {
        return Err(StorageError::BootTypeWithoutDisks);
    }

    if has_file_systems && !has_disks {
        return Err(StorageError::FileSystemsWithoutDisks);
    }

    match verity_partitions_type {
        VerityPartitionsType::UsesConfig if !has_disks => {
            Err(StorageError::VerityDeviceIdsWithoutDisks)
        }
        VerityPartitionsType::UsesExisting if has_disks => {
            Err(StorageError::VerityDevicesWithDisks)
        }
        _ => Ok(()),
    }
}
