use serde::{Deserialize, Serialize};

use crate::{
    primitives::{gpt::GptNameError, paths::PathError},
    DeviceId,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MountPointError {
    #[error("invalid path:\n{0}")]
    InvalidPath(PathError),

    #[error("options ({0}) contain spaces, tabs, or newlines and are invalid")]
    InvalidOptions(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BtrfsMountOptionsError {
    #[error("'subvol=' option is not allowed; it is automatically added by Image Customizer")]
    SubvolNotAllowed,

    #[error(
        "'subvolid=' option is not allowed; 'subvol=' is automatically added by Image Customizer"
    )]
    SubvolidNotAllowed,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubvolumePathError {
    #[error("path must not be empty")]
    Empty,

    #[error("path must not start with '/'")]
    LeadingSlash,

    #[error("path must not end with '/'")]
    TrailingSlash,

    #[error("path must not contain double slashes")]
    DoubleSlash,

    #[error("path must not contain '..' components")]
    ParentComponent,

    #[error("path must not contain '.' components")]
    CurrentComponent,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BtrfsQuotaError {
    #[error("referencedLimit value ({0}) must be a positive non-zero number")]
    ZeroReferencedLimit(u64),

    #[error("exclusiveLimit value ({0}) must be a positive non-zero number")]
    ZeroExclusiveLimit(u64),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BtrfsSubvolumeError {
    #[error("invalid path:\n{0}")]
    InvalidPath(SubvolumePathError),

    #[error("invalid mountPoint:\n{0}")]
    InvalidMountPoint(MountPointError),

    #[error("invalid mountPoint.options:\n{0}")]
    InvalidMountOptions(BtrfsMountOptionsError),

    #[error("invalid quota:\n{0}")]
    InvalidQuota(BtrfsQuotaError),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BtrfsConfigError {
    #[error("invalid subvolume at index {index}:\n{error}")]
    InvalidSubvolume {
        index: usize,
        error: BtrfsSubvolumeError,
    },

    #[error("invalid subvolume at index {index}:\nduplicate path ({path})")]
    DuplicatePath { index: usize, path: String },

    #[error(
        "subvolume mount point loop detected: subvolume '{outer_path}' (mounted at \
        '{outer_mount}') contains nested subvolume '{inner_path}' (mounted at '{inner_mount}'), \
        but the mount points are inverted creating a filesystem loop"
    )]
    MountPointLoop {
        outer_path: String,
        outer_mount: String,
        inner_path: String,
        inner_mount: String,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileSystemError {
    #[error("invalid 'deviceId' value: must not be empty")]
    EmptyDeviceId,

    #[error("'btrfs' configuration is only valid for 'btrfs' filesystems")]
    BtrfsConfigOnNonBtrfs,

    #[error("invalid 'btrfs' configuration:\n{0}")]
    InvalidBtrfsConfig(BtrfsConfigError),

    #[error("'mountPoint' cannot be set when 'btrfs.subvolumes' is non-empty")]
    MountPointWithSubvolumes,

    #[error("invalid 'mountPoint' value:\n{0}")]
    InvalidMountPoint(MountPointError),

    #[error("filesystem with 'mountPoint' must have a 'type'")]
    MountPointWithoutType,

    #[error("invalid 'mountPoint.options' for 'btrfs' filesystem:\n{0}")]
    InvalidBtrfsMountOptions(BtrfsMountOptionsError),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartitionError {
    #[error("invalid 'label' value:\n{0}")]
    InvalidLabel(GptNameError),

    #[error("cannot specify both end and size on partition ({id})")]
    BothEndAndSize { id: DeviceId },

    #[error("partition's ({id}) size can't be 0 or negative")]
    NonPositiveSize { id: DeviceId },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiskError {
    #[error("a disk's maxSize value ({0}) must be a positive non-zero number")]
    ZeroMaxSize(u64),

    #[error("invalid partition at index {index}:\n{error}")]
    InvalidPartition {
        index: usize,
        error: PartitionError,
    },

    #[error("partition ({id}) overlaps with the previous partition ({previous})")]
    Overlap { id: DeviceId, previous: DeviceId },

    #[error("partition ({id}) is not the last partition but its size is not fixed")]
    UnboundedPartitionNotLast { id: DeviceId },

    #[error("disk's 'maxSize' must be specified when the last partition ({id}) has no fixed size")]
    MaxSizeRequired { id: DeviceId },

    #[error("partition ({id}) ends past the disk's 'maxSize' ({max_size})")]
    ExceedsMaxSize { id: DeviceId, max_size: String },

    #[error("BIOS boot partition must start at 1 MiB")]
    BiosBootStart,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentifiedPartitionError {
    #[error("invalid id: empty string")]
    EmptyId,

    #[error("invalid id format for part-label:\n{0}")]
    InvalidName(GptNameError),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerityError {
    #[error("'id' may not be empty")]
    EmptyId,

    #[error("invalid 'name' value ({0})")]
    InvalidName(String),

    #[error("either 'dataDeviceId' or 'dataDevice' must be specified")]
    MissingDataDevice,

    #[error("cannot specify both 'dataDeviceId' and 'dataDevice'")]
    BothDataDevices,

    #[error("either 'hashDeviceId' or 'hashDevice' must be specified")]
    MissingHashDevice,

    #[error("cannot specify both 'hashDeviceId' and 'hashDevice'")]
    BothHashDevices,

    #[error("cannot use both dataDeviceId/hashDeviceId and dataDevice/hashDevice")]
    MixedDeviceStyles,

    #[error("invalid 'dataDevice':\n{0}")]
    InvalidDataDevice(IdentifiedPartitionError),

    #[error("invalid 'hashDevice':\n{0}")]
    InvalidHashDevice(IdentifiedPartitionError),

    #[error("invalid hashSignaturePath:\n{0}")]
    InvalidHashSignaturePath(PathError),

    #[error(
        "verity.hashSignaturePath ({path}) is not normalized (cleaned path: {cleaned}). \
        Please provide a canonical path"
    )]
    HashSignaturePathNotNormalized { path: String, cleaned: String },

    #[error("verity.hashSignaturePath ({0}) must be located under /boot mount point (/boot)")]
    HashSignaturePathNotUnderBoot(String),
}

/// Errors resolving a reference from one storage item to a device.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceReferenceError {
    #[error("device ({0}) not found")]
    NotFound(DeviceId),

    #[error("device ({0}) is used by multiple things")]
    MultipleOwners(DeviceId),

    #[error("device ({0}) must be a partition")]
    NotAPartition(DeviceId),
}

/// Cross-item errors for a verity device, found while resolving the device
/// graph.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerityReferenceError {
    #[error("duplicate id ({0})")]
    DuplicateId(DeviceId),

    #[error("invalid 'dataDeviceId':\n{0}")]
    InvalidDataDeviceId(DeviceReferenceError),

    #[error("invalid 'hashDeviceId':\n{0}")]
    InvalidHashDeviceId(DeviceReferenceError),
}

/// Cross-item errors for a filesystem, found while resolving the device graph.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileSystemReferenceError {
    #[error("invalid 'deviceId':\n{0}")]
    InvalidDeviceId(DeviceReferenceError),

    #[error("duplicate 'mountPoint.path' ({0})")]
    DuplicateMountPath(String),

    #[error("duplicate 'mountPoint.path' ({path}) in btrfs subvolume ({subvolume})")]
    DuplicateSubvolumeMountPath { path: String, subvolume: String },

    #[error("idType set to 'part-label' but partition ({0}) has no label set")]
    MissingPartitionLabel(DeviceId),

    #[error(
        "idType set to 'part-label' for btrfs subvolume ({subvolume}) but partition \
        ({partition}) has no label set"
    )]
    SubvolumeMissingPartitionLabel {
        subvolume: String,
        partition: DeviceId,
    },

    #[error("more than one partition has a label of ({0})")]
    DuplicatePartitionLabel(String),

    #[error("filesystem for verity device ({0}) may not specify 'mountPoint.idType'")]
    VerityMountIdType(DeviceId),

    #[error(
        "btrfs subvolume ({subvolume}) for verity device ({verity}) may not specify \
        'mountPoint.idType'"
    )]
    VeritySubvolumeMountIdType { subvolume: String, verity: DeviceId },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageError {
    #[error("defining multiple disks is not currently supported")]
    MultipleDisks,

    #[error("invalid disk at index {index}:\n{error}")]
    InvalidDisk { index: usize, error: DiskError },

    #[error("invalid verity item at index {index}:\n{error}")]
    InvalidVerity { index: usize, error: VerityError },

    #[error("cannot use both dataDeviceId/hashDeviceId and dataDevice/hashDevice")]
    MixedVerityDeviceStyles,

    #[error("invalid filesystems item at index {index}:\n{error}")]
    InvalidFileSystem {
        index: usize,
        error: FileSystemError,
    },

    #[error("cannot specify both 'resetPartitionsUuidsType' and 'disks'")]
    ResetUuidsWithDisks,

    #[error("must specify 'bootType' if 'disks' are specified")]
    DisksWithoutBootType,

    #[error("cannot specify 'bootType' without specifying 'disks'")]
    BootTypeWithoutDisks,

    #[error("cannot specify 'filesystems' without specifying 'disks'")]
    FileSystemsWithoutDisks,

    #[error("cannot specify 'verity' with dataDeviceId/hashDeviceId without specifying 'disks'")]
    VerityDeviceIdsWithoutDisks,

    #[error("cannot specify both 'verity' with dataDevice/hashDevice and 'disks'")]
    VerityDevicesWithDisks,

    #[error("invalid disk at index {disk}:\ninvalid partition at index {partition}:\nduplicate id ({id})")]
    DuplicatePartitionId {
        disk: usize,
        partition: usize,
        id: DeviceId,
    },

    #[error("invalid verity item at index {index}:\n{error}")]
    InvalidVerityReference {
        index: usize,
        error: VerityReferenceError,
    },

    #[error("invalid filesystem item at index {index}:\n{error}")]
    InvalidFileSystemReference {
        index: usize,
        error: FileSystemReferenceError,
    },

    #[error("ESP partition ({0}) must have 'fat32' or 'vfat' filesystem type")]
    EspInvalidFileSystemType(DeviceId),

    #[error("ESP partition ({0}) must be mounted at /boot/efi")]
    EspInvalidMountPath(DeviceId),

    #[error("BIOS boot partition ({0}) must not have a filesystem 'type'")]
    BiosBootWithFileSystemType(DeviceId),

    #[error("BIOS boot partition ({0}) must not have a 'mountPoint'")]
    BiosBootWithMountPoint(DeviceId),

    #[error("'esp' partition must be provided for 'efi' boot type")]
    MissingEspPartition,

    #[error("'bios-grub' partition must be provided for 'legacy' boot type")]
    MissingBiosBootPartition,

    #[error("verity device ({0}) has multiple mount points, which is not supported")]
    VerityMultipleMountPoints(DeviceId),

    #[error("mount path of verity device ({0}) must be set to '/' or '/usr'")]
    VerityInvalidMountPath(DeviceId),

    #[error("mount path of verity device ({id}) must match verity name: '{expected}' for '{path}'")]
    VerityNameMismatch {
        id: DeviceId,
        expected: String,
        path: String,
    },

    #[error("verity device's ({0}) mount must include the 'ro' mount option")]
    VerityNotReadOnly(DeviceId),

    #[error("storage device graph contains a cycle through ({0})")]
    DeviceGraphCycle(String),
}
