use const_format::formatcp;

// Storage constants

/// Size of a partition that will be grown to fill all available space.
pub const PARTITION_SIZE_GROW: &str = "grow";

/// Alignment applied to every disk and partition size. Sizes that are not a
/// multiple of this value are rejected.
pub const PARTITION_ALIGNMENT: u64 = crate::primitives::bytes::MIB;

/// Start of the first partition when no explicit start is given. Also the
/// only valid start of a BIOS boot partition.
pub const FIRST_PARTITION_START: u64 = crate::primitives::bytes::MIB;

/// Maximum number of characters in a GPT partition name, excluding the NUL
/// terminator.
pub const GPT_PARTITION_NAME_MAX_LENGTH: usize = 35;

// Path constants

/// Boot directory name.
pub const BOOT_DIRECTORY: &str = "boot";

/// Root mount point path.
pub const ROOT_MOUNT_POINT_PATH: &str = "/";

/// /usr mount point path.
pub const USR_MOUNT_POINT_PATH: &str = "/usr";

/// Boot mount point path.
pub const BOOT_MOUNT_POINT_PATH: &str = formatcp!("{ROOT_MOUNT_POINT_PATH}{BOOT_DIRECTORY}");

/// ESP mount point path.
pub const ESP_MOUNT_POINT_PATH: &str = formatcp!("{BOOT_MOUNT_POINT_PATH}/efi");

/// /home mount point path.
pub const HOME_MOUNT_POINT_PATH: &str = "/home";

/// /srv mount point path.
pub const SRV_MOUNT_POINT_PATH: &str = "/srv";

/// /var mount point path.
pub const VAR_MOUNT_POINT_PATH: &str = "/var";

/// /var/tmp mount point path.
pub const VAR_TMP_MOUNT_POINT_PATH: &str = formatcp!("{VAR_MOUNT_POINT_PATH}/tmp");

// Verity constants

/// Name of the verity device backing the root filesystem.
pub const ROOT_VERITY_DEVICE_NAME: &str = "root";

/// Name of the verity device backing the /usr filesystem.
pub const USR_VERITY_DEVICE_NAME: &str = "usr";

// Mount options

/// Read-only mount option.
pub const MOUNT_OPTION_READ_ONLY: &str = "ro";

/// BTRFS option selecting a subvolume by path.
pub const MOUNT_OPTION_BTRFS_SUBVOL: &str = "subvol=";

/// BTRFS option selecting a subvolume by id.
pub const MOUNT_OPTION_BTRFS_SUBVOLID: &str = "subvolid=";
