//! GPT partition type GUIDs.
//!
//! Values come from the UAPI Group's Discoverable Partitions Specification:
//! <https://uapi-group.org/specifications/specs/discoverable_partitions_specification/>
//! and from the GPT partition type list for the types the specification does
//! not cover (BIOS boot).

use uuid::{uuid, Uuid};

use crate::arch::SystemArchitecture;

/// EFI System Partition.
pub const ESP: Uuid = uuid!("c12a7328-f81f-11d2-ba4b-00a0c93ec93b");

/// BIOS boot partition, used by GRUB on GPT disks booted in legacy mode.
pub const BIOS_BOOT: Uuid = uuid!("21686148-6449-6e6f-744e-656564454649");

/// Generic Linux data partition.
pub const LINUX_GENERIC: Uuid = uuid!("0fc63daf-8483-4772-8e79-3d69d8477de4");

/// Home partition.
pub const HOME: Uuid = uuid!("933ac7e1-2eb4-4f13-b844-0e14e2aef915");

/// Server data partition.
pub const SRV: Uuid = uuid!("3b8f8425-20e0-4f3b-907f-1a25a76f98e8");

/// Swap partition.
pub const SWAP: Uuid = uuid!("0657fd6d-a4ab-43c4-84e5-0933c84b4f4f");

/// Temporary data partition (`/var/tmp`).
pub const TMP: Uuid = uuid!("7ec6f557-3bc5-4aca-b293-16ef5df639d1");

/// Variable data partition.
pub const VAR: Uuid = uuid!("4d21b016-b534-45c2-a9fb-5c16e091fd2d");

/// Extended boot loader partition.
pub const XBOOTLDR: Uuid = uuid!("bc13c2ff-59e6-4262-a352-b275fd6f7172");

/// Partition types whose GUID depends on the system architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchPartitionTypes {
    pub root: Uuid,
    pub root_verity: Uuid,
    pub usr: Uuid,
    pub usr_verity: Uuid,
}

impl ArchPartitionTypes {
    /// Returns the architecture dependent partition types for `arch`.
    pub const fn for_arch(arch: SystemArchitecture) -> Self {
        match arch {
            SystemArchitecture::Amd64 => ArchPartitionTypes {
                root: uuid!("4f68bce3-e8cd-4db1-96e7-fbcaf984b709"),
                root_verity: uuid!("2c7357ed-ebd2-46d9-aec1-23d437ec2bf5"),
                usr: uuid!("8484680c-9521-48c6-9c11-b0720656f69e"),
                usr_verity: uuid!("77ff5f63-e7b6-4633-acf4-1565b864c0e6"),
            },
            SystemArchitecture::Aarch64 => ArchPartitionTypes {
                root: uuid!("b921b045-1df0-41c3-af44-4c6f280d3fae"),
                root_verity: uuid!("df3300ce-d69f-4c92-978c-9bfb0f38d820"),
                usr: uuid!("b0e01050-ee5f-4390-949a-9101b17104e9"),
                usr_verity: uuid!("6e11a4e7-fbca-4ded-b9e9-e1a512bb664e"),
            },
        }
    }
}
