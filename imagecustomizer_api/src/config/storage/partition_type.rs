use std::fmt::Display;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{de::Error, Deserialize, Serialize};
use uuid::Uuid;

use sysdefs::{
    arch::SystemArchitecture,
    partition_types::{self, ArchPartitionTypes},
};

use crate::constants::{
    BOOT_MOUNT_POINT_PATH, ESP_MOUNT_POINT_PATH, HOME_MOUNT_POINT_PATH, ROOT_MOUNT_POINT_PATH,
    SRV_MOUNT_POINT_PATH, USR_MOUNT_POINT_PATH, VAR_MOUNT_POINT_PATH, VAR_TMP_MOUNT_POINT_PATH,
};

lazy_static! {
    static ref UUID_REGEX: Regex = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    )
    .unwrap();
}

/// GPT partition type, given either as a well known name or as a type UUID.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum PartitionType {
    /// Generic Linux data partition.
    #[default]
    Default,
    Esp,
    BiosGrub,
    Home,
    LinuxGeneric,
    Root,
    RootVerity,
    Srv,
    Swap,
    Tmp,
    Usr,
    UsrVerity,
    Var,
    Xbootldr,

    /// A partition type given directly by its GPT type UUID.
    Uuid(Uuid),
}

impl PartitionType {
    /// Returns the GPT type UUID for this partition type on `arch`.
    pub fn type_uuid(&self, arch: SystemArchitecture) -> Uuid {
        let arch_types = ArchPartitionTypes::for_arch(arch);
        match self {
            PartitionType::Default | PartitionType::LinuxGeneric => partition_types::LINUX_GENERIC,
            PartitionType::Esp => partition_types::ESP,
            PartitionType::BiosGrub => partition_types::BIOS_BOOT,
            PartitionType::Home => partition_types::HOME,
            PartitionType::Root => arch_types.root,
            PartitionType::RootVerity => arch_types.root_verity,
            PartitionType::Srv => partition_types::SRV,
            PartitionType::Swap => partition_types::SWAP,
            PartitionType::Tmp => partition_types::TMP,
            PartitionType::Usr => arch_types.usr,
            PartitionType::UsrVerity => arch_types.usr_verity,
            PartitionType::Var => partition_types::VAR,
            PartitionType::Xbootldr => partition_types::XBOOTLDR,
            PartitionType::Uuid(uuid) => *uuid,
        }
    }

    /// Returns the mount paths a partition of this type is expected to use.
    ///
    /// `None` means the type has no expectation. An empty list means the
    /// partition is not expected to be mounted at all.
    pub fn supported_mount_paths(&self) -> Option<&'static [&'static str]> {
        match self {
            PartitionType::Esp => Some(&[ESP_MOUNT_POINT_PATH]),
            PartitionType::Home => Some(&[HOME_MOUNT_POINT_PATH]),
            PartitionType::Root => Some(&[ROOT_MOUNT_POINT_PATH]),
            PartitionType::Srv => Some(&[SRV_MOUNT_POINT_PATH]),
            PartitionType::Tmp => Some(&[VAR_TMP_MOUNT_POINT_PATH]),
            PartitionType::Usr => Some(&[USR_MOUNT_POINT_PATH]),
            PartitionType::Var => Some(&[VAR_MOUNT_POINT_PATH]),
            PartitionType::Xbootldr => Some(&[BOOT_MOUNT_POINT_PATH]),
            PartitionType::BiosGrub
            | PartitionType::Swap
            | PartitionType::RootVerity
            | PartitionType::UsrVerity => Some(&[]),
            PartitionType::Default | PartitionType::LinuxGeneric | PartitionType::Uuid(_) => None,
        }
    }
}

impl Display for PartitionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PartitionType::Default => "",
            PartitionType::Esp => "esp",
            PartitionType::BiosGrub => "bios-grub",
            PartitionType::Home => "home",
            PartitionType::LinuxGeneric => "linux-generic",
            PartitionType::Root => "root",
            PartitionType::RootVerity => "root-verity",
            PartitionType::Srv => "srv",
            PartitionType::Swap => "swap",
            PartitionType::Tmp => "tmp",
            PartitionType::Usr => "usr",
            PartitionType::UsrVerity => "usr-verity",
            PartitionType::Var => "var",
            PartitionType::Xbootldr => "xbootldr",
            PartitionType::Uuid(uuid) => return write!(f, "{uuid}"),
        };
        f.write_str(name)
    }
}

impl TryFrom<&str> for PartitionType {
    type Error = serde::de::value::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ok(match value {
            "" => PartitionType::Default,
            "esp" => PartitionType::Esp,
            "bios-grub" => PartitionType::BiosGrub,
            "home" => PartitionType::Home,
            "linux-generic" => PartitionType::LinuxGeneric,
            "root" => PartitionType::Root,
            "root-verity" => PartitionType::RootVerity,
            "srv" => PartitionType::Srv,
            "swap" => PartitionType::Swap,
            "tmp" => PartitionType::Tmp,
            "usr" => PartitionType::Usr,
            "usr-verity" => PartitionType::UsrVerity,
            "var" => PartitionType::Var,
            "xbootldr" => PartitionType::Xbootldr,
            _ if UUID_REGEX.is_match(value) => PartitionType::Uuid(
                Uuid::parse_str(value).map_err(serde::de::value::Error::custom)?,
            ),
            _ => {
                return Err(Error::custom(format!(
                    "partition type is unknown and is not a UUID ({value})"
                )))
            }
        })
    }
}

impl TryFrom<String> for PartitionType {
    type Error = serde::de::value::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PartitionType::try_from(value.as_str())
    }
}

impl From<PartitionType> for String {
    fn from(value: PartitionType) -> Self {
        value.to_string()
    }
}

#[cfg(feature = "schemars")]
mod schema_impl {
    use schemars::{gen::SchemaGenerator, schema::Schema, JsonSchema};

    use super::PartitionType;

    impl JsonSchema for PartitionType {
        fn schema_name() -> String {
            "PartitionType".to_owned()
        }

        fn json_schema(gen: &mut SchemaGenerator) -> Schema {
            let mut schema = gen.subschema_for::<String>().into_object();
            schema.metadata().description = Some(
                "A well known partition type name (esp, bios-grub, home, linux-generic, root, \
                root-verity, srv, swap, tmp, usr, usr-verity, var, xbootldr) or a GPT \
                partition type UUID."
                    .to_owned(),
            );
            Schema::Object(schema)
        }
    }
}
