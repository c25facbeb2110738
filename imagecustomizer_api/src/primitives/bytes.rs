use std::{fmt::Display, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::PARTITION_ALIGNMENT;

pub const KIB: u64 = 1 << 10;
pub const MIB: u64 = 1 << 20;
pub const GIB: u64 = 1 << 30;
pub const TIB: u64 = 1 << 40;

lazy_static! {
    static ref DISK_SIZE_REGEX: Regex = Regex::new(r"^(\d+)([KMGT])?$").unwrap();
}

/// Expected format appended to every size parsing error.
pub(crate) const DISK_SIZE_FORMAT_HINT: &str = "expected format: <NUM>(K|M|G|T) (e.g. 100M, 1G)";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiskSizeError {
    #[error("({0}) has incorrect format")]
    IncorrectFormat(String),

    #[error("({0}) must have a unit suffix (K, M, G, or T)")]
    MissingUnitSuffix(String),

    #[error("({value}) must be a multiple of {alignment}")]
    Misaligned { value: String, alignment: String },

    #[error("({0}) is too large")]
    TooLarge(String),
}

/// A byte count used for disk and partition geometry.
///
/// Parsed from `<NUM>[K|M|G|T]` (powers of 1024). Every value must be a
/// multiple of 1 MiB. A bare `0` is accepted without a unit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiskSize(pub u64);

impl DiskSize {
    pub fn bytes(self) -> u64 {
        self.0
    }

    /// Renders the size using the largest binary unit that divides it evenly,
    /// e.g. `1 MiB` or `4 GiB`.
    pub fn human_readable(&self) -> String {
        match self.0 {
            n if n != 0 && n % TIB == 0 => format!("{} TiB", n / TIB),
            n if n != 0 && n % GIB == 0 => format!("{} GiB", n / GIB),
            n if n != 0 && n % MIB == 0 => format!("{} MiB", n / MIB),
            n if n != 0 && n % KIB == 0 => format!("{} KiB", n / KIB),
            n => format!("{n} bytes"),
        }
    }
}

impl From<u64> for DiskSize {
    fn from(x: u64) -> Self {
        DiskSize(x)
    }
}

impl Display for DiskSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.trailing_zeros() {
            _ if self.0 == 0 => write!(f, "0"),
            0..=9 => write!(f, "{}", self.0),
            10..=19 => write!(f, "{}K", self.0 >> 10),
            20..=29 => write!(f, "{}M", self.0 >> 20),
            30..=39 => write!(f, "{}G", self.0 >> 30),
            _ => write!(f, "{}T", self.0 >> 40),
        }
    }
}

impl FromStr for DiskSize {
    type Err = DiskSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = DISK_SIZE_REGEX
            .captures(s)
            .ok_or_else(|| DiskSizeError::IncorrectFormat(s.to_owned()))?;

        let number = captures[1]
            .parse::<u64>()
            .map_err(|_| DiskSizeError::TooLarge(s.to_owned()))?;

        let multiplier = match captures.get(2).map(|m| m.as_str()) {
            Some("K") => KIB,
            Some("M") => MIB,
            Some("G") => GIB,
            Some("T") => TIB,
            _ if number == 0 => 1,
            _ => return Err(DiskSizeError::MissingUnitSuffix(s.to_owned())),
        };

        let bytes = number
            .checked_mul(multiplier)
            .ok_or_else(|| DiskSizeError::TooLarge(s.to_owned()))?;

        if bytes % PARTITION_ALIGNMENT != 0 {
            return Err(DiskSizeError::Misaligned {
                value: s.to_owned(),
                alignment: DiskSize(PARTITION_ALIGNMENT).human_readable(),
            });
        }

        Ok(DiskSize(bytes))
    }
}

/// Reads a size value that may have been written as a YAML string or as a
/// plain number. Serde forces a number when only digits are provided, so the
/// value is read as a generic YAML value first.
pub(crate) fn size_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(Some(s)),
        serde_yaml::Value::Number(n) => Ok(Some(n.to_string())),
        _ => Ok(None),
    }
}

impl<'de> Deserialize<'de> for DiskSize {
    fn deserialize<D>(deserializer: D) -> Result<DiskSize, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = size_string(deserializer)?
            .ok_or_else(|| serde::de::Error::custom("failed to parse disk size"))?;

        DiskSize::from_str(&value)
            .map_err(|e| serde::de::Error::custom(format!("{e}:\n{DISK_SIZE_FORMAT_HINT}")))
    }
}

impl Serialize for DiskSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

#[cfg(feature = "schemars")]
mod schema_impl {
    use std::borrow::Cow;

    use schemars::{
        gen::SchemaGenerator,
        schema::{InstanceType, Schema, SingleOrVec},
        JsonSchema,
    };

    use super::DiskSize;

    impl JsonSchema for DiskSize {
        fn schema_name() -> String {
            "DiskSize".to_owned()
        }

        fn schema_id() -> Cow<'static, str> {
            Cow::Owned(format!(
                concat!(module_path!(), "::{}"),
                Self::schema_name()
            ))
        }

        fn json_schema(gen: &mut SchemaGenerator) -> Schema {
            let mut schema = gen.subschema_for::<String>().into_object();
            schema.instance_type = Some(SingleOrVec::Single(Box::new(InstanceType::String)));
            schema.string().pattern = Some(r"^\d+[KMGT]$".to_owned());
            let metadata = schema.metadata();
            metadata.description = Some(
                "A size with a unit suffix (K, M, G, T, to the base of 1024). Must be a \
                multiple of 1 MiB."
                    .to_owned(),
            );
            metadata.examples = vec![
                serde_json::json!("1M"),
                serde_json::json!("100M"),
                serde_json::json!("5G"),
                serde_json::json!("4T"),
            ];

            Schema::Object(schema)
        }
    }
}
