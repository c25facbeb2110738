use serde::{de::Error, Deserialize, Serialize};
use strum_macros::IntoStaticStr;

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

use crate::is_default;

/// OS level settings. Only the parts that interact with the storage
/// configuration are modeled.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct Os {
    #[serde(default, skip_serializing_if = "is_default")]
    pub bootloader: BootLoader,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct BootLoader {
    /// Whether the boot loader configuration is regenerated from scratch.
    /// Required when the partition layout or the partition UUIDs change.
    #[serde(default, skip_serializing_if = "is_default")]
    pub reset: ResetBootLoaderType,
}

/// Boot loader reset mode.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[serde(rename_all = "kebab-case", try_from = "String")]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
#[strum(serialize_all = "kebab-case")]
pub enum ResetBootLoaderType {
    /// # Default
    ///
    /// Keep the boot loader configuration of the base image.
    #[default]
    #[serde(rename = "")]
    #[strum(serialize = "")]
    Default,

    /// # Hard reset
    ///
    /// Replace the boot loader configuration.
    HardReset,
}

impl TryFrom<String> for ResetBootLoaderType {
    type Error = serde::de::value::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "" => Ok(ResetBootLoaderType::Default),
            "hard-reset" => Ok(ResetBootLoaderType::HardReset),
            _ => Err(Error::custom(format!(
                "invalid resetBootLoaderType value ({value})"
            ))),
        }
    }
}

impl Os {
    /// Returns whether the boot loader configuration is reset.
    pub fn resets_bootloader(&self) -> bool {
        self.bootloader.reset != ResetBootLoaderType::Default
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_deserialize_os() {
        let os: Os = serde_yaml::from_str(indoc! {r#"
            bootloader:
              reset: hard-reset
        "#})
        .unwrap();
        assert!(os.resets_bootloader());
        assert!(!Os::default().resets_bootloader());

        let err = serde_yaml::from_str::<Os>("bootloader:\n  reset: soft").unwrap_err();
        assert!(err
            .to_string()
            .contains("invalid resetBootLoaderType value (soft)"));
    }
}
