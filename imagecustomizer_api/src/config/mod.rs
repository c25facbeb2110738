use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

use crate::is_default;

pub mod error;
pub mod os;
pub mod preview_features;
pub mod storage;

use error::ConfigValidationError;
use os::Os;
use preview_features::PreviewFeature;
use storage::{resolver::ResolvedStorage, ReinitializeVerityType, ResetPartitionsUuidsType, Storage};

/// Image customization configuration.
///
/// Only the sections that take part in storage validation are modeled.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct Config {
    /// Storage layout of the output image.
    #[serde(default, skip_serializing_if = "is_default")]
    pub storage: Storage,

    /// OS settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<Os>,

    /// Preview features to enable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preview_features: Vec<PreviewFeature>,
}

impl Config {
    /// Validates the configuration and returns the resolved storage.
    pub fn validate(&self) -> Result<ResolvedStorage, ConfigValidationError> {
        let resolved = self.storage.resolve()?;

        let resets_bootloader = self.os.as_ref().is_some_and(Os::resets_bootloader);

        if self.customize_partitions() && !resets_bootloader {
            return Err(ConfigValidationError::BootloaderResetRequiredForDisks);
        }

        if self.storage.reset_partitions_uuids_type != ResetPartitionsUuidsType::Default
            && !resets_bootloader
        {
            return Err(ConfigValidationError::BootloaderResetRequiredForResetUuids);
        }

        if self
            .storage
            .verity
            .iter()
            .any(|verity| !verity.hash_signature_path.is_empty())
        {
            self.require_preview_feature(
                PreviewFeature::OutputArtifacts,
                "'verity.hashSignaturePath'",
            )?;
        }

        if self.storage.reinitialize_verity != ReinitializeVerityType::Default {
            self.require_preview_feature(
                PreviewFeature::ReinitializeVerity,
                "'storage.reinitializeVerity'",
            )?;
        }

        if self
            .storage
            .file_systems
            .iter()
            .any(|fs| fs.fs_type.is_btrfs())
        {
            self.require_preview_feature(PreviewFeature::Btrfs, "btrfs filesystems")?;
        }

        debug!("Configuration is valid");
        Ok(resolved)
    }

    /// Returns whether the configuration replaces the partition layout of the
    /// base image.
    pub fn customize_partitions(&self) -> bool {
        self.storage.customize_partitions()
    }

    /// Returns whether `feature` is enabled.
    pub fn has_preview_feature(&self, feature: PreviewFeature) -> bool {
        self.preview_features.contains(&feature)
    }

    fn require_preview_feature(
        &self,
        feature: PreviewFeature,
        usage: &str,
    ) -> Result<(), ConfigValidationError> {
        if self.has_preview_feature(feature) {
            Ok(())
        } else {
            Err(ConfigValidationError::PreviewFeatureRequired {
                feature,
                usage: usage.to_owned(),
            })
        }
    }
}
