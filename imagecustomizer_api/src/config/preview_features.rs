use std::fmt::Display;

use serde::{de::Error, Deserialize, Serialize};
use strum_macros::IntoStaticStr;

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

/// Features that must be opted into before they can be used.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[serde(rename_all = "kebab-case", try_from = "String")]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
#[strum(serialize_all = "kebab-case")]
pub enum PreviewFeature {
    /// # UKI
    ///
    /// Unified kernel images.
    Uki,

    /// # Output artifacts
    ///
    /// Output of selected artifacts after customization, including verity
    /// hash signatures.
    OutputArtifacts,

    /// # Inject files
    InjectFiles,

    /// # Reinitialize verity
    ///
    /// Reinitialize verity on the verity partitions of the base image.
    ReinitializeVerity,

    /// # Package snapshot time
    PackageSnapshotTime,

    /// # Kdump boot files
    KdumpBootFiles,

    /// # BTRFS
    ///
    /// Creation of `btrfs` filesystems and subvolumes.
    Btrfs,

    /// # Base configs
    BaseConfigs,

    /// # OCI input image
    InputImageOci,
}

impl Display for PreviewFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &'static str = self.into();
        f.write_str(name)
    }
}

impl TryFrom<String> for PreviewFeature {
    type Error = serde::de::value::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(match value.as_str() {
            "uki" => PreviewFeature::Uki,
            "output-artifacts" => PreviewFeature::OutputArtifacts,
            "inject-files" => PreviewFeature::InjectFiles,
            "reinitialize-verity" => PreviewFeature::ReinitializeVerity,
            "package-snapshot-time" => PreviewFeature::PackageSnapshotTime,
            "kdump-boot-files" => PreviewFeature::KdumpBootFiles,
            "btrfs" => PreviewFeature::Btrfs,
            "base-configs" => PreviewFeature::BaseConfigs,
            "input-image-oci" => PreviewFeature::InputImageOci,
            _ => return Err(Error::custom(format!("invalid preview feature: {value}"))),
        })
    }
}
