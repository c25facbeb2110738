//! Validation errors for the full configuration.

use serde::{Deserialize, Serialize};

use super::{preview_features::PreviewFeature, storage::error::StorageError};

/// Errors found while validating a configuration, before anything is applied
/// to an image.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigValidationError {
    #[error(transparent)]
    InvalidStorage(#[from] StorageError),

    #[error("'os.bootloader.reset' must be specified if 'storage.disks' is specified")]
    BootloaderResetRequiredForDisks,

    #[error(
        "'os.bootloader.reset' must be specified if 'storage.resetPartitionsUuidsType' is specified"
    )]
    BootloaderResetRequiredForResetUuids,

    #[error("the '{feature}' preview feature must be enabled to use {usage}")]
    PreviewFeatureRequired {
        feature: PreviewFeature,
        usage: String,
    },
}
