use std::path::Path;

use anyhow::Context;
use log::{debug, info};

use imagecustomizer_api::{
    config::{storage::resolver::ResolvedStorage, Config},
    error::{
        ImageCustomizerError, ImageCustomizerResultExt, InternalError, InvalidInputError,
        ReportError,
    },
};

/// Reads and parses a configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ImageCustomizerError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))
        .structured(InvalidInputError::LoadConfiguration {
            path: path.to_string_lossy().to_string(),
        })?;

    serde_yaml::from_str::<Config>(&contents)
        .structured(InvalidInputError::ParseConfiguration)
        .message(format!(
            "Failed to parse configuration YAML file: {}",
            path.display()
        ))
}

/// Validates a parsed configuration and returns its resolved storage.
pub fn validate_config(config: &Config) -> Result<ResolvedStorage, ImageCustomizerError> {
    let resolved = config
        .validate()
        .map_err(ImageCustomizerError::from)
        .message("Configuration is invalid")?;

    info!("Configuration is valid");
    if log::log_enabled!(log::Level::Debug) {
        debug!(
            "Parsed contents:\n{}",
            serde_yaml::to_string(config).unwrap_or_default()
        );
    }
    Ok(resolved)
}

pub fn validate_config_file(path: impl AsRef<Path>) -> Result<(), ImageCustomizerError> {
    info!("Validating configuration file: {}", path.as_ref().display());
    validate_config(&load_config(path)?).map(|_| ())
}

/// Validates a configuration file and writes its resolved storage as YAML to
/// `output`, or to stdout when no output path is given.
pub fn resolve_config_file(
    path: impl AsRef<Path>,
    output: Option<&Path>,
) -> Result<(), ImageCustomizerError> {
    info!("Resolving configuration file: {}", path.as_ref().display());
    let resolved = validate_config(&load_config(path)?)?;

    let serialized =
        serde_yaml::to_string(&resolved).structured(InternalError::SerializeResolvedStorage)?;

    match output {
        Some(output) => {
            std::fs::write(output, serialized).structured(InternalError::WriteOutput {
                path: output.to_string_lossy().to_string(),
            })?;
            info!("Resolved storage written to {}", output.display());
        }
        None => print!("{serialized}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use imagecustomizer_api::{config::error::ConfigValidationError, error::ErrorKind};
    use indoc::indoc;
    use tempfile::tempdir;

    const EFI_CONFIG: &str = indoc! {r#"
        storage:
          bootType: efi
          disks:
            - partitionTableType: gpt
              maxSize: 4G
              partitions:
                - id: esp
                  type: esp
                  size: 8M
                - id: root
                  size: grow
          filesystems:
            - deviceId: esp
              type: fat32
              mountPoint: /boot/efi
            - deviceId: root
              type: ext4
              mountPoint: /
        os:
          bootloader:
            reset: hard-reset
    "#};

    #[test]
    fn test_resolve_config_file() {
        let test_dir = tempdir().unwrap();
        let config_path = test_dir.path().join("config.yaml");
        let output_path = test_dir.path().join("resolved.yaml");
        std::fs::write(&config_path, EFI_CONFIG).unwrap();

        validate_config_file(&config_path).unwrap();
        resolve_config_file(&config_path, Some(&output_path)).unwrap();

        let resolved: ResolvedStorage =
            serde_yaml::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
        assert_eq!(resolved.filesystem_partitions, vec!["esp", "root"]);
    }

    #[test]
    fn test_load_config_errors() {
        let test_dir = tempdir().unwrap();

        let missing = test_dir.path().join("missing.yaml");
        let err = load_config(&missing).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::InvalidInput(InvalidInputError::LoadConfiguration {
                path: missing.to_string_lossy().to_string(),
            })
        );

        let unknown_field = test_dir.path().join("unknown.yaml");
        std::fs::write(&unknown_field, "storage:\n  partitions: []\n").unwrap();
        let err = load_config(&unknown_field).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::InvalidInput(InvalidInputError::ParseConfiguration)
        );
    }

    #[test]
    fn test_invalid_config() {
        let test_dir = tempdir().unwrap();
        let config_path = test_dir.path().join("config.yaml");
        let without_os = EFI_CONFIG.split("os:").next().unwrap();
        std::fs::write(&config_path, without_os).unwrap();

        let err = validate_config_file(&config_path).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::InvalidInput(InvalidInputError::InvalidConfiguration(
                ConfigValidationError::BootloaderResetRequiredForDisks
            ))
        );
        assert!(format!("{err:?}").contains("Configuration is invalid"));
    }
}
