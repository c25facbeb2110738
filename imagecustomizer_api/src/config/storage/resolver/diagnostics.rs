use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::DeviceId;

/// A finding about a storage configuration that does not make it invalid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Diagnostic {
    /// A BTRFS filesystem on a typed partition mounts subvolumes.
    SubvolumeMountsUnsupported {
        partition_id: DeviceId,
        partition_type: String,
    },

    /// A filesystem on a typed partition is mounted somewhere the partition
    /// type does not expect.
    UnexpectedMountPath {
        path: String,
        partition_id: DeviceId,
        partition_type: String,
        expected_paths: Vec<String>,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::SubvolumeMountsUnsupported {
                partition_id,
                partition_type,
            } => write!(
                f,
                "partition ({partition_id}) with type ({partition_type}) does not support BTRFS subvolume mounts"
            ),
            Diagnostic::UnexpectedMountPath {
                path,
                partition_id,
                partition_type,
                expected_paths,
            } => write!(
                f,
                "Unexpected mount path ({path}) for partition ({partition_id}) with type ({partition_type}). Expected paths: [{}]",
                expected_paths.join(" ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::UnexpectedMountPath {
            path: "/data".into(),
            partition_id: "home".into(),
            partition_type: "home".into(),
            expected_paths: vec!["/home".into()],
        };
        assert_eq!(
            diagnostic.to_string(),
            "Unexpected mount path (/data) for partition (home) with type (home). Expected paths: [/home]"
        );

        let diagnostic = Diagnostic::SubvolumeMountsUnsupported {
            partition_id: "var".into(),
            partition_type: "var".into(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "partition (var) with type (var) does not support BTRFS subvolume mounts"
        );
    }

    #[test]
    fn test_serialize() {
        let diagnostic = Diagnostic::SubvolumeMountsUnsupported {
            partition_id: "var".into(),
            partition_type: "var".into(),
        };
        assert_eq!(
            serde_yaml::to_string(&diagnostic).unwrap(),
            "kind: subvolume-mounts-unsupported\npartitionId: var\npartitionType: var\n"
        );
    }
}
