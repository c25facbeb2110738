use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

use crate::{
    config::storage::{
        error::{BtrfsConfigError, BtrfsQuotaError, BtrfsSubvolumeError, SubvolumePathError},
        mountpoint::{self, MountPoint},
    },
    primitives::{bytes::DiskSize, paths},
};

/// BTRFS specific configuration of a filesystem.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct BtrfsConfig {
    /// Subvolumes to create, in creation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subvolumes: Vec<BtrfsSubvolume>,
}

/// A BTRFS subvolume.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct BtrfsSubvolume {
    /// Path of the subvolume relative to the top-level subvolume.
    pub path: String,

    /// Where the subvolume is mounted.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::primitives::shortcuts::opt_string_or_struct"
    )]
    #[cfg_attr(
        feature = "schemars",
        schemars(
            schema_with = "crate::primitives::shortcuts::opt_string_or_struct_schema::<MountPoint>"
        )
    )]
    pub mount_point: Option<MountPoint>,

    /// Quota limits of the subvolume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<BtrfsQuotaConfig>,
}

/// Quota limits of a BTRFS subvolume.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct BtrfsQuotaConfig {
    /// Maximum total space the subvolume can reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_limit: Option<DiskSize>,

    /// Maximum space used exclusively by the subvolume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_limit: Option<DiskSize>,
}

impl BtrfsConfig {
    pub fn validate(&self) -> Result<(), BtrfsConfigError> {
        let mut paths = HashSet::new();
        for (index, subvolume) in self.subvolumes.iter().enumerate() {
            subvolume
                .validate()
                .map_err(|error| BtrfsConfigError::InvalidSubvolume { index, error })?;

            if !paths.insert(subvolume.path.as_str()) {
                return Err(BtrfsConfigError::DuplicatePath {
                    index,
                    path: subvolume.path.clone(),
                });
            }
        }

        self.check_mount_point_loops()
    }

    /// Returns every subvolume that has a mount point, with that mount point.
    pub fn mounted_subvolumes(&self) -> impl Iterator<Item = (&BtrfsSubvolume, &MountPoint)> {
        self.subvolumes
            .iter()
            .filter_map(|s| s.mount_point.as_ref().map(|mp| (s, mp)))
    }

    /// Rejects pairs of subvolumes where one is nested inside the other but
    /// the outer one is mounted below the inner one. Mounting such a pair
    /// would make each mount reachable from the other.
    fn check_mount_point_loops(&self) -> Result<(), BtrfsConfigError> {
        for (i, (outer, outer_mount)) in self.mounted_subvolumes().enumerate() {
            let outer_subvolume_prefix = format!("{}/", outer.path);
            let outer_mount_path = paths::clean_path(&outer_mount.path);

            for (j, (inner, inner_mount)) in self.mounted_subvolumes().enumerate() {
                if i == j || !inner.path.starts_with(&outer_subvolume_prefix) {
                    continue;
                }

                let inner_mount_prefix = format!("{}/", paths::clean_path(&inner_mount.path));
                if outer_mount_path.starts_with(&inner_mount_prefix) {
                    return Err(BtrfsConfigError::MountPointLoop {
                        outer_path: outer.path.clone(),
                        outer_mount: outer_mount.path.clone(),
                        inner_path: inner.path.clone(),
                        inner_mount: inner_mount.path.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl BtrfsSubvolume {
    pub fn validate(&self) -> Result<(), BtrfsSubvolumeError> {
        validate_subvolume_path(&self.path).map_err(BtrfsSubvolumeError::InvalidPath)?;

        if let Some(mount_point) = &self.mount_point {
            mount_point
                .validate()
                .map_err(BtrfsSubvolumeError::InvalidMountPoint)?;

            mountpoint::validate_btrfs_mount_options(&mount_point.options)
                .map_err(BtrfsSubvolumeError::InvalidMountOptions)?;
        }

        if let Some(quota) = &self.quota {
            quota.validate().map_err(BtrfsSubvolumeError::InvalidQuota)?;
        }

        Ok(())
    }
}

impl BtrfsQuotaConfig {
    pub fn validate(&self) -> Result<(), BtrfsQuotaError> {
        if let Some(limit) = self.referenced_limit.filter(|l| l.bytes() == 0) {
            return Err(BtrfsQuotaError::ZeroReferencedLimit(limit.bytes()));
        }

        if let Some(limit) = self.exclusive_limit.filter(|l| l.bytes() == 0) {
            return Err(BtrfsQuotaError::ZeroExclusiveLimit(limit.bytes()));
        }

        Ok(())
    }
}

fn validate_subvolume_path(path: &str) -> Result<(), SubvolumePathError> {
    if path.is_empty() {
        return Err(SubvolumePathError::Empty);
    }

    if path.starts_with('/') {
        return Err(SubvolumePathError::LeadingSlash);
    }

    if path.ends_with('/') {
        return Err(SubvolumePathError::TrailingSlash);
    }

    for component in path.split('/') {
        match component {
            "" => return Err(SubvolumePathError::DoubleSlash),
            ".." => return Err(SubvolumePathError::ParentComponent),
            "." => return Err(SubvolumePathError::CurrentComponent),
            _ => {}
        }
    }

    Ok(())
}
