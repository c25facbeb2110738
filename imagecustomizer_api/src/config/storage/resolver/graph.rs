use std::collections::BTreeMap;

use petgraph::{
    algo,
    graph::{DiGraph, NodeIndex},
    visit::{EdgeRef, IntoNodeReferences},
};
use serde::{Deserialize, Serialize};

use crate::{
    config::storage::{error::StorageError, Storage},
    DeviceId,
};

use super::DeviceOwner;

/// A device or filesystem to create.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum StorageNode {
    Partition { id: DeviceId },
    Verity { id: DeviceId },
    FileSystem { index: usize, device_id: DeviceId },
}

impl StorageNode {
    /// Returns a short description of the node.
    pub fn describe(&self) -> String {
        match self {
            StorageNode::Partition { id } => format!("partition '{id}'"),
            StorageNode::Verity { id } => format!("verity device '{id}'"),
            StorageNode::FileSystem { index, device_id } => {
                format!("filesystem #{index} on '{device_id}'")
            }
        }
    }

    fn rank(&self) -> u8 {
        match self {
            StorageNode::Partition { .. } => 0,
            StorageNode::Verity { .. } => 1,
            StorageNode::FileSystem { .. } => 2,
        }
    }
}

/// Graph of the devices of a configuration. Edges point from a device to its
/// user.
pub(super) struct OwnershipGraph {
    inner: DiGraph<StorageNode, ()>,
}

impl OwnershipGraph {
    pub(super) fn build(storage: &Storage, owners: &BTreeMap<DeviceId, DeviceOwner>) -> Self {
        let mut inner = DiGraph::new();
        let mut device_indices: BTreeMap<&str, NodeIndex> = BTreeMap::new();

        for partition in storage.disks.iter().flat_map(|disk| &disk.partitions) {
            let idx = inner.add_node(StorageNode::Partition {
                id: partition.id.clone(),
            });
            device_indices.insert(partition.id.as_str(), idx);
        }

        let verity_indices: Vec<NodeIndex> = storage
            .verity
            .iter()
            .map(|verity| {
                let idx = inner.add_node(StorageNode::Verity {
                    id: verity.id.clone(),
                });
                device_indices.insert(verity.id.as_str(), idx);
                idx
            })
            .collect();

        let filesystem_indices: Vec<NodeIndex> = storage
            .file_systems
            .iter()
            .enumerate()
            .map(|(index, fs)| {
                inner.add_node(StorageNode::FileSystem {
                    index,
                    device_id: fs.device_id.clone(),
                })
            })
            .collect();

        for (device_id, owner) in owners {
            let owner_idx = match owner {
                DeviceOwner::FileSystem { index } => filesystem_indices.get(*index),
                DeviceOwner::Verity { index } => verity_indices.get(*index),
            };

            if let (Some(device_idx), Some(owner_idx)) =
                (device_indices.get(device_id.as_str()), owner_idx)
            {
                inner.add_edge(*device_idx, *owner_idx, ());
            }
        }

        Self { inner }
    }

    /// Returns a user-friendly description of the graph structure.
    pub(super) fn describe(&self) -> String {
        let mut buf: Vec<String> = Vec::new();
        for (node_idx, node) in self.inner.node_references() {
            buf.push(format!("[{}] {}", node_idx.index(), node.describe()));
            for edge in self.inner.edges(node_idx) {
                buf.push(format!(
                    "  -> [{}] {}",
                    edge.target().index(),
                    self.inner[edge.target()].describe()
                ));
            }
        }

        buf.join("\n")
    }

    /// Returns the nodes in creation order: partitions first, then verity
    /// devices, then filesystems.
    ///
    /// A graph from `build` is acyclic because every edge points to a node
    /// of a higher rank; the cycle error only guards graphs built otherwise.
    pub(super) fn creation_order(&self) -> Result<Vec<StorageNode>, StorageError> {
        let order = algo::toposort(&self.inner, None).map_err(|cycle| {
            StorageError::DeviceGraphCycle(self.inner[cycle.node_id()].describe())
        })?;

        let mut nodes: Vec<StorageNode> = order
            .into_iter()
            .map(|idx| self.inner[idx].clone())
            .collect();

        // Edges only go from lower to higher ranks, so a stable sort keeps
        // the order topological.
        nodes.sort_by_key(StorageNode::rank);
        Ok(nodes)
    }
}
