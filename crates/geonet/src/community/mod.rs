//! Community detection.
//!
//! Three detectors share one [`Partition`] type and report a
//! [`CommunityResult`]:
//!
//! - [`divisive`]: repeatedly removes the most-loaded arc (Girvan-Newman style)
//! - [`louvain`]: agglomerative merging under reciprocal-weight affinity
//! - [`spatial_growth`]: flood-fill bounded by weight, radius and modularity gain
//!
//! [`modularity`] scores any partition against direct weights.

mod divisive;
mod growth;
mod louvain;
mod modularity;

pub use divisive::divisive;
pub use growth::spatial_growth;
pub use louvain::louvain;
pub use modularity::{modularity, modularity_by, Strengths, ZERO_WEIGHT_MODULARITY};

use crate::error::Result;
use crate::graph::{Network, NodeId};
use crate::matrix::NeighborMatrix;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Community label per node arena index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    assignment: Vec<usize>,
}

impl Partition {
    /// Wrap raw labels; they need not be contiguous.
    pub fn from_assignment(assignment: Vec<usize>) -> Self {
        Self { assignment }
    }

    /// Every node in its own community.
    pub fn singletons(n: usize) -> Self {
        Self::from_assignment((0..n).collect())
    }

    /// All nodes in one community.
    pub fn whole(n: usize) -> Self {
        Self::from_assignment(vec![0; n])
    }

    /// Label of the node at `index`.
    pub fn community_of(&self, index: usize) -> Option<usize> {
        self.assignment.get(index).copied()
    }

    /// Labels in node index order.
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    /// Number of labelled nodes.
    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    /// Whether the partition labels no nodes.
    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }

    /// Number of distinct labels.
    pub fn community_count(&self) -> usize {
        let mut labels = self.assignment.clone();
        labels.sort_unstable();
        labels.dedup();
        labels.len()
    }

    /// Relabel contiguously from 0 in order of first appearance.
    pub fn renumbered(&self) -> Self {
        let mut map = HashMap::new();
        let assignment = self
            .assignment
            .iter()
            .map(|&c| {
                let next = map.len();
                *map.entry(c).or_insert(next)
            })
            .collect();
        Self { assignment }
    }

    /// Member indices grouped per community, in renumbered order.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let renumbered = self.renumbered();
        let mut groups = vec![Vec::new(); renumbered.community_count()];
        for (index, &c) in renumbered.assignment.iter().enumerate() {
            groups[c].push(index);
        }
        groups
    }
}

/// One detected community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCluster {
    /// Contiguous community ID
    pub id: usize,
    /// Member node IDs in arena order
    pub members: Vec<NodeId>,
}

/// Outcome of a detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityResult {
    /// Communities, numbered from 0
    pub clusters: Vec<NodeCluster>,
    /// Modularity of the partition under the detector's weight convention
    pub modularity: f64,
}

impl CommunityResult {
    /// Resolve a partition's indices to node IDs.
    pub fn from_partition(network: &Network, partition: &Partition, modularity: f64) -> Self {
        let clusters = partition
            .groups()
            .into_iter()
            .enumerate()
            .map(|(id, members)| NodeCluster {
                id,
                members: members.into_iter().map(|i| network.nodes()[i].id).collect(),
            })
            .collect();
        Self { clusters, modularity }
    }

    /// Community ID per node ID.
    pub fn assignment(&self) -> HashMap<NodeId, usize> {
        self.clusters
            .iter()
            .flat_map(|c| c.members.iter().map(move |&m| (m, c.id)))
            .collect()
    }

    /// Number of communities.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether no community was found.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

impl Network {
    /// Write each node's community ID under `key`.
    pub fn annotate_clusters(&mut self, key: &str, result: &CommunityResult) -> Result<()> {
        for cluster in &result.clusters {
            for &member in &cluster.members {
                self.set_node_property(member, key, cluster.id)?;
            }
        }
        Ok(())
    }
}

/// Weakly connected components, labelled in order of their lowest index.
pub fn connected_components(matrix: &NeighborMatrix) -> Partition {
    components_of(&symmetric_adjacency(matrix.rows()))
}

/// Neighbor lists with every entry mirrored.
pub(crate) fn symmetric_adjacency(rows: &[Vec<crate::matrix::Neighbor>]) -> Vec<Vec<usize>> {
    let mut adjacency = vec![Vec::new(); rows.len()];
    for (i, row) in rows.iter().enumerate() {
        for n in row {
            adjacency[i].push(n.index);
            adjacency[n.index].push(i);
        }
    }
    adjacency
}

pub(crate) fn components_of(adjacency: &[Vec<usize>]) -> Partition {
    const UNSEEN: usize = usize::MAX;
    let mut labels = vec![UNSEEN; adjacency.len()];
    let mut next = 0;
    let mut queue = VecDeque::new();
    for seed in 0..adjacency.len() {
        if labels[seed] != UNSEEN {
            continue;
        }
        labels[seed] = next;
        queue.push_back(seed);
        while let Some(u) = queue.pop_front() {
            for &v in &adjacency[u] {
                if labels[v] == UNSEEN {
                    labels[v] = next;
                    queue.push_back(v);
                }
            }
        }
        next += 1;
    }
    Partition::from_assignment(labels)
}
