//! Per-node centrality analytics.
//!
//! Every measure reads the network's current [`NeighborMatrix`](crate::NeighborMatrix)
//! and returns a typed [`NodeScores`] map keyed by node ID. Nothing is written
//! back onto nodes; use [`Network::annotate_nodes`] for that.
//!
//! Sweeps run one task per node on rayon. Betweenness folds per-worker partial
//! counts and reduces them at the end.

mod centrality;
mod walk;

pub use centrality::{betweenness, closeness, clustering_coefficient, degree, katz};
pub use walk::random_walk;

use crate::graph::{Network, NodeScores};

/// Pair per-index values with node IDs.
pub(crate) fn scores_from(network: &Network, values: Vec<f64>) -> NodeScores {
    network
        .nodes()
        .iter()
        .zip(values)
        .map(|(node, value)| (node.id, value))
        .collect()
}
