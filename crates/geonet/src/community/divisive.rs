//! Divisive detection by repeated removal of the most-loaded arc.

use super::{components_of, modularity, symmetric_adjacency, CommunityResult};
use crate::config::CommunityConfig;
use crate::error::{GraphError, Result};
use crate::graph::Network;
use crate::matrix::NeighborMatrix;
use crate::path::{shortest_path_tree, ShortestPathTree};
use log::{debug, trace};
use rayon::prelude::*;

/// Split the network until `max_components` components exist or no arc is
/// left, returning the partition with the highest modularity seen.
///
/// Each round builds a shortest-path tree from every node, credits every tree
/// arc with the number of nodes below it, and drops the most-loaded arc from a
/// working copy of the matrix (ties go to the lowest arc index). The network's
/// published matrix is never modified. Modularity is always scored against the
/// full matrix.
pub fn divisive(network: &Network, config: &CommunityConfig) -> Result<CommunityResult> {
    if config.max_components == 0 {
        return Err(GraphError::Config {
            message: "max_components must be at least 1".to_string(),
        });
    }
    let matrix = network.neighbor_matrix()?;
    let mut working = matrix.rows().to_vec();

    let mut partition = components_of(&symmetric_adjacency(&working));
    let mut best = (partition.clone(), modularity(&matrix, &partition)?);
    let mut rounds = 0usize;

    while partition.community_count() < config.max_components
        && working.iter().any(|row| !row.is_empty())
    {
        let view = NeighborMatrix::from_rows(working.clone(), None, matrix.is_directed());
        let load = arc_loads(&view)?;
        let Some(victim) = most_loaded(&load) else {
            break;
        };
        for row in working.iter_mut() {
            row.retain(|n| n.arc != victim);
        }
        rounds += 1;

        partition = components_of(&symmetric_adjacency(&working));
        let q = modularity(&matrix, &partition)?;
        trace!(
            "Removed arc {victim}: {} components, Q={q:.4}",
            partition.community_count()
        );
        if q > best.1 {
            best = (partition.clone(), q);
        }
    }

    debug!(
        "Divisive detection: {rounds} arcs removed, best Q={:.4} with {} communities",
        best.1,
        best.0.community_count()
    );
    Ok(CommunityResult::from_partition(network, &best.0, best.1))
}

/// Shortest-path traversal count per arc index over all source trees.
fn arc_loads(view: &NeighborMatrix) -> Result<Vec<f64>> {
    let slots = view
        .rows()
        .iter()
        .flatten()
        .map(|n| n.arc + 1)
        .max()
        .unwrap_or(0);
    (0..view.len())
        .into_par_iter()
        .try_fold(
            || vec![0.0; slots],
            |mut acc, source| {
                let tree = shortest_path_tree(view, source)?;
                credit_tree(&tree, &mut acc);
                Ok::<_, GraphError>(acc)
            },
        )
        .try_reduce(
            || vec![0.0; slots],
            |mut a, b| {
                a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                Ok(a)
            },
        )
}

/// Add each tree arc's subtree size to its load.
fn credit_tree(tree: &ShortestPathTree, load: &mut [f64]) {
    let mut order: Vec<usize> = tree.reachable().collect();
    // Deepest first so children are folded into parents before parents are read
    order.sort_by(|&a, &b| {
        tree.distances[b]
            .total_cmp(&tree.distances[a])
            .then(tree.hops[b].cmp(&tree.hops[a]))
    });
    let mut below = vec![1.0; tree.distances.len()];
    for v in order {
        if let Some((parent, arc)) = tree.predecessors[v] {
            load[arc] += below[v];
            below[parent] += below[v];
        }
    }
}

fn most_loaded(load: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (arc, &value) in load.iter().enumerate() {
        if value > 0.0 && best.map_or(true, |(_, b)| value > b) {
            best = Some((arc, value));
        }
    }
    best.map(|(arc, _)| arc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyMap;

    /// Two triangles joined by a single bridge 2-3.
    fn barbell() -> Network {
        let mut net = Network::planar();
        let ids: Vec<_> = (0..6).map(|_| net.add_node(PropertyMap::new()).unwrap()).collect();
        for (a, b) in [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)] {
            net.add_arc(ids[a], ids[b], PropertyMap::new()).unwrap();
        }
        net.rebuild_matrix(None).unwrap();
        net
    }

    #[test]
    fn test_bridge_is_removed_first() {
        let net = barbell();
        let result = divisive(&net, &CommunityConfig::default()).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.clusters[0].members, vec![1, 2, 3]);
        assert_eq!(result.clusters[1].members, vec![4, 5, 6]);
        assert!(result.modularity > 0.3);
    }

    #[test]
    fn test_single_component_cap_keeps_network_whole() {
        let net = barbell();
        let config = CommunityConfig {
            max_components: 1,
            ..Default::default()
        };
        let result = divisive(&net, &config).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.modularity.abs() < 1e-12);
    }

    #[test]
    fn test_published_matrix_is_untouched() {
        let net = barbell();
        let before = net.neighbor_matrix().unwrap().total_weight();
        divisive(&net, &CommunityConfig::default()).unwrap();
        assert_eq!(net.neighbor_matrix().unwrap().total_weight(), before);
    }

    #[test]
    fn test_bridge_carries_most_load() {
        let net = barbell();
        let m = net.neighbor_matrix().unwrap();
        let load = arc_loads(&m).unwrap();
        assert_eq!(most_loaded(&load), Some(6));
        // 3 nodes on each side cross it in both directions
        assert_eq!(load[6], 18.0);
    }
}
