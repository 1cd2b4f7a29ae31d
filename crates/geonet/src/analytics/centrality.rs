//! Degree, closeness, Katz, betweenness and clustering coefficient.

use super::scores_from;
use crate::config::AnalyticsConfig;
use crate::error::{GraphError, Result};
use crate::graph::{Direction, Network, NodeScores};
use crate::path::shortest_path_tree;
use log::debug;
use rayon::prelude::*;

/// Arc count per node.
///
/// On an undirected network every arc appears in both rows, so all three
/// directions report the same value.
pub fn degree(network: &Network, direction: Direction) -> Result<NodeScores> {
    let matrix = network.neighbor_matrix()?;
    let out = matrix.out_degrees();
    let values: Vec<f64> = if !matrix.is_directed() {
        out.iter().map(|&d| d as f64).collect()
    } else {
        let inc = matrix.in_degrees();
        match direction {
            Direction::Outgoing => out.iter().map(|&d| d as f64).collect(),
            Direction::Incoming => inc.iter().map(|&d| d as f64).collect(),
            Direction::Both => out.iter().zip(&inc).map(|(o, i)| (o + i) as f64).collect(),
        }
    };
    Ok(scores_from(network, values))
}

/// Closeness: the sum of `1 / distance` to every other reachable node.
///
/// A node that reaches nothing scores `-1`.
pub fn closeness(network: &Network, config: &AnalyticsConfig) -> Result<NodeScores> {
    let matrix = network.neighbor_matrix()?;
    debug!("Computing closeness for {} nodes", matrix.len());
    let values = config.install(|| {
        (0..matrix.len())
            .into_par_iter()
            .map(|source| -> Result<f64> {
                let tree = shortest_path_tree(&matrix, source)?;
                let mut reached = false;
                let mut sum = 0.0;
                for target in tree.reachable() {
                    reached = true;
                    let d = tree.distances[target];
                    if d > 0.0 {
                        sum += 1.0 / d;
                    }
                }
                Ok(if reached { sum } else { -1.0 })
            })
            .collect::<Result<Vec<f64>>>()
    })??;
    Ok(scores_from(network, values))
}

/// Katz centrality: the sum of `alpha ^ hops` over reachable nodes.
///
/// Hops are counted along the weighted shortest path, not over all walks.
pub fn katz(network: &Network, config: &AnalyticsConfig) -> Result<NodeScores> {
    let alpha = config.katz_alpha;
    if !alpha.is_finite() {
        return Err(GraphError::Config {
            message: format!("katz_alpha must be finite, got {alpha}"),
        });
    }
    let matrix = network.neighbor_matrix()?;
    let values = config.install(|| {
        (0..matrix.len())
            .into_par_iter()
            .map(|source| -> Result<f64> {
                let tree = shortest_path_tree(&matrix, source)?;
                Ok(tree
                    .reachable()
                    .map(|target| alpha.powi(tree.hops[target] as i32))
                    .sum())
            })
            .collect::<Result<Vec<f64>>>()
    })??;
    Ok(scores_from(network, values))
}

/// Betweenness: how many single-source shortest-path trees use the node as
/// an interior hop.
pub fn betweenness(network: &Network, config: &AnalyticsConfig) -> Result<NodeScores> {
    let matrix = network.neighbor_matrix()?;
    let n = matrix.len();
    debug!("Computing betweenness over {n} source trees");
    let counts = config.install(|| {
        (0..n)
            .into_par_iter()
            .try_fold(
                || vec![0.0; n],
                |mut acc, source| {
                    let tree = shortest_path_tree(&matrix, source)?;
                    for (i, interior) in tree.interior_nodes().into_iter().enumerate() {
                        if interior {
                            acc[i] += 1.0;
                        }
                    }
                    Ok::<_, GraphError>(acc)
                },
            )
            .try_reduce(
                || vec![0.0; n],
                |mut a, b| {
                    a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                    Ok(a)
                },
            )
    })??;
    Ok(scores_from(network, counts))
}

/// Clustering coefficient: the share of neighbor pairs that are themselves
/// connected. Nodes with fewer than two neighbors score 0.
pub fn clustering_coefficient(network: &Network, config: &AnalyticsConfig) -> Result<NodeScores> {
    let matrix = network.neighbor_matrix()?;
    let values = config.install(|| {
        (0..matrix.len())
            .into_par_iter()
            .map(|i| {
                let neighbors = matrix.undirected_neighbors(i);
                let k = neighbors.len();
                if k < 2 {
                    return 0.0;
                }
                let mut closed = 0usize;
                for (a, &u) in neighbors.iter().enumerate() {
                    for &v in &neighbors[a + 1..] {
                        if matrix.weight_between(u, v).is_some()
                            || matrix.weight_between(v, u).is_some()
                        {
                            closed += 1;
                        }
                    }
                }
                closed as f64 / (k * (k - 1) / 2) as f64
            })
            .collect::<Vec<f64>>()
    })?;
    Ok(scores_from(network, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyMap;

    /// Path a - b - c plus an isolated node d, unit weights.
    fn path_with_isolate() -> Network {
        let mut net = Network::planar();
        let ids: Vec<_> = (0..4).map(|_| net.add_node(PropertyMap::new()).unwrap()).collect();
        net.add_arc(ids[0], ids[1], PropertyMap::new()).unwrap();
        net.add_arc(ids[1], ids[2], PropertyMap::new()).unwrap();
        net.rebuild_matrix(None).unwrap();
        net
    }

    #[test]
    fn test_closeness_sentinel_for_isolated_node() {
        let net = path_with_isolate();
        let scores = closeness(&net, &AnalyticsConfig::default()).unwrap();
        assert_eq!(scores[&1], 1.0 + 0.5);
        assert_eq!(scores[&2], 2.0);
        assert_eq!(scores[&4], -1.0);
    }

    #[test]
    fn test_betweenness_counts_interior_hops() {
        let net = path_with_isolate();
        let scores = betweenness(&net, &AnalyticsConfig::default()).unwrap();
        // b is interior in the trees rooted at a and at c
        assert_eq!(scores[&2], 2.0);
        assert_eq!(scores[&1], 0.0);
        assert_eq!(scores[&4], 0.0);
    }

    #[test]
    fn test_katz_uses_hop_counts() {
        let net = path_with_isolate();
        let config = AnalyticsConfig {
            katz_alpha: 0.5,
            ..Default::default()
        };
        let scores = katz(&net, &config).unwrap();
        assert_eq!(scores[&1], 0.5 + 0.25);
        assert_eq!(scores[&4], 0.0);
    }

    #[test]
    fn test_katz_alpha_one_counts_reachable_nodes() {
        let net = path_with_isolate();
        let config = AnalyticsConfig {
            katz_alpha: 1.0,
            ..Default::default()
        };
        let scores = katz(&net, &config).unwrap();
        assert_eq!(scores[&1], 2.0);
        assert_eq!(scores[&2], 2.0);
        assert_eq!(scores[&4], 0.0);
    }

    #[test]
    fn test_katz_rejects_non_finite_alpha() {
        let net = path_with_isolate();
        let config = AnalyticsConfig {
            katz_alpha: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(katz(&net, &config), Err(GraphError::Config { .. })));
    }

    #[test]
    fn test_clustering_triangle_and_path() {
        let mut net = path_with_isolate();
        let scores = clustering_coefficient(&net, &AnalyticsConfig::default()).unwrap();
        assert_eq!(scores[&2], 0.0);
        assert_eq!(scores[&1], 0.0);

        net.add_arc(1, 3, PropertyMap::new()).unwrap();
        net.rebuild_matrix(None).unwrap();
        let scores = clustering_coefficient(&net, &AnalyticsConfig::default()).unwrap();
        assert_eq!(scores[&2], 1.0);
    }

    #[test]
    fn test_degree_directed() {
        let config = crate::config::NetworkConfig::planar().directed();
        let mut net = Network::new(config).unwrap();
        let a = net.add_node(PropertyMap::new()).unwrap();
        let b = net.add_node(PropertyMap::new()).unwrap();
        net.add_arc(a, b, PropertyMap::new()).unwrap();
        net.rebuild_matrix(None).unwrap();

        assert_eq!(degree(&net, Direction::Outgoing).unwrap()[&a], 1.0);
        assert_eq!(degree(&net, Direction::Incoming).unwrap()[&a], 0.0);
        assert_eq!(degree(&net, Direction::Both).unwrap()[&b], 1.0);
    }

    #[test]
    fn test_stale_matrix_is_an_error() {
        let mut net = path_with_isolate();
        net.add_node(PropertyMap::new()).unwrap();
        assert!(matches!(
            closeness(&net, &AnalyticsConfig::default()),
            Err(GraphError::StaleMatrix)
        ));
    }

    #[test]
    fn test_dedicated_pool_matches_global() {
        let net = path_with_isolate();
        let pooled = AnalyticsConfig {
            num_threads: Some(2),
            ..Default::default()
        };
        assert_eq!(
            betweenness(&net, &pooled).unwrap(),
            betweenness(&net, &AnalyticsConfig::default()).unwrap()
        );
    }
}
