//! Spatially constrained community growth.

use super::modularity::{modularity, Strengths, ZERO_WEIGHT_MODULARITY};
use super::{CommunityResult, Partition};
use crate::config::CommunityConfig;
use crate::error::{GraphError, Result};
use crate::geometry::{self, Coordinate};
use crate::graph::Network;
use crate::matrix::Neighbor;
use log::debug;
use std::collections::{HashSet, VecDeque};

/// Running state of the cluster being grown.
struct Growing {
    id: usize,
    centroid: Option<Coordinate>,
    located: usize,
    k_out: f64,
    k_in: f64,
}

impl Growing {
    fn absorb(&mut self, at: Option<Coordinate>, k_out: f64, k_in: f64) {
        self.k_out += k_out;
        self.k_in += k_in;
        let Some(at) = at else {
            return;
        };
        self.located += 1;
        let n = self.located as f64;
        self.centroid = Some(match self.centroid {
            None => at,
            Some(c) => Coordinate {
                x: c.x + (at.x - c.x) / n,
                y: c.y + (at.y - c.y) / n,
                z: match (c.z, at.z) {
                    (Some(cz), Some(az)) => Some(cz + (az - cz) / n),
                    _ => None,
                },
            },
        });
    }
}

/// Flood-fill clusters from each unassigned seed in index order.
///
/// A neighbor reached from the cluster joins only if the arc weight is at most
/// `weight_threshold`, the neighbor lies within `radius` of the cluster's
/// running centroid, and joining raises modularity (direct weights). A node
/// rejected by a cluster is never reconsidered by that cluster, even after the
/// centroid moves. Nodes without coordinates cannot join a cluster and end up
/// alone.
pub fn spatial_growth(network: &Network, config: &CommunityConfig) -> Result<CommunityResult> {
    let weight_threshold = config.weight_threshold.unwrap_or(f64::INFINITY);
    let radius = config.radius.unwrap_or(f64::INFINITY);
    if weight_threshold.is_nan() || !(radius >= 0.0) {
        return Err(GraphError::Config {
            message: "weight_threshold and radius must be numbers, radius >= 0".to_string(),
        });
    }
    let matrix = network.neighbor_matrix()?;
    let n = matrix.len();
    let strengths = Strengths::of(&matrix, |w| w);
    if strengths.total == 0.0 {
        return Ok(CommunityResult::from_partition(
            network,
            &Partition::singletons(n),
            ZERO_WEIGHT_MODULARITY,
        ));
    }
    let total = strengths.total;
    let system = network.config().coordinate_system;
    let reverse = reverse_rows(matrix.rows());

    const UNASSIGNED: usize = usize::MAX;
    let mut label = vec![UNASSIGNED; n];
    let mut next = 0;

    for seed in 0..n {
        if label[seed] != UNASSIGNED {
            continue;
        }
        let mut cluster = Growing {
            id: next,
            centroid: None,
            located: 0,
            k_out: 0.0,
            k_in: 0.0,
        };
        next += 1;
        label[seed] = cluster.id;
        cluster.absorb(
            network.nodes()[seed].coordinate,
            strengths.out[seed],
            strengths.inc[seed],
        );

        let mut rejected = HashSet::new();
        let mut queue = VecDeque::from([seed]);
        while let Some(u) = queue.pop_front() {
            for step in &matrix.rows()[u] {
                let v = step.index;
                if label[v] != UNASSIGNED || rejected.contains(&v) {
                    continue;
                }
                let at = network.nodes()[v].coordinate;
                let within = match (at, cluster.centroid) {
                    (Some(at), Some(c)) => geometry::distance(system, &c, &at) <= radius,
                    _ => false,
                };
                let a_cv: f64 = reverse[v]
                    .iter()
                    .filter(|e| label[e.index] == cluster.id)
                    .map(|e| e.weight)
                    .sum();
                let a_vc: f64 = matrix.rows()[v]
                    .iter()
                    .filter(|e| label[e.index] == cluster.id)
                    .map(|e| e.weight)
                    .sum();
                let gain = (a_cv + a_vc) / total
                    - (cluster.k_out * strengths.inc[v] + strengths.out[v] * cluster.k_in)
                        / (total * total);

                if step.weight <= weight_threshold && within && gain > 0.0 {
                    label[v] = cluster.id;
                    cluster.absorb(at, strengths.out[v], strengths.inc[v]);
                    queue.push_back(v);
                } else {
                    rejected.insert(v);
                }
            }
        }
    }

    let partition = Partition::from_assignment(label);
    let q = modularity(&matrix, &partition)?;
    debug!(
        "Spatial growth: {} clusters, Q={q:.4}",
        partition.community_count()
    );
    Ok(CommunityResult::from_partition(network, &partition, q))
}

/// Incoming entries per node.
fn reverse_rows(rows: &[Vec<Neighbor>]) -> Vec<Vec<Neighbor>> {
    let mut reverse = vec![Vec::new(); rows.len()];
    for (i, row) in rows.iter().enumerate() {
        for n in row {
            reverse[n.index].push(Neighbor {
                index: i,
                weight: n.weight,
                arc: n.arc,
            });
        }
    }
    reverse
}
