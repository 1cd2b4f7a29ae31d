//! Agglomerative (Louvain-style) detection.
//!
//! Weights enter as affinity `1 / weight`: short, cheap arcs bind communities
//! more tightly. Arcs with non-positive weight carry no affinity.

use super::modularity::{modularity_by, reciprocal, Strengths, ZERO_WEIGHT_MODULARITY};
use super::{CommunityResult, Partition};
use crate::config::CommunityConfig;
use crate::error::Result;
use crate::graph::Network;
use crate::matrix::NeighborMatrix;
use log::{debug, trace};
use std::collections::BTreeMap;

/// Community-level adjacency kept up to date as communities merge.
struct Communities {
    label: Vec<usize>,
    members: Vec<Vec<usize>>,
    out: Vec<BTreeMap<usize, f64>>,
    inc: Vec<BTreeMap<usize, f64>>,
    k_out: Vec<f64>,
    k_in: Vec<f64>,
    total: f64,
}

impl Communities {
    fn singletons(matrix: &NeighborMatrix) -> Self {
        let n = matrix.len();
        let strengths = Strengths::of(matrix, reciprocal);
        let mut out = vec![BTreeMap::new(); n];
        let mut inc = vec![BTreeMap::new(); n];
        for (i, row) in matrix.rows().iter().enumerate() {
            for neighbor in row {
                let a = reciprocal(neighbor.weight);
                if a > 0.0 {
                    *out[i].entry(neighbor.index).or_insert(0.0) += a;
                    *inc[neighbor.index].entry(i).or_insert(0.0) += a;
                }
            }
        }
        Self {
            label: (0..n).collect(),
            members: (0..n).map(|i| vec![i]).collect(),
            out,
            inc,
            k_out: strengths.out,
            k_in: strengths.inc,
            total: strengths.total,
        }
    }

    /// Modularity change of merging `c` and `d`.
    fn gain(&self, c: usize, d: usize) -> f64 {
        let t = self.total;
        let between = self.out[c].get(&d).copied().unwrap_or(0.0)
            + self.out[d].get(&c).copied().unwrap_or(0.0);
        between / t - (self.k_out[c] * self.k_in[d] + self.k_out[d] * self.k_in[c]) / (t * t)
    }

    /// Adjacent communities, ascending.
    fn adjacent(&self, c: usize) -> Vec<usize> {
        let mut ds: Vec<usize> = self.out[c]
            .keys()
            .chain(self.inc[c].keys())
            .copied()
            .filter(|&d| d != c)
            .collect();
        ds.sort_unstable();
        ds.dedup();
        ds
    }

    /// Fold community `c` into `d`.
    fn merge(&mut self, c: usize, d: usize) {
        let out_c = std::mem::take(&mut self.out[c]);
        let in_c = std::mem::take(&mut self.inc[c]);

        for (x, w) in out_c {
            if x == c {
                *self.out[d].entry(d).or_insert(0.0) += w;
                *self.inc[d].entry(d).or_insert(0.0) += w;
                continue;
            }
            self.inc[x].remove(&c);
            *self.inc[x].entry(d).or_insert(0.0) += w;
            *self.out[d].entry(x).or_insert(0.0) += w;
        }
        for (y, w) in in_c {
            if y == c {
                continue;
            }
            self.out[y].remove(&c);
            *self.out[y].entry(d).or_insert(0.0) += w;
            *self.inc[d].entry(y).or_insert(0.0) += w;
        }
        self.k_out[d] += self.k_out[c];
        self.k_in[d] += self.k_in[c];
        self.k_out[c] = 0.0;
        self.k_in[c] = 0.0;

        let moved = std::mem::take(&mut self.members[c]);
        for &i in &moved {
            self.label[i] = d;
        }
        self.members[d].extend(moved);
    }

    /// One sweep over communities in index order. Returns the number of merges.
    fn pass(&mut self) -> usize {
        let n = self.members.len();
        let mut visited = vec![false; n];
        let mut merges = 0;
        for c in 0..n {
            if visited[c] || self.members[c].is_empty() {
                continue;
            }
            let mut best: Option<(usize, f64)> = None;
            for d in self.adjacent(c) {
                let gain = self.gain(c, d);
                if gain > 0.0 && best.map_or(true, |(_, g)| gain > g) {
                    best = Some((d, gain));
                }
            }
            if let Some((d, gain)) = best {
                trace!("Merging community {c} into {d} (dQ={gain:.6})");
                self.merge(c, d);
                visited[c] = true;
                visited[d] = true;
                merges += 1;
            }
        }
        merges
    }
}

/// Greedy agglomeration for `louvain_passes` passes.
///
/// Every node starts alone. In each pass, each community not yet touched in
/// that pass merges into the neighboring community with the largest positive
/// modularity gain; both are then marked touched. Communities are renumbered
/// contiguously at the end. The reported modularity uses the same reciprocal
/// affinity. A network with no affinity at all stays as singletons with
/// modularity `-1`.
pub fn louvain(network: &Network, config: &CommunityConfig) -> Result<CommunityResult> {
    let matrix = network.neighbor_matrix()?;
    let mut communities = Communities::singletons(&matrix);
    if communities.total <= 0.0 {
        let partition = Partition::singletons(matrix.len());
        return Ok(CommunityResult::from_partition(
            network,
            &partition,
            ZERO_WEIGHT_MODULARITY,
        ));
    }

    for pass in 0..config.louvain_passes {
        let merges = communities.pass();
        debug!("Louvain pass {}: {merges} merges", pass + 1);
        if merges == 0 {
            break;
        }
    }

    let partition = Partition::from_assignment(communities.label).renumbered();
    let q = modularity_by(&matrix, &partition, reciprocal)?;
    Ok(CommunityResult::from_partition(network, &partition, q))
}
