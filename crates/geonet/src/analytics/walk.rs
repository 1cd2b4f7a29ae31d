//! Uniform random walks.

use super::scores_from;
use crate::config::{AnalyticsConfig, WalkMeasure};
use crate::error::{GraphError, Result};
use crate::graph::{Network, NodeScores};
use crate::matrix::NeighborMatrix;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// One walk of `walk_level` hops from every node.
///
/// Each hop picks an outgoing entry uniformly; weights only matter for the
/// [`WalkMeasure::Weight`] tally. A walk stops early at a node with no
/// outgoing arcs. The arrival node of every hop is credited. Each start node
/// seeds its own generator from `walk_seed`, so results do not depend on the
/// thread count.
pub fn random_walk(network: &Network, config: &AnalyticsConfig) -> Result<NodeScores> {
    let matrix = network.neighbor_matrix()?;
    let n = matrix.len();
    debug!(
        "Random walk: {n} starts, {} hops, {:?}",
        config.walk_level, config.walk_measure
    );
    let totals = config.install(|| {
        (0..n)
            .into_par_iter()
            .fold(
                || vec![0.0; n],
                |mut acc, start| {
                    walk_from(&matrix, start, config, &mut acc);
                    acc
                },
            )
            .reduce(
                || vec![0.0; n],
                |mut a, b| {
                    a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                    a
                },
            )
    })?;
    if totals.iter().any(|v| !v.is_finite()) {
        return Err(GraphError::invalid("random walk accumulated a non-finite weight"));
    }
    Ok(scores_from(network, totals))
}

fn walk_from(matrix: &NeighborMatrix, start: usize, config: &AnalyticsConfig, acc: &mut [f64]) {
    let mut rng = StdRng::seed_from_u64(config.walk_seed.wrapping_add(start as u64));
    let mut current = start;
    for _ in 0..config.walk_level {
        let row = &matrix.rows()[current];
        if row.is_empty() {
            break;
        }
        let step = &row[rng.gen_range(0..row.len())];
        acc[step.index] += match config.walk_measure {
            WalkMeasure::Visits => 1.0,
            WalkMeasure::Weight => step.weight,
        };
        current = step.index;
    }
}
