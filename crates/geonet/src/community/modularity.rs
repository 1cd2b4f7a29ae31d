//! Global modularity.

use super::Partition;
use crate::error::{GraphError, Result};
use crate::matrix::NeighborMatrix;
use std::collections::HashMap;

/// Modularity reported when the network carries no weight at all.
pub const ZERO_WEIGHT_MODULARITY: f64 = -1.0;

/// Per-node outgoing/incoming strength under an affinity, plus their total.
#[derive(Debug, Clone, PartialEq)]
pub struct Strengths {
    /// Outgoing strength per node
    pub out: Vec<f64>,
    /// Incoming strength per node
    pub inc: Vec<f64>,
    /// Sum over all matrix entries
    pub total: f64,
}

impl Strengths {
    /// Strengths of `matrix` with each weight mapped through `affinity`.
    pub fn of(matrix: &NeighborMatrix, affinity: impl Fn(f64) -> f64) -> Self {
        let (out, inc) = matrix.strengths_by(affinity);
        let total = out.iter().sum();
        Self { out, inc, total }
    }
}

/// Affinity of the agglomerative detector: the reciprocal weight.
pub(crate) fn reciprocal(weight: f64) -> f64 {
    if weight > 0.0 {
        1.0 / weight
    } else {
        0.0
    }
}

/// Modularity of `partition` over direct weights.
///
/// Undirected matrices hold every edge in both rows, so this is the usual
/// `Q = 1/2m * sum(A_ij - k_i k_j / 2m)` over same-community pairs; directed
/// matrices use out-strength times in-strength. Returns `-1` when the total
/// weight is zero.
pub fn modularity(matrix: &NeighborMatrix, partition: &Partition) -> Result<f64> {
    modularity_by(matrix, partition, |w| w)
}

/// Modularity of `partition` with every weight mapped through `affinity`.
pub fn modularity_by(
    matrix: &NeighborMatrix,
    partition: &Partition,
    affinity: impl Fn(f64) -> f64,
) -> Result<f64> {
    if partition.len() != matrix.len() {
        return Err(GraphError::invalid(format!(
            "partition labels {} nodes but the matrix has {}",
            partition.len(),
            matrix.len()
        )));
    }
    let labels = partition.assignment();
    let mut internal = 0.0;
    let mut out_by: HashMap<usize, f64> = HashMap::new();
    let mut in_by: HashMap<usize, f64> = HashMap::new();
    let mut total = 0.0;
    for (i, row) in matrix.rows().iter().enumerate() {
        for n in row {
            let a = affinity(n.weight);
            total += a;
            *out_by.entry(labels[i]).or_default() += a;
            *in_by.entry(labels[n.index]).or_default() += a;
            if labels[i] == labels[n.index] {
                internal += a;
            }
        }
    }
    if total == 0.0 {
        return Ok(ZERO_WEIGHT_MODULARITY);
    }
    let expected: f64 = out_by
        .iter()
        .map(|(c, k_out)| k_out * in_by.get(c).copied().unwrap_or(0.0))
        .sum();
    Ok(internal / total - expected / (total * total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Neighbor;

    /// Two disjoint undirected edges 0-1 and 2-3.
    fn two_edges() -> NeighborMatrix {
        let n = |index, arc| Neighbor {
            index,
            weight: 1.0,
            arc,
        };
        NeighborMatrix::from_rows(
            vec![vec![n(1, 0)], vec![n(0, 0)], vec![n(3, 1)], vec![n(2, 1)]],
            None,
            false,
        )
    }

    #[test]
    fn test_natural_split_of_two_edges() {
        let q = modularity(&two_edges(), &Partition::from_assignment(vec![0, 0, 1, 1])).unwrap();
        assert!((q - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_whole_partition_is_zero() {
        let q = modularity(&two_edges(), &Partition::whole(4)).unwrap();
        assert!(q.abs() < 1e-12);
    }

    #[test]
    fn test_singletons_are_negative() {
        let q = modularity(&two_edges(), &Partition::singletons(4)).unwrap();
        assert!((q + 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weight_sentinel() {
        let m = NeighborMatrix::from_rows(vec![Vec::new(), Vec::new()], None, false);
        assert_eq!(modularity(&m, &Partition::whole(2)).unwrap(), ZERO_WEIGHT_MODULARITY);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(modularity(&two_edges(), &Partition::whole(3)).is_err());
    }

    #[test]
    fn test_reciprocal_ignores_non_positive() {
        assert_eq!(reciprocal(4.0), 0.25);
        assert_eq!(reciprocal(0.0), 0.0);
    }
}
