//! Dijkstra shortest paths over a [`NeighborMatrix`].
//!
//! Weight-agnostic: any non-negative weight field works. Unreachable nodes keep
//! an infinite distance and no predecessor.

use super::{unwind, IndexPath};
use crate::error::{GraphError, Result};
use crate::matrix::NeighborMatrix;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Min-heap entry ordered by cost, then by insertion sequence.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frontier {
    pub cost: f64,
    pub seq: u64,
    pub index: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for BinaryHeap: lowest cost, then earliest entry, pops first
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Single-source shortest-path tree.
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    /// Source node index
    pub source: usize,
    /// Distance per node, `f64::INFINITY` when unreachable
    pub distances: Vec<f64>,
    /// `(previous node, arc)` per node on its shortest path
    pub predecessors: Vec<Option<(usize, usize)>>,
    /// Number of arcs on each node's shortest path
    pub hops: Vec<usize>,
}

impl ShortestPathTree {
    /// Whether `target` is reachable from the source.
    pub fn is_reachable(&self, target: usize) -> bool {
        self.distances
            .get(target)
            .is_some_and(|d| d.is_finite())
    }

    /// Path from the source to `target`, `None` when unreachable.
    pub fn path_to(&self, target: usize) -> Option<IndexPath> {
        if !self.is_reachable(target) {
            return None;
        }
        Some(unwind(&self.predecessors, target, self.distances[target]))
    }

    /// Reachable nodes other than the source.
    pub fn reachable(&self) -> impl Iterator<Item = usize> + '_ {
        self.distances
            .iter()
            .enumerate()
            .filter(move |(i, d)| *i != self.source && d.is_finite())
            .map(|(i, _)| i)
    }

    /// Nodes that are the predecessor of at least one other node: the
    /// interior hops of the tree.
    pub fn interior_nodes(&self) -> Vec<bool> {
        let mut interior = vec![false; self.distances.len()];
        for (prev, _) in self.predecessors.iter().flatten() {
            if *prev != self.source {
                interior[*prev] = true;
            }
        }
        interior
    }
}

fn check_index(matrix: &NeighborMatrix, index: usize) -> Result<()> {
    if index >= matrix.len() {
        return Err(GraphError::IndexOutOfRange {
            kind: "node",
            index,
            len: matrix.len(),
        });
    }
    Ok(())
}

/// Full shortest-path tree from `source`.
pub fn shortest_path_tree(matrix: &NeighborMatrix, source: usize) -> Result<ShortestPathTree> {
    check_index(matrix, source)?;
    Ok(search(matrix, source, None))
}

/// Shortest path from `start` to `end`, `None` when unreachable.
pub fn dijkstra_path(matrix: &NeighborMatrix, start: usize, end: usize) -> Result<Option<IndexPath>> {
    check_index(matrix, start)?;
    check_index(matrix, end)?;
    let tree = search(matrix, start, Some(end));
    Ok(tree.path_to(end))
}

fn search(matrix: &NeighborMatrix, source: usize, target: Option<usize>) -> ShortestPathTree {
    let n = matrix.len();
    let mut distances = vec![f64::INFINITY; n];
    let mut predecessors = vec![None; n];
    let mut hops = vec![0usize; n];
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;

    distances[source] = 0.0;
    heap.push(Frontier {
        cost: 0.0,
        seq,
        index: source,
    });

    while let Some(Frontier { cost, index, .. }) = heap.pop() {
        if settled[index] || cost > distances[index] {
            continue;
        }
        settled[index] = true;
        if target == Some(index) {
            break;
        }

        for neighbor in &matrix.rows()[index] {
            let next = neighbor.index;
            if settled[next] {
                continue;
            }
            let candidate = cost + neighbor.weight;
            if candidate < distances[next] {
                distances[next] = candidate;
                predecessors[next] = Some((index, neighbor.arc));
                hops[next] = hops[index] + 1;
                seq += 1;
                heap.push(Frontier {
                    cost: candidate,
                    seq,
                    index: next,
                });
            }
        }
    }

    ShortestPathTree {
        source,
        distances,
        predecessors,
        hops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Neighbor;

    fn line(n: usize) -> NeighborMatrix {
        let mut rows = vec![Vec::new(); n];
        for i in 0..n - 1 {
            rows[i].push(Neighbor {
                index: i + 1,
                weight: 1.0,
                arc: i,
            });
            rows[i + 1].push(Neighbor {
                index: i,
                weight: 1.0,
                arc: i,
            });
        }
        NeighborMatrix::from_rows(rows, None, false)
    }

    #[test]
    fn test_tree_distances_and_hops() {
        let tree = shortest_path_tree(&line(4), 0).unwrap();
        assert_eq!(tree.distances, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(tree.hops, vec![0, 1, 2, 3]);
        assert_eq!(tree.reachable().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(tree.interior_nodes(), vec![false, true, true, false]);
    }

    #[test]
    fn test_unreachable_is_infinite() {
        let m = NeighborMatrix::from_rows(vec![Vec::new(), Vec::new()], None, false);
        let tree = shortest_path_tree(&m, 0).unwrap();
        assert!(tree.distances[1].is_infinite());
        assert!(tree.path_to(1).is_none());
        assert!(dijkstra_path(&m, 0, 1).unwrap().is_none());
    }

    #[test]
    fn test_path_to_self() {
        let path = dijkstra_path(&line(3), 1, 1).unwrap().unwrap();
        assert_eq!(path.nodes, vec![1]);
        assert!(path.arcs.is_empty());
        assert_eq!(path.cost, 0.0);
    }

    #[test]
    fn test_out_of_range_source() {
        assert!(matches!(
            shortest_path_tree(&line(2), 5),
            Err(GraphError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_prefers_cheaper_longer_route() {
        let n = |index, weight, arc| Neighbor { index, weight, arc };
        let m = NeighborMatrix::from_rows(
            vec![
                vec![n(1, 1.0, 0), n(2, 10.0, 2)],
                vec![n(0, 1.0, 0), n(2, 1.0, 1)],
                vec![n(1, 1.0, 1), n(0, 10.0, 2)],
            ],
            None,
            false,
        );
        let path = dijkstra_path(&m, 0, 2).unwrap().unwrap();
        assert_eq!(path.nodes, vec![0, 1, 2]);
        assert_eq!(path.arcs, vec![0, 1]);
        assert_eq!(path.cost, 2.0);
    }
}
