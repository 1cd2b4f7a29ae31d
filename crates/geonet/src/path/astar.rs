//! A* and greedy A* over located networks.
//!
//! Both variants share three observable policies:
//!
//! - the search ends as soon as the goal is *admitted* to the open set, not when
//!   it is popped, so the returned path is not guaranteed optimal;
//! - a neighbor is only admitted while its cost-so-far stays below
//!   [`PRUNING_FACTOR`] times the straight-line start/goal distance;
//! - greedy mode caps the open set at [`GREEDY_OPEN_LIMIT`] entries, closing the
//!   oldest admissions first before every expansion.

use super::dijkstra::Frontier;
use super::{unwind, IndexPath};
use crate::error::{GraphError, Result};
use crate::geometry::{self, Coordinate};
use crate::graph::Network;
use crate::matrix::NeighborMatrix;
use log::trace;
use std::collections::{BinaryHeap, VecDeque};

/// Multiple of the straight-line distance beyond which candidates are pruned.
pub const PRUNING_FACTOR: f64 = 10.0;

/// Maximum size of the open set in greedy mode.
pub const GREEDY_OPEN_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unseen,
    Open,
    Closed,
}

/// A* search from `start` to `goal`; `greedy` bounds the open set.
///
/// # Errors
///
/// Returns [`GraphError::MissingCoordinate`] when a node touched by the search
/// has no position, and [`GraphError::IndexOutOfRange`] for invalid indices.
pub fn astar_path(
    network: &Network,
    matrix: &NeighborMatrix,
    start: usize,
    goal: usize,
    greedy: bool,
) -> Result<Option<IndexPath>> {
    for index in [start, goal] {
        if index >= matrix.len() {
            return Err(GraphError::IndexOutOfRange {
                kind: "node",
                index,
                len: matrix.len(),
            });
        }
    }
    let system = network.config().coordinate_system;
    let goal_at = network.coordinate(goal)?;
    let start_at = network.coordinate(start)?;
    if start == goal {
        return Ok(Some(IndexPath {
            nodes: vec![start],
            arcs: Vec::new(),
            cost: 0.0,
        }));
    }

    let radius = PRUNING_FACTOR * geometry::distance(system, &start_at, &goal_at);
    let heuristic = |index: usize| -> Result<f64> {
        let at: Coordinate = network.coordinate(index)?;
        Ok(geometry::distance(system, &at, &goal_at))
    };

    let n = matrix.len();
    let mut state = vec![State::Unseen; n];
    let mut cost = vec![f64::INFINITY; n];
    let mut predecessors: Vec<Option<(usize, usize)>> = vec![None; n];
    let mut heap = BinaryHeap::new();
    let mut admitted = VecDeque::new();
    let mut open_len = 0usize;
    let mut seq = 0u64;
    let mut evicted = 0usize;

    state[start] = State::Open;
    cost[start] = 0.0;
    open_len += 1;
    admitted.push_back(start);
    heap.push(Frontier {
        cost: heuristic(start)?,
        seq,
        index: start,
    });

    loop {
        if greedy {
            while open_len > GREEDY_OPEN_LIMIT {
                let Some(oldest) = admitted.pop_front() else {
                    break;
                };
                if state[oldest] == State::Open {
                    state[oldest] = State::Closed;
                    open_len -= 1;
                    evicted += 1;
                }
            }
        }

        let Some(current) = pop_open(&mut heap, &state, &cost, &heuristic)? else {
            trace!("A* exhausted open set without admitting goal ({evicted} evicted)");
            return Ok(None);
        };
        state[current] = State::Closed;
        open_len -= 1;

        for neighbor in &matrix.rows()[current] {
            let next = neighbor.index;
            if state[next] == State::Closed {
                continue;
            }
            let candidate = cost[current] + neighbor.weight;
            if !(candidate < radius) {
                continue;
            }
            match state[next] {
                State::Open => {
                    if candidate < cost[next] {
                        cost[next] = candidate;
                        predecessors[next] = Some((current, neighbor.arc));
                        seq += 1;
                        heap.push(Frontier {
                            cost: candidate + heuristic(next)?,
                            seq,
                            index: next,
                        });
                    }
                }
                State::Unseen => {
                    cost[next] = candidate;
                    predecessors[next] = Some((current, neighbor.arc));
                    if next == goal {
                        trace!("A* admitted goal {goal} at cost {candidate} ({evicted} evicted)");
                        return Ok(Some(unwind(&predecessors, goal, candidate)));
                    }
                    state[next] = State::Open;
                    open_len += 1;
                    admitted.push_back(next);
                    seq += 1;
                    heap.push(Frontier {
                        cost: candidate + heuristic(next)?,
                        seq,
                        index: next,
                    });
                }
                State::Closed => {}
            }
        }
    }
}

/// Pop the best still-open entry, discarding stale heap entries.
fn pop_open(
    heap: &mut BinaryHeap<Frontier>,
    state: &[State],
    cost: &[f64],
    heuristic: &impl Fn(usize) -> Result<f64>,
) -> Result<Option<usize>> {
    while let Some(entry) = heap.pop() {
        if state[entry.index] != State::Open {
            continue;
        }
        if entry.cost > cost[entry.index] + heuristic(entry.index)? {
            continue;
        }
        return Ok(Some(entry.index));
    }
    Ok(None)
}
