//! Shortest-path search and route construction.
//!
//! - [`dijkstra`]: generic single-source search over the neighbor matrix
//! - [`astar`]: A* and greedy A* with a straight-line heuristic
//! - [`stitch`]: routing between arbitrary coordinates snapped onto arcs

pub mod astar;
pub mod dijkstra;
pub mod stitch;

pub use crate::config::SearchAlgorithm;
pub use dijkstra::{shortest_path_tree, ShortestPathTree};

use crate::error::Result;
use crate::geometry::Coordinate;
use crate::graph::{Network, NodeId, SYNTHETIC_NODE_ID};
use crate::matrix::NeighborMatrix;
use log::trace;
use serde::{Deserialize, Serialize};

/// A node-to-node path found by a search, in arena indices.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexPath {
    /// Visited node indices, start first
    pub nodes: Vec<usize>,
    /// Traversed arc indices, one fewer than nodes
    pub arcs: Vec<usize>,
    /// Accumulated weight
    pub cost: f64,
}

/// One stop on a route: a real node or a synthetic snapped point (ID 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Node ID, [`SYNTHETIC_NODE_ID`] for snapped points
    pub id: NodeId,
    /// Arena index, `None` for snapped points
    pub index: Option<usize>,
    /// Position, when known
    pub coordinate: Option<Coordinate>,
}

impl Waypoint {
    /// A synthetic waypoint at a snapped position.
    pub fn synthetic(at: Coordinate) -> Self {
        Self {
            id: SYNTHETIC_NODE_ID,
            index: None,
            coordinate: Some(at),
        }
    }

    /// Whether this waypoint was synthesized by route stitching.
    pub fn is_synthetic(&self) -> bool {
        self.index.is_none()
    }
}

/// Result of a routing query.
///
/// A missing route is a value: `exists == false`, empty lists, zero impedance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Ordered stops
    pub waypoints: Vec<Waypoint>,
    /// Ordered arc indices
    pub arcs: Vec<usize>,
    /// Accumulated cost
    pub impedance: f64,
    /// Whether a route was found
    pub exists: bool,
}

impl Route {
    /// The empty "no route" value.
    pub fn not_found() -> Self {
        Self {
            waypoints: Vec::new(),
            arcs: Vec::new(),
            impedance: 0.0,
            exists: false,
        }
    }

    /// Build a route from an index path.
    pub fn from_index_path(network: &Network, path: IndexPath) -> Self {
        let waypoints = path
            .nodes
            .iter()
            .map(|&i| {
                let node = &network.nodes()[i];
                Waypoint {
                    id: node.id,
                    index: Some(i),
                    coordinate: node.coordinate,
                }
            })
            .collect();
        Self {
            waypoints,
            arcs: path.arcs,
            impedance: path.cost,
            exists: true,
        }
    }

    /// Node IDs in route order (0 for synthetic stops).
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.waypoints.iter().map(|w| w.id).collect()
    }

    /// Number of stops.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Whether the route has no stops.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Resolve two node IDs and search between them.
pub(crate) fn solve_between_nodes(
    network: &Network,
    matrix: &NeighborMatrix,
    start: NodeId,
    end: NodeId,
    algorithm: SearchAlgorithm,
) -> Result<Route> {
    let s = network.require_index(start)?;
    let e = network.require_index(end)?;
    solve_between_indices(network, matrix, s, e, algorithm)
}

/// Search between two node indices with the chosen algorithm.
pub(crate) fn solve_between_indices(
    network: &Network,
    matrix: &NeighborMatrix,
    start: usize,
    end: usize,
    algorithm: SearchAlgorithm,
) -> Result<Route> {
    trace!("Solving path {start} -> {end} with {algorithm:?}");
    let found = match algorithm {
        SearchAlgorithm::Dijkstra => dijkstra::dijkstra_path(matrix, start, end)?,
        SearchAlgorithm::AStar => astar::astar_path(network, matrix, start, end, false)?,
        SearchAlgorithm::GreedyAStar => astar::astar_path(network, matrix, start, end, true)?,
    };
    Ok(match found {
        Some(path) => Route::from_index_path(network, path),
        None => Route::not_found(),
    })
}

/// Walk predecessor links back from `target` into an [`IndexPath`].
pub(crate) fn unwind(
    predecessors: &[Option<(usize, usize)>],
    target: usize,
    cost: f64,
) -> IndexPath {
    let mut nodes = vec![target];
    let mut arcs = Vec::new();
    let mut current = target;
    while let Some((prev, arc)) = predecessors[current] {
        nodes.push(prev);
        arcs.push(arc);
        current = prev;
    }
    nodes.reverse();
    arcs.reverse();
    IndexPath { nodes, arcs, cost }
}
