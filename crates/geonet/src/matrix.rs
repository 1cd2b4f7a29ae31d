//! Sparse weighted adjacency shared by every graph algorithm.
//!
//! A [`NeighborMatrix`] is never patched: it is rebuilt wholesale from the
//! network's arcs and published by swapping an `Arc` (see
//! [`Network::rebuild_matrix`](crate::Network::rebuild_matrix)).

use crate::config::NetworkVariant;
use crate::error::{GraphError, Result};
use crate::geometry::{self, Coordinate};
use crate::graph::{Network, NodeId};
use crate::spatial;
use log::{debug, trace, warn};

/// One adjacency entry: the node reached, the traversal weight and the arc used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Arena index of the neighbor node
    pub index: usize,
    /// Traversal cost
    pub weight: f64,
    /// Arena index of the arc
    pub arc: usize,
}

/// Per-node adjacency lists, indexed by node arena index.
#[derive(Debug, Clone, Default)]
pub struct NeighborMatrix {
    rows: Vec<Vec<Neighbor>>,
    weight_field: Option<String>,
    directed: bool,
}

impl NeighborMatrix {
    /// Assemble a matrix from prepared rows.
    pub fn from_rows(rows: Vec<Vec<Neighbor>>, weight_field: Option<String>, directed: bool) -> Self {
        Self {
            rows,
            weight_field,
            directed,
        }
    }

    /// Number of rows (always the node count of the network it was built from).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Weight field the matrix was built with.
    pub fn weight_field(&self) -> Option<&str> {
        self.weight_field.as_deref()
    }

    /// Whether rows hold only outgoing entries.
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Adjacency of the node at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::IndexOutOfRange`] for an invalid index.
    pub fn neighbors(&self, index: usize) -> Result<&[Neighbor]> {
        self.rows
            .get(index)
            .map(Vec::as_slice)
            .ok_or(GraphError::IndexOutOfRange {
                kind: "matrix row",
                index,
                len: self.rows.len(),
            })
    }

    /// All rows.
    pub fn rows(&self) -> &[Vec<Neighbor>] {
        &self.rows
    }

    /// Number of outgoing entries per node.
    pub fn out_degrees(&self) -> Vec<usize> {
        self.rows.iter().map(Vec::len).collect()
    }

    /// Number of incoming entries per node.
    pub fn in_degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.rows.len()];
        for row in &self.rows {
            for n in row {
                degrees[n.index] += 1;
            }
        }
        degrees
    }

    /// Outgoing and incoming weight sums per node under `affinity`.
    pub fn strengths_by(&self, affinity: impl Fn(f64) -> f64) -> (Vec<f64>, Vec<f64>) {
        let mut out = vec![0.0; self.rows.len()];
        let mut inc = vec![0.0; self.rows.len()];
        for (i, row) in self.rows.iter().enumerate() {
            for n in row {
                let a = affinity(n.weight);
                out[i] += a;
                inc[n.index] += a;
            }
        }
        (out, inc)
    }

    /// Sum of every entry's weight (twice the edge weight total when undirected).
    pub fn total_weight(&self) -> f64 {
        self.rows.iter().flatten().map(|n| n.weight).sum()
    }

    /// Cheapest entry from `from` to `to`, if any.
    pub fn weight_between(&self, from: usize, to: usize) -> Option<f64> {
        self.rows
            .get(from)?
            .iter()
            .filter(|n| n.index == to)
            .map(|n| n.weight)
            .min_by(f64::total_cmp)
    }

    /// Distinct neighbor indices of `index`, treating the matrix as undirected.
    pub fn undirected_neighbors(&self, index: usize) -> Vec<usize> {
        let mut set: Vec<usize> = self.rows[index].iter().map(|n| n.index).collect();
        if self.directed {
            for (i, row) in self.rows.iter().enumerate() {
                if row.iter().any(|n| n.index == index) {
                    set.push(i);
                }
            }
        }
        set.retain(|&i| i != index);
        set.sort_unstable();
        set.dedup();
        set
    }
}

/// Build a fresh matrix for `network` under `weight_field`.
///
/// Plain networks resolve endpoints by node ID and silently skip arcs whose
/// endpoints are gone. Geo networks resolve them through the spatial index and
/// fail with [`GraphError::GraphConsistency`] on the first unresolvable arc.
pub(crate) fn build(network: &Network, weight_field: Option<&str>) -> Result<NeighborMatrix> {
    let config = network.config();
    let mut rows: Vec<Vec<Neighbor>> = vec![Vec::new(); network.node_count()];
    let mut skipped = 0usize;
    let mut non_numeric = 0usize;

    for (arc_index, arc) in network.arcs().iter().enumerate() {
        let endpoints = match config.variant {
            NetworkVariant::Plain => {
                match (network.node_index(arc.start), network.node_index(arc.end)) {
                    (Some(s), Some(e)) => Some((s, e)),
                    _ => None,
                }
            }
            NetworkVariant::Geo => Some(resolve_geo(network, arc_index)?),
        };
        let Some((s, e)) = endpoints else {
            skipped += 1;
            continue;
        };

        let weight = match weight_field.and_then(|field| arc.properties.get(field)) {
            Some(value) if value.is_numeric() => value
                .as_f64()
                .unwrap_or_else(|| default_weight(network, arc.geometry, s, e)),
            Some(value) => {
                trace!("Arc {arc_index}: {} weight, using length", value.type_name());
                non_numeric += 1;
                default_weight(network, arc.geometry, s, e)
            }
            None => default_weight(network, arc.geometry, s, e),
        };

        rows[s].push(Neighbor {
            index: e,
            weight,
            arc: arc_index,
        });
        if !config.directed {
            rows[e].push(Neighbor {
                index: s,
                weight,
                arc: arc_index,
            });
        }
    }

    if skipped > 0 {
        warn!("Skipped {skipped} arcs with unresolvable endpoints");
    }
    if non_numeric > 0 {
        warn!("{non_numeric} arcs hold a non-numeric {weight_field:?}; their length was used");
    }
    debug!(
        "Built neighbor matrix: {} rows, {} arcs, weight field {:?}",
        rows.len(),
        network.arc_count() - skipped,
        weight_field
    );

    Ok(NeighborMatrix::from_rows(
        rows,
        weight_field.map(str::to_string),
        config.directed,
    ))
}

/// Geometric length of an arc, falling back to 1 when coordinates are missing.
fn default_weight(
    network: &Network,
    geometry: Option<(Coordinate, Coordinate)>,
    s: usize,
    e: usize,
) -> f64 {
    let system = network.config().coordinate_system;
    if let Some((a, b)) = geometry {
        return geometry::distance(system, &a, &b);
    }
    match (network.nodes()[s].coordinate, network.nodes()[e].coordinate) {
        (Some(a), Some(b)) => geometry::distance(system, &a, &b),
        _ => 1.0,
    }
}

fn resolve_geo(network: &Network, arc_index: usize) -> Result<(usize, usize)> {
    let arc = &network.arcs()[arc_index];
    let (start_at, end_at) = match arc.geometry {
        Some(segment) => segment,
        None => (
            endpoint_coordinate(network, arc_index, arc.start, "start")?,
            endpoint_coordinate(network, arc_index, arc.end, "end")?,
        ),
    };
    let s = snap_endpoint(network, arc_index, &start_at, "start")?;
    let e = snap_endpoint(network, arc_index, &end_at, "end")?;
    Ok((s, e))
}

fn endpoint_coordinate(
    network: &Network,
    arc_index: usize,
    node_id: NodeId,
    endpoint: &'static str,
) -> Result<Coordinate> {
    network
        .node_index(node_id)
        .and_then(|i| network.nodes()[i].coordinate)
        .ok_or_else(|| GraphError::GraphConsistency {
            arc: arc_index,
            endpoint,
            message: format!("node {node_id} is missing or has no coordinate"),
        })
}

fn snap_endpoint(
    network: &Network,
    arc_index: usize,
    at: &Coordinate,
    endpoint: &'static str,
) -> Result<usize> {
    let config = network.config();
    let system = config.coordinate_system;
    let tolerance = config.snap_tolerance;
    let candidates = network
        .spatial_index()
        .node_candidates(system, at, tolerance);

    spatial::closest_within(candidates, tolerance, |i| {
        network.nodes()[i]
            .coordinate
            .map(|c| geometry::distance(system, &Coordinate { z: None, ..c }, &Coordinate { z: None, ..*at }))
    })
    .map(|(index, _)| index)
    .ok_or_else(|| GraphError::GraphConsistency {
        arc: arc_index,
        endpoint,
        message: format!(
            "no node within {tolerance} of ({}, {})",
            at.x, at.y
        ),
    })
}
