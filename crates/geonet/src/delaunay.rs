//! Connectivity for bare point sets.
//!
//! Starting from one seed edge, every queued edge looks on each of its sides
//! for the point that sees it under the widest angle and links both edge ends
//! to that point. The result resembles a Delaunay triangulation but is a
//! heuristic: it only grows from the seed edge and never flips edges.

use crate::error::{GraphError, Result};
use crate::geometry::{self, Coordinate};
use crate::graph::{ArcId, Network, PropertyMap};
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Property key receiving the [`LinkType`] of every synthesized arc.
pub const LINK_TYPE_FIELD: &str = "LinkType";

/// Binary tag assigned to synthesized arcs by the similarity predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    /// The predicate accepted the endpoint properties
    Similar,
    /// The predicate rejected them
    Dissimilar,
}

impl LinkType {
    /// Stored property value: 1 for similar, 0 otherwise.
    pub fn code(self) -> i64 {
        match self {
            LinkType::Similar => 1,
            LinkType::Dissimilar => 0,
        }
    }
}

type Similarity<'a> = Box<dyn Fn(&PropertyMap, &PropertyMap) -> bool + Sync + 'a>;

/// Builder for point-set connectivity.
pub struct DelaunayLinker<'a> {
    max_length: Option<f64>,
    similarity: Similarity<'a>,
}

impl Default for DelaunayLinker<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> DelaunayLinker<'a> {
    /// Linker without a length filter that tags every arc [`LinkType::Similar`].
    pub fn new() -> Self {
        Self {
            max_length: None,
            similarity: Box::new(|_, _| true),
        }
    }

    /// Drop synthesized edges longer than `max_length`.
    pub fn max_length(mut self, max_length: f64) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Predicate over endpoint properties deciding each arc's [`LinkType`].
    pub fn similarity(
        mut self,
        predicate: impl Fn(&PropertyMap, &PropertyMap) -> bool + Sync + 'a,
    ) -> Self {
        self.similarity = Box::new(predicate);
        self
    }

    /// Link the nodes of `network` and add the resulting arcs.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::WrongVariant`] for a directed network and
    /// [`GraphError::MissingCoordinate`] if any node is unlocated.
    pub fn link(&self, network: &mut Network) -> Result<Vec<ArcId>> {
        if network.is_directed() {
            return Err(GraphError::WrongVariant {
                expected: "undirected network".to_string(),
                actual: "directed network".to_string(),
            });
        }
        let points: Vec<Coordinate> = (0..network.node_count())
            .map(|i| network.coordinate(i))
            .collect::<Result<_>>()?;

        let edges = self.edges(network, &points);
        let system = network.config().coordinate_system;
        let ids: Vec<_> = network.nodes().iter().map(|n| n.id).collect();

        let mut added = Vec::with_capacity(edges.len());
        let mut filtered = 0usize;
        for (a, b) in edges {
            if let Some(limit) = self.max_length {
                if geometry::distance(system, &points[a], &points[b]) > limit {
                    filtered += 1;
                    continue;
                }
            }
            let link = if (self.similarity)(
                &network.nodes()[a].properties,
                &network.nodes()[b].properties,
            ) {
                LinkType::Similar
            } else {
                LinkType::Dissimilar
            };
            let properties = PropertyMap::new().with(LINK_TYPE_FIELD, link.code());
            added.push(network.add_arc(ids[a], ids[b], properties)?);
        }
        info!(
            "Linked {} points with {} arcs ({filtered} over length limit)",
            points.len(),
            added.len()
        );
        Ok(added)
    }

    /// Index pairs produced from the seed edge, in discovery order.
    fn edges(&self, network: &Network, points: &[Coordinate]) -> Vec<(usize, usize)> {
        if points.len() < 2 {
            return Vec::new();
        }
        let seed = 0;
        let Some(nearest) = network
            .spatial_index()
            .nearest_nodes(&points[seed])
            .find(|&i| i != seed)
        else {
            return Vec::new();
        };

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut edges = Vec::new();
        let mut queue = VecDeque::new();
        seen.insert(pair(seed, nearest));
        edges.push((seed, nearest));
        queue.push_back((seed, nearest));

        while let Some((a, b)) = queue.pop_front() {
            for side in [1.0, -1.0] {
                let Some(c) = widest_apex(points, a, b, side) else {
                    continue;
                };
                for end in [a, b] {
                    if seen.insert(pair(end, c)) {
                        edges.push((end, c));
                        queue.push_back((end, c));
                    }
                }
            }
        }
        debug!("Seed edge ({seed}, {nearest}) grew {} edges", edges.len());
        edges
    }
}

fn pair(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

/// Point strictly on `side` of `a -> b` with the largest angle at itself.
/// Ties keep the lowest index.
fn widest_apex(points: &[Coordinate], a: usize, b: usize, side: f64) -> Option<usize> {
    points
        .par_iter()
        .enumerate()
        .filter(|&(c, p)| c != a && c != b && side * geometry::cross(&points[a], &points[b], p) > 0.0)
        .map(|(c, p)| (c, geometry::angle_at(p, &points[a], &points[b])))
        .reduce_with(|x, y| {
            if y.1 > x.1 || (y.1 == x.1 && y.0 < x.0) {
                y
            } else {
                x
            }
        })
        .map(|(c, _)| c)
}
