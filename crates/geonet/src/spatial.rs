//! Spatial index over node positions and arc segments.
//!
//! Backed by two R-trees keyed in raw coordinate units. Candidate queries are
//! deliberately loose; callers refine candidates with the exact distance of their
//! [`CoordinateSystem`].

use crate::geometry::{self, Coordinate, CoordinateSystem};
use rstar::primitives::{GeomWithData, Line};
use rstar::RTree;

/// Approximate meters per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

type NodeEntry = GeomWithData<[f64; 2], usize>;
type ArcEntry = GeomWithData<Line<[f64; 2]>, usize>;

/// R-tree index of node and arc arena indices.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    node_tree: RTree<NodeEntry>,
    arc_tree: RTree<ArcEntry>,
}

impl SpatialIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-load an index from node positions and arc segments.
    pub fn build(
        nodes: impl IntoIterator<Item = (usize, Coordinate)>,
        arcs: impl IntoIterator<Item = (usize, Coordinate, Coordinate)>,
    ) -> Self {
        let node_entries: Vec<_> = nodes
            .into_iter()
            .map(|(index, c)| GeomWithData::new(c.xy(), index))
            .collect();
        let arc_entries: Vec<_> = arcs
            .into_iter()
            .map(|(index, a, b)| GeomWithData::new(Line::new(a.xy(), b.xy()), index))
            .collect();
        Self {
            node_tree: RTree::bulk_load(node_entries),
            arc_tree: RTree::bulk_load(arc_entries),
        }
    }

    /// Insert a node position.
    pub fn insert_node(&mut self, index: usize, at: Coordinate) {
        self.node_tree.insert(GeomWithData::new(at.xy(), index));
    }

    /// Insert an arc segment.
    pub fn insert_arc(&mut self, index: usize, start: Coordinate, end: Coordinate) {
        self.arc_tree
            .insert(GeomWithData::new(Line::new(start.xy(), end.xy()), index));
    }

    /// Number of indexed nodes.
    pub fn node_len(&self) -> usize {
        self.node_tree.size()
    }

    /// Number of indexed arcs.
    pub fn arc_len(&self) -> usize {
        self.arc_tree.size()
    }

    /// Node indices whose position may lie within `tolerance` of `at`.
    pub fn node_candidates(
        &self,
        system: CoordinateSystem,
        at: &Coordinate,
        tolerance: f64,
    ) -> Vec<usize> {
        let radius = search_radius(system, at, tolerance);
        self.node_tree
            .locate_within_distance(at.xy(), radius * radius)
            .map(|entry| entry.data)
            .collect()
    }

    /// Arc indices whose segment may pass within `tolerance` of `at`.
    pub fn arc_candidates(
        &self,
        system: CoordinateSystem,
        at: &Coordinate,
        tolerance: f64,
    ) -> Vec<usize> {
        let radius = search_radius(system, at, tolerance);
        self.arc_tree
            .locate_within_distance(at.xy(), radius * radius)
            .map(|entry| entry.data)
            .collect()
    }

    /// Node indices ordered by planar distance from `at`.
    pub fn nearest_nodes<'a>(&'a self, at: &Coordinate) -> impl Iterator<Item = usize> + 'a {
        self.node_tree
            .nearest_neighbor_iter(&at.xy())
            .map(|entry| entry.data)
    }
}

/// Radius in coordinate units that covers `tolerance` measured in `system` units.
fn search_radius(system: CoordinateSystem, at: &Coordinate, tolerance: f64) -> f64 {
    match system {
        CoordinateSystem::Planar => tolerance,
        CoordinateSystem::Geographic => {
            // Longitude degrees shrink towards the poles
            let shrink = at.y.to_radians().cos().abs().max(1e-6);
            tolerance / (METERS_PER_DEGREE * shrink)
        }
    }
}

/// Pick the candidate closest to `at` within `tolerance`, first index wins ties.
pub(crate) fn closest_within<I>(
    candidates: I,
    tolerance: f64,
    mut measure: impl FnMut(usize) -> Option<f64>,
) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = usize>,
{
    let mut sorted: Vec<usize> = candidates.into_iter().collect();
    sorted.sort_unstable();

    let mut best: Option<(usize, f64)> = None;
    for index in sorted {
        let Some(dist) = measure(index) else {
            continue;
        };
        if dist > tolerance {
            continue;
        }
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((index, dist));
        }
    }
    best
}

/// Exact distance from a point to an arc segment, exposed for snapping.
pub(crate) fn arc_distance(
    system: CoordinateSystem,
    at: &Coordinate,
    start: &Coordinate,
    end: &Coordinate,
) -> f64 {
    geometry::point_segment_distance(system, at, start, end)
}
