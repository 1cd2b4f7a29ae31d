//! Network construction from polyline feature collections.
//!
//! Every pair of consecutive vertices becomes one segment. Segment ends are
//! matched to existing nodes within the network's snap tolerance, or become
//! new nodes. All source attributes are copied onto each derived arc together
//! with a 1-based `SegmentID`.

use crate::config::NetworkConfig;
use crate::error::{GraphError, Result};
use crate::geometry::{self, Coordinate};
use crate::graph::{ArcId, Network, NodeId, PropertyMap};
use crate::spatial;
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

/// Property key of the synthesized segment ordinal.
pub const SEGMENT_ID_FIELD: &str = "SegmentID";

/// One source polyline with its attribute row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolylineFeature {
    /// Ordered vertices; Z values make the network 3D
    pub vertices: Vec<Coordinate>,
    /// Attribute row copied onto every derived arc
    pub attributes: PropertyMap,
}

impl PolylineFeature {
    /// Feature from vertices and attributes.
    pub fn new(vertices: Vec<Coordinate>, attributes: PropertyMap) -> Self {
        Self {
            vertices,
            attributes,
        }
    }
}

/// Directionality code of a source polyline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    /// Code 1: traversable both ways
    Both,
    /// Code 2: vertex order only
    Forward,
    /// Code 3: against vertex order only
    Backward,
}

impl FlowDirection {
    /// Decode a directionality attribute; anything unknown is two-way.
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(2) => FlowDirection::Forward,
            Some(3) => FlowDirection::Backward,
            _ => FlowDirection::Both,
        }
    }
}

/// Build a new network from `features`.
pub fn build_network(config: NetworkConfig, features: &[PolylineFeature]) -> Result<Network> {
    let mut network = Network::new(config)?;
    let arcs = add_polylines(&mut network, features)?;
    info!(
        "Built network from {} features: {} nodes, {} arcs",
        features.len(),
        network.node_count(),
        arcs.len()
    );
    Ok(network)
}

/// Add `features` to an existing network, returning the new arc IDs.
///
/// On a directed network the attribute named by
/// [`NetworkConfig::direction_field`] selects forward, backward or two-way arcs;
/// a two-way segment yields one arc per direction sharing a `SegmentID`.
/// Undirected networks get one arc per segment.
pub fn add_polylines(network: &mut Network, features: &[PolylineFeature]) -> Result<Vec<ArcId>> {
    let directed = network.is_directed();
    let direction_field = network.config().direction_field.clone();
    let mut segment_id = next_segment_id(network);
    let mut added = Vec::new();

    for (f, feature) in features.iter().enumerate() {
        if feature.vertices.len() < 2 {
            warn!("Skipping feature {f}: fewer than two vertices");
            continue;
        }
        if feature.vertices.iter().any(|v| !v.x.is_finite() || !v.y.is_finite()) {
            return Err(GraphError::invalid(format!(
                "feature {f} has a non-finite vertex"
            )));
        }
        let flow = if directed {
            FlowDirection::from_code(
                feature
                    .attributes
                    .get_number(&direction_field)
                    .map(|code| code as i64),
            )
        } else {
            FlowDirection::Both
        };

        for window in feature.vertices.windows(2) {
            let (from, to) = (window[0], window[1]);
            let start = find_or_create(network, from)?;
            let end = find_or_create(network, to)?;
            if start == end {
                trace!("Feature {f}: dropping zero-length segment");
                continue;
            }
            let mut properties = feature.attributes.clone();
            properties.insert(SEGMENT_ID_FIELD, segment_id);
            segment_id += 1;

            if !directed || flow != FlowDirection::Backward {
                added.push(network.push_arc_unchecked(
                    start,
                    end,
                    Some((from, to)),
                    properties.clone(),
                ));
            }
            if directed && flow != FlowDirection::Forward {
                added.push(network.push_arc_unchecked(end, start, Some((to, from)), properties));
            }
        }
    }
    debug!("Added {} arcs from {} features", added.len(), features.len());
    Ok(added)
}

/// Node within snap tolerance of `at`, created when none exists.
fn find_or_create(network: &mut Network, at: Coordinate) -> Result<NodeId> {
    let system = network.config().coordinate_system;
    let tolerance = network.config().snap_tolerance;
    let candidates = network.spatial_index().node_candidates(system, &at, tolerance);
    let found = spatial::closest_within(candidates, tolerance, |i| {
        let node = network.nodes().get(i)?;
        Some(geometry::distance(system, &at, &node.coordinate?))
    });
    match found {
        Some((index, _)) => Ok(network.nodes()[index].id),
        None => network.add_node_at(at, PropertyMap::new()),
    }
}

fn next_segment_id(network: &Network) -> i64 {
    network
        .arcs()
        .iter()
        .filter_map(|a| a.properties.get_int(SEGMENT_ID_FIELD))
        .max()
        .unwrap_or(0)
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;

    fn line(points: &[(f64, f64)], props: PropertyMap) -> PolylineFeature {
        PolylineFeature::new(
            points.iter().map(|&(x, y)| Coordinate::new(x, y)).collect(),
            props,
        )
    }

    #[test]
    fn test_shared_vertices_become_one_node() {
        let features = vec![
            line(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)], PropertyMap::new().with("name", "a")),
            line(&[(1.0, 0.0), (1.0, 1.0)], PropertyMap::new().with("name", "b")),
        ];
        let net = build_network(NetworkConfig::planar(), &features).unwrap();
        assert_eq!(net.node_count(), 4);
        assert_eq!(net.arc_count(), 3);

        let ids: Vec<_> = net
            .arcs()
            .iter()
            .map(|a| a.properties.get_int(SEGMENT_ID_FIELD).unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(net.arcs()[2].properties.get_string("name"), Some("b"));
    }

    #[test]
    fn test_direction_codes() {
        let config = NetworkConfig::planar().directed();
        let features = vec![
            line(&[(0.0, 0.0), (1.0, 0.0)], PropertyMap::new().with("Direction", 1)),
            line(&[(1.0, 0.0), (2.0, 0.0)], PropertyMap::new().with("Direction", 2)),
            line(&[(2.0, 0.0), (3.0, 0.0)], PropertyMap::new().with("Direction", 3)),
            line(&[(3.0, 0.0), (4.0, 0.0)], PropertyMap::new().with("Direction", 9)),
        ];
        let net = build_network(config, &features).unwrap();
        // 2 + 1 + 1 + 2
        assert_eq!(net.arc_count(), 6);

        let backward = &net.arcs()[3];
        assert_eq!((backward.start, backward.end), (4, 3));
        assert_eq!(backward.properties.get_int(SEGMENT_ID_FIELD), Some(3));
    }

    #[test]
    fn test_snap_tolerance_merges_close_vertices() {
        let mut config = NetworkConfig::planar();
        config.snap_tolerance = 0.1;
        let features = vec![
            line(&[(0.0, 0.0), (1.0, 0.0)], PropertyMap::new()),
            line(&[(1.05, 0.0), (2.0, 0.0)], PropertyMap::new()),
        ];
        let net = build_network(config, &features).unwrap();
        assert_eq!(net.node_count(), 3);
    }

    #[test]
    fn test_vertical_separation_keeps_3d_nodes_apart() {
        let features = vec![
            PolylineFeature::new(
                vec![Coordinate::with_z(0.0, 0.0, 0.0), Coordinate::with_z(0.0, 0.0, 5.0)],
                PropertyMap::new(),
            ),
        ];
        let net = build_network(NetworkConfig::planar(), &features).unwrap();
        assert_eq!(net.node_count(), 2);
        assert!(net.nodes().iter().all(|n| n.coordinate.unwrap().is_3d()));

        net.rebuild_matrix(None).unwrap();
        let m = net.neighbor_matrix().unwrap();
        assert_eq!(m.weight_between(0, 1), Some(5.0));
    }

    #[test]
    fn test_geo_network_resolves_built_arcs() {
        let features = vec![line(&[(0.0, 0.0), (0.001, 0.0)], PropertyMap::new())];
        let net = build_network(NetworkConfig::geographic(), &features).unwrap();
        let m = net.rebuild_matrix(None).unwrap();
        assert_eq!(m.len(), 2);
        assert!(m.weight_between(0, 1).unwrap() > 100.0);
    }
}
