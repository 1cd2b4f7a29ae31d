//! Construction tests: polyline networks and point-set linking.

use geonet::builder::{add_polylines, SEGMENT_ID_FIELD};
use geonet::delaunay::LINK_TYPE_FIELD;
use geonet::{
    build_network, Coordinate, DelaunayLinker, Network, NetworkConfig, PolylineFeature,
    PropertyMap, SearchAlgorithm,
};

fn line(points: &[(f64, f64)], props: PropertyMap) -> PolylineFeature {
    PolylineFeature::new(
        points.iter().map(|&(x, y)| Coordinate::new(x, y)).collect(),
        props,
    )
}

#[test]
fn test_street_grid_routes_through_intersections() {
    // Two avenues crossed by three streets; crossings share vertices
    let features = vec![
        line(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)], PropertyMap::new().with("name", "1st")),
        line(&[(0.0, 10.0), (10.0, 10.0), (20.0, 10.0)], PropertyMap::new().with("name", "2nd")),
        line(&[(0.0, 0.0), (0.0, 10.0)], PropertyMap::new()),
        line(&[(10.0, 0.0), (10.0, 10.0)], PropertyMap::new()),
        line(&[(20.0, 0.0), (20.0, 10.0)], PropertyMap::new()),
    ];
    let net = build_network(NetworkConfig::planar(), &features).unwrap();
    assert_eq!(net.node_count(), 6);
    assert_eq!(net.arc_count(), 7);

    net.rebuild_matrix(None).unwrap();
    let first = net.nodes()[0].id;
    let last = net
        .nodes()
        .iter()
        .find(|n| n.coordinate == Some(Coordinate::new(20.0, 10.0)))
        .map(|n| n.id)
        .unwrap();
    let route = net.solve_path(first, last, SearchAlgorithm::AStar).unwrap();
    assert!(route.exists);
    assert_eq!(route.impedance, 30.0);
}

#[test]
fn test_one_way_street() {
    let features = vec![line(
        &[(0.0, 0.0), (10.0, 0.0)],
        PropertyMap::new().with("Direction", 2),
    )];
    let net = build_network(NetworkConfig::planar().directed(), &features).unwrap();
    assert_eq!(net.arc_count(), 1);
    net.rebuild_matrix(None).unwrap();

    let forward = net.solve_path(1, 2, SearchAlgorithm::Dijkstra).unwrap();
    assert!(forward.exists);
    assert_eq!(forward.impedance, 10.0);
    let backward = net.solve_path(2, 1, SearchAlgorithm::Dijkstra).unwrap();
    assert!(!backward.exists);
}

#[test]
fn test_appended_features_continue_segment_ids() {
    let mut net = build_network(
        NetworkConfig::planar(),
        &[line(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)], PropertyMap::new())],
    )
    .unwrap();
    let added = add_polylines(&mut net, &[line(&[(2.0, 0.0), (2.0, 5.0)], PropertyMap::new())])
        .unwrap();
    assert_eq!(added.len(), 1);
    assert_eq!(net.node_count(), 4);
    assert_eq!(net.arcs()[2].properties.get_int(SEGMENT_ID_FIELD), Some(3));
}

#[test]
fn test_degenerate_features_are_skipped() {
    let features = vec![
        line(&[(0.0, 0.0)], PropertyMap::new()),
        line(&[(1.0, 1.0), (1.0, 1.0)], PropertyMap::new()),
        line(&[(0.0, 0.0), (3.0, 4.0)], PropertyMap::new()),
    ];
    let net = build_network(NetworkConfig::planar(), &features).unwrap();
    assert_eq!(net.arc_count(), 1);
}

#[test]
fn test_non_finite_vertex_is_rejected() {
    let features = vec![line(&[(0.0, 0.0), (f64::NAN, 1.0)], PropertyMap::new())];
    assert!(build_network(NetworkConfig::planar(), &features).is_err());
}

#[test]
fn test_linked_points_support_routing() {
    let mut net = Network::planar();
    for (x, y) in [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (2.0, 2.1)] {
        net.add_node_at(Coordinate::new(x, y), PropertyMap::new()).unwrap();
    }
    let arcs = DelaunayLinker::new().link(&mut net).unwrap();
    // Four hull edges plus one spoke to each corner
    assert_eq!(arcs.len(), 8);
    let center = net.nodes()[4].id;
    assert_eq!(net.arcs().iter().filter(|a| a.touches(center)).count(), 4);
    assert!(net
        .arcs()
        .iter()
        .all(|a| a.properties.get_int(LINK_TYPE_FIELD) == Some(1)));

    net.rebuild_matrix(None).unwrap();
    let route = net.solve_path(1, 3, SearchAlgorithm::Dijkstra).unwrap();
    assert!(route.exists);
    // Via the center beats going around the hull
    assert_eq!(route.len(), 3);
    assert_eq!(route.waypoints[1].id, center);
}

#[test]
fn test_geographic_shared_vertex_is_one_node() {
    let features = vec![
        line(&[(12.49, 41.9), (12.5, 41.9)], PropertyMap::new()),
        line(&[(12.5, 41.9), (12.5, 41.91)], PropertyMap::new()),
    ];
    let net = build_network(NetworkConfig::geographic(), &features).unwrap();
    assert_eq!(net.node_count(), 3);
    assert_eq!(net.arc_count(), 2);

    let m = net.rebuild_matrix(None).unwrap();
    // The shared vertex joins both arcs
    assert_eq!(m.neighbors(1).unwrap().len(), 2);
    let route = net.solve_path(1, 3, SearchAlgorithm::Dijkstra).unwrap();
    assert!(route.exists);
    assert_eq!(route.arcs, vec![0, 1]);
}
