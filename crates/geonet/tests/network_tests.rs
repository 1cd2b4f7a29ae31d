//! Network store tests: identity, cascades, staleness and matrix publication.

use geonet::{
    Coordinate, CoordinateSystem, GraphError, Network, NetworkConfig, NetworkVariant, PropertyMap,
};

fn located(net: &mut Network, x: f64, y: f64) -> u64 {
    net.add_node_at(Coordinate::new(x, y), PropertyMap::new()).unwrap()
}

#[test]
fn test_ids_start_at_one_and_stay_unique() {
    let mut net = Network::planar();
    let a = located(&mut net, 0.0, 0.0);
    let b = located(&mut net, 1.0, 0.0);
    assert_eq!((a, b), (1, 2));

    net.delete_node(b).unwrap();
    let c = located(&mut net, 2.0, 0.0);
    // Deleted IDs are not reused
    assert_eq!(c, 3);
    assert!(matches!(net.get_node(b), Err(GraphError::NodeNotFound { node_id: 2 })));
}

#[test]
fn test_reserved_id_is_rejected() {
    let mut net = Network::planar();
    assert!(net.insert_node_with_id(0, None, PropertyMap::new()).is_err());
    net.insert_node_with_id(10, None, PropertyMap::new()).unwrap();
    assert!(net.insert_node_with_id(10, None, PropertyMap::new()).is_err());
    // The counter moves past imported IDs
    assert_eq!(net.add_node(PropertyMap::new()).unwrap(), 11);
}

#[test]
fn test_delete_node_cascades_to_arcs() {
    let mut net = Network::planar();
    let a = located(&mut net, 0.0, 0.0);
    let b = located(&mut net, 1.0, 0.0);
    let c = located(&mut net, 2.0, 0.0);
    net.add_arc(a, b, PropertyMap::new()).unwrap();
    net.add_arc(b, c, PropertyMap::new()).unwrap();
    net.add_arc(a, c, PropertyMap::new()).unwrap();

    net.delete_node(b).unwrap();
    assert_eq!(net.node_count(), 2);
    assert_eq!(net.arc_count(), 1);
    assert!(net.arcs().iter().all(|arc| !arc.touches(b)));

    let m = net.rebuild_matrix(None).unwrap();
    assert_eq!(m.len(), 2);
    assert_eq!(m.weight_between(0, 1), Some(2.0));
}

#[test]
fn test_add_arc_requires_endpoints() {
    let mut net = Network::planar();
    let a = located(&mut net, 0.0, 0.0);
    let err = net.add_arc(a, 42, PropertyMap::new()).unwrap_err();
    assert!(matches!(err, GraphError::NodeNotFound { node_id: 42 }));
    assert_eq!(net.arc_count(), 0);
}

#[test]
fn test_geo_network_requires_coordinates() {
    let mut net = Network::geographic();
    assert!(matches!(
        net.add_node(PropertyMap::new()),
        Err(GraphError::WrongVariant { .. })
    ));
    assert!(matches!(
        net.insert_node_with_id(5, None, PropertyMap::new()),
        Err(GraphError::MissingCoordinate { node_id: 5 })
    ));
}

#[test]
fn test_undirected_matrix_is_symmetric() {
    let mut net = Network::planar();
    let a = located(&mut net, 0.0, 0.0);
    let b = located(&mut net, 3.0, 4.0);
    net.add_arc(a, b, PropertyMap::new()).unwrap();
    let m = net.rebuild_matrix(None).unwrap();
    assert_eq!(m.weight_between(0, 1), Some(5.0));
    assert_eq!(m.weight_between(1, 0), Some(5.0));
    assert!(!m.is_directed());
}

#[test]
fn test_directed_matrix_keeps_one_direction() {
    let mut net = Network::new(NetworkConfig::planar().directed()).unwrap();
    let a = located(&mut net, 0.0, 0.0);
    let b = located(&mut net, 3.0, 4.0);
    net.add_arc(a, b, PropertyMap::new()).unwrap();
    let m = net.rebuild_matrix(None).unwrap();
    assert_eq!(m.weight_between(0, 1), Some(5.0));
    assert_eq!(m.weight_between(1, 0), None);
}

#[test]
fn test_weight_field_overrides_length() {
    let mut net = Network::planar();
    let a = located(&mut net, 0.0, 0.0);
    let b = located(&mut net, 3.0, 4.0);
    net.add_arc(a, b, PropertyMap::new().with("minutes", 2.5)).unwrap();
    let m = net.rebuild_matrix(Some("minutes")).unwrap();
    assert_eq!(m.weight_field(), Some("minutes"));
    assert_eq!(m.weight_between(0, 1), Some(2.5));
}

#[test]
fn test_staleness_lifecycle() {
    let mut net = Network::planar();
    assert!(net.is_matrix_stale());
    assert!(matches!(net.neighbor_matrix(), Err(GraphError::StaleMatrix)));

    let a = located(&mut net, 0.0, 0.0);
    let b = located(&mut net, 1.0, 0.0);
    net.add_arc(a, b, PropertyMap::new()).unwrap();
    net.rebuild_matrix(None).unwrap();
    assert!(net.neighbor_matrix().is_ok());

    net.set_node_property(a, "name", "depot").unwrap();
    assert!(!net.is_matrix_stale());

    net.set_arc_property(0, "w", 9.0).unwrap();
    assert!(net.is_matrix_stale());
}

#[test]
fn test_ensure_matrix_reuses_or_rebuilds() {
    let mut net = Network::planar();
    let a = located(&mut net, 0.0, 0.0);
    let b = located(&mut net, 1.0, 0.0);
    net.add_arc(a, b, PropertyMap::new().with("w", 7.0)).unwrap();

    let first = net.ensure_matrix(None).unwrap();
    let again = net.ensure_matrix(None).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &again));

    let weighted = net.ensure_matrix(Some("w")).unwrap();
    assert!(!std::sync::Arc::ptr_eq(&first, &weighted));
    assert_eq!(weighted.weight_between(0, 1), Some(7.0));
}

#[test]
fn test_readers_keep_their_snapshot_across_rebuilds() {
    let mut net = Network::planar();
    let a = located(&mut net, 0.0, 0.0);
    let b = located(&mut net, 1.0, 0.0);
    net.add_arc(a, b, PropertyMap::new().with("w", 1.0)).unwrap();
    let snapshot = net.rebuild_matrix(Some("w")).unwrap();

    net.set_arc_property(0, "w", 4.0).unwrap();
    let next = net.rebuild_matrix(Some("w")).unwrap();

    assert_eq!(snapshot.weight_between(0, 1), Some(1.0));
    assert_eq!(next.weight_between(0, 1), Some(4.0));
}

#[test]
fn test_concurrent_readers_see_complete_matrix() {
    let mut net = Network::planar();
    let ids: Vec<_> = (0..20).map(|i| located(&mut net, i as f64, 0.0)).collect();
    for pair in ids.windows(2) {
        net.add_arc(pair[0], pair[1], PropertyMap::new()).unwrap();
    }
    net.rebuild_matrix(None).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let m = net.neighbor_matrix().unwrap();
                    assert_eq!(m.len(), 20);
                    assert_eq!(m.total_weight(), 38.0);
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..50 {
                net.rebuild_matrix(None).unwrap();
            }
        });
    });
}

#[test]
fn test_config_from_json() {
    let config = NetworkConfig::from_json_str(
        r#"{"directed": true, "coordinate_system": "Geographic", "variant": "Geo", "snap_tolerance": 0.5}"#,
    )
    .unwrap();
    assert!(config.directed);
    assert_eq!(config.coordinate_system, CoordinateSystem::Geographic);
    assert_eq!(config.variant, NetworkVariant::Geo);
    assert_eq!(config.direction_field, "Direction");

    let err = NetworkConfig::from_json_str(r#"{"snap_tolerance": -1.0}"#).unwrap_err();
    assert!(matches!(err, GraphError::Config { .. }));
    assert!(NetworkConfig::from_json_str("not json").is_err());
}

#[test]
fn test_arc_lookup_by_id() {
    let mut net = Network::planar();
    let a = located(&mut net, 0.0, 0.0);
    let b = located(&mut net, 1.0, 0.0);
    let first = net.add_arc(a, b, PropertyMap::new()).unwrap();
    let second = net.add_arc(b, a, PropertyMap::new().with("name", "back")).unwrap();

    net.delete_arc(0).unwrap();
    assert!(matches!(net.get_arc_by_id(first), Err(GraphError::ArcNotFound { .. })));
    let arc = net.get_arc_by_id(second).unwrap();
    assert_eq!(arc.properties.get_string("name"), Some("back"));
}

#[test]
fn test_non_numeric_weight_falls_back_to_length() {
    let mut net = Network::planar();
    let a = located(&mut net, 0.0, 0.0);
    let b = located(&mut net, 3.0, 4.0);
    let c = located(&mut net, 3.0, 0.0);
    net.add_arc(a, b, PropertyMap::new().with("cost", "slow")).unwrap();
    net.add_arc(a, c, PropertyMap::new().with("cost", 1.5)).unwrap();
    let m = net.rebuild_matrix(Some("cost")).unwrap();
    assert_eq!(m.weight_between(0, 1), Some(5.0));
    assert_eq!(m.weight_between(0, 2), Some(1.5));
}
