//! # geonet
//!
//! Weighted geographic networks: storage, routing, centrality and community detection.
//!
//! ## Core Principles
//!
//! - **Typed results**: analytics return maps keyed by node ID, never hidden node state
//! - **Explicit staleness**: mutations mark the neighbor matrix stale; analytics refuse stale data
//! - **Copy-and-swap**: readers keep a complete matrix while a rebuild publishes the next one
//! - **Missing routes are values**: `Route::exists == false`, not an error
//!
//! ## Architecture
//!
//! ```text
//! Builders (polylines, point sets, feature import)
//!     ↓
//! Network (nodes, arcs, spatial index)
//!     ↓
//! NeighborMatrix (published, read-only adjacency)
//!     ↓
//! Routing / Analytics / Community detection
//! ```
//!
//! ## Example
//!
//! ```rust
//! use geonet::{Coordinate, Network, PropertyMap, SearchAlgorithm};
//!
//! let mut network = Network::planar();
//! let a = network.add_node_at(Coordinate::new(0.0, 0.0), PropertyMap::new()).unwrap();
//! let b = network.add_node_at(Coordinate::new(3.0, 4.0), PropertyMap::new()).unwrap();
//! network.add_arc(a, b, PropertyMap::new()).unwrap();
//!
//! // Weights default to arc length
//! network.rebuild_matrix(None).unwrap();
//! let route = network.solve_path(a, b, SearchAlgorithm::Dijkstra).unwrap();
//! assert!(route.exists);
//! assert_eq!(route.impedance, 5.0);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod analytics;
pub mod builder;
pub mod community;
pub mod config;
pub mod delaunay;
pub mod error;
pub mod export;
pub mod geometry;
pub mod graph;
pub mod matrix;
pub mod path;
pub mod spatial;

// Re-export main types
pub use builder::{build_network, PolylineFeature};
pub use community::{CommunityResult, NodeCluster, Partition};
pub use config::{
    AnalyticsConfig, CommunityConfig, NetworkConfig, NetworkVariant, SearchAlgorithm,
    SearchConfig, WalkMeasure,
};
pub use delaunay::{DelaunayLinker, LinkType};
pub use error::{GraphError, Result};
pub use export::{FeatureCollection, FieldType};
pub use geometry::{Coordinate, CoordinateSystem};
pub use graph::{
    Arc, ArcId, Direction, Network, Node, NodeId, NodeScores, PropertyMap, PropertyValue,
    SharedMatrix,
};
pub use matrix::{Neighbor, NeighborMatrix};
pub use path::{Route, Waypoint};
pub use spatial::SpatialIndex;
