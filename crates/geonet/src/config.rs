//! Configuration for network construction, routing, analytics and clustering.
//!
//! Every config is a plain serde struct with sensible defaults and can be loaded
//! from JSON with `from_json_str`.

use crate::error::{GraphError, Result};
use crate::geometry::CoordinateSystem;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

fn parse_json<T: DeserializeOwned>(json: &str, what: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| GraphError::Config {
        message: format!("invalid {what}: {e}"),
    })
}

/// How arc endpoints are resolved when the neighbor matrix is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NetworkVariant {
    /// Endpoints resolved by node ID; unresolvable arcs are skipped
    #[default]
    Plain,
    /// Endpoints resolved by nearest node within the snap tolerance;
    /// unresolvable arcs abort the rebuild
    Geo,
}

impl std::fmt::Display for NetworkVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkVariant::Plain => write!(f, "Plain"),
            NetworkVariant::Geo => write!(f, "Geo"),
        }
    }
}

/// Configuration of a [`Network`](crate::Network).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Store one traversal direction per arc instead of both
    pub directed: bool,

    /// Distance metric for default weights and heuristics
    pub coordinate_system: CoordinateSystem,

    /// Endpoint resolution strategy
    pub variant: NetworkVariant,

    /// Distance under which two coordinates are the same node
    pub snap_tolerance: f64,

    /// Attribute holding the directionality code of source polylines
    /// (1 = both ways, 2 = forward, 3 = backward)
    pub direction_field: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            directed: false,
            coordinate_system: CoordinateSystem::Planar,
            variant: NetworkVariant::Plain,
            snap_tolerance: 1e-6,
            direction_field: "Direction".to_string(),
        }
    }
}

impl NetworkConfig {
    /// Planar, undirected network resolved by node ID.
    pub fn planar() -> Self {
        Self::default()
    }

    /// Geographic (lon/lat) network resolved through the spatial index.
    pub fn geographic() -> Self {
        Self {
            coordinate_system: CoordinateSystem::Geographic,
            variant: NetworkVariant::Geo,
            snap_tolerance: 0.01,
            ..Default::default()
        }
    }

    /// Planar network resolved through the spatial index.
    pub fn planar_geo() -> Self {
        Self {
            variant: NetworkVariant::Geo,
            ..Default::default()
        }
    }

    /// Same configuration, directed.
    pub fn directed(mut self) -> Self {
        self.directed = true;
        self
    }

    /// Load from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = parse_json(json, "network config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the network cannot honor.
    pub fn validate(&self) -> Result<()> {
        if !(self.snap_tolerance >= 0.0) {
            return Err(GraphError::Config {
                message: format!("snap_tolerance must be >= 0, got {}", self.snap_tolerance),
            });
        }
        Ok(())
    }
}

/// Shortest-path strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SearchAlgorithm {
    /// Generic weight-agnostic Dijkstra
    #[default]
    Dijkstra,
    /// A* with straight-line heuristic and goal-admission exit
    AStar,
    /// A* with a bounded, FIFO-evicted open set
    GreedyAStar,
}

/// Configuration for point-to-point routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Node-to-node search used between the snapped entry and exit nodes
    pub algorithm: SearchAlgorithm,

    /// Maximum distance between a query point and the arc it snaps to
    pub tolerance: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            algorithm: SearchAlgorithm::AStar,
            tolerance: 1.0,
        }
    }
}

impl SearchConfig {
    /// Config with the given algorithm and snap tolerance.
    pub fn new(algorithm: SearchAlgorithm, tolerance: f64) -> Self {
        Self {
            algorithm,
            tolerance,
        }
    }

    /// Load from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        parse_json(json, "search config")
    }
}

/// What a random walk accumulates per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WalkMeasure {
    /// Number of arrivals at the node
    #[default]
    Visits,
    /// Summed weight of the arcs used to arrive at the node
    Weight,
}

/// Configuration for centrality analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Attenuation factor of Katz centrality
    pub katz_alpha: f64,

    /// Number of hops per random walk
    pub walk_level: usize,

    /// Seed for random walks; each start node derives its own stream
    pub walk_seed: u64,

    /// Quantity accumulated by random walks
    pub walk_measure: WalkMeasure,

    /// Worker threads for per-node sweeps (None = rayon global pool)
    pub num_threads: Option<usize>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            katz_alpha: 0.1,
            walk_level: 10,
            walk_seed: 42,
            walk_measure: WalkMeasure::Visits,
            num_threads: None,
        }
    }
}

impl AnalyticsConfig {
    /// Load from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        parse_json(json, "analytics config")
    }

    /// Run `op` on a dedicated pool when `num_threads` is set, else on the global pool.
    pub fn install<R, F>(&self, op: F) -> Result<R>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match self.num_threads {
            Some(num_threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .map_err(|e| GraphError::Config {
                        message: format!("Failed to create thread pool: {e}"),
                    })?;
                Ok(pool.install(op))
            }
            None => Ok(op()),
        }
    }
}

/// Configuration for community detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    /// Divisive detection stops once this many components exist
    pub max_components: usize,

    /// Number of agglomerative passes
    pub louvain_passes: usize,

    /// Spatial growth: maximum weight of an absorbed arc, unbounded when `None`
    pub weight_threshold: Option<f64>,

    /// Spatial growth: maximum distance from the running centroid, unbounded when `None`
    pub radius: Option<f64>,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            max_components: 2,
            louvain_passes: 3,
            weight_threshold: None,
            radius: None,
        }
    }
}

impl CommunityConfig {
    /// Load from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        parse_json(json, "community config")
    }
}
