//! Main `Network` interface: node/arc storage, mutation and matrix publication.

use super::property::{PropertyMap, PropertyValue};
use super::types::{Arc, ArcId, Node, NodeId};
use crate::config::{NetworkConfig, NetworkVariant, SearchAlgorithm, SearchConfig};
use crate::error::{GraphError, Result};
use crate::geometry::{self, Coordinate};
use crate::matrix::{self, NeighborMatrix};
use crate::path::{self, Route};
use crate::spatial::SpatialIndex;
use log::{debug, info, trace};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared handle to a published neighbor matrix.
pub type SharedMatrix = std::sync::Arc<NeighborMatrix>;

/// Typed per-node analytics result keyed by node ID.
pub type NodeScores = HashMap<NodeId, f64>;

/// A weighted network of located or abstract nodes.
///
/// Nodes live in an arena addressed by index, with an explicit ID→index map;
/// every algorithm works on indices and reports IDs. Structural mutation needs
/// `&mut self`, so one writer excludes all readers. The neighbor matrix is
/// published copy-and-swap: readers holding a [`SharedMatrix`] keep a complete
/// version while a rebuild installs the next one.
pub struct Network {
    config: NetworkConfig,
    // Monotonic ID counters
    node_counter: NodeId,
    arc_counter: ArcId,
    // Arenas and lookup maps
    nodes: Vec<Node>,
    node_ids: HashMap<NodeId, usize>,
    arcs: Vec<Arc>,
    arc_ids: HashMap<ArcId, usize>,
    spatial: SpatialIndex,
    // Published adjacency
    matrix: RwLock<Option<SharedMatrix>>,
    dirty: AtomicBool,
}

impl Network {
    /// Create an empty network.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] if the configuration is invalid.
    pub fn new(config: NetworkConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            "Creating network: variant={}, system={}, directed={}",
            config.variant, config.coordinate_system, config.directed
        );
        Ok(Self::with_valid_config(config))
    }

    /// Create an empty planar, undirected, ID-resolved network.
    pub fn planar() -> Self {
        Self::with_valid_config(NetworkConfig::planar())
    }

    /// Create an empty geographic network resolved through the spatial index.
    pub fn geographic() -> Self {
        Self::with_valid_config(NetworkConfig::geographic())
    }

    fn with_valid_config(config: NetworkConfig) -> Self {
        Self {
            config,
            node_counter: 1,
            arc_counter: 1,
            nodes: Vec::new(),
            node_ids: HashMap::new(),
            arcs: Vec::new(),
            arc_ids: HashMap::new(),
            spatial: SpatialIndex::new(),
            matrix: RwLock::new(None),
            dirty: AtomicBool::new(true),
        }
    }

    /// Network configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Whether arcs are one-way.
    pub fn is_directed(&self) -> bool {
        self.config.directed
    }

    // ===== Nodes =====

    /// Add a node without a position.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::WrongVariant`] on a geo network, whose nodes must be located.
    pub fn add_node(&mut self, properties: PropertyMap) -> Result<NodeId> {
        if self.config.variant == NetworkVariant::Geo {
            return Err(GraphError::WrongVariant {
                expected: "located node".to_string(),
                actual: "node without coordinate".to_string(),
            });
        }
        let id = self.next_node_id();
        Ok(self.push_node(Node::new(id, None, properties)))
    }

    /// Add a node at `coordinate`.
    pub fn add_node_at(&mut self, coordinate: Coordinate, properties: PropertyMap) -> Result<NodeId> {
        let id = self.next_node_id();
        Ok(self.push_node(Node::new(id, Some(coordinate), properties)))
    }

    /// Re-insert a node under an explicit ID (used by import).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] if the ID is reserved or taken.
    pub fn insert_node_with_id(
        &mut self,
        id: NodeId,
        coordinate: Option<Coordinate>,
        properties: PropertyMap,
    ) -> Result<NodeId> {
        if id == super::types::SYNTHETIC_NODE_ID || self.node_ids.contains_key(&id) {
            return Err(GraphError::invalid(format!("node ID {id} is reserved or in use")));
        }
        if coordinate.is_none() && self.config.variant == NetworkVariant::Geo {
            return Err(GraphError::MissingCoordinate { node_id: id });
        }
        self.node_counter = self.node_counter.max(id + 1);
        Ok(self.push_node(Node::new(id, coordinate, properties)))
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        let index = self.nodes.len();
        debug!("Adding node: id={id}, index={index}");
        if let Some(at) = node.coordinate {
            self.spatial.insert_node(index, at);
        }
        self.nodes.push(node);
        self.node_ids.insert(id, index);
        self.mark_dirty();
        id
    }

    /// Get a node by ID.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node doesn't exist.
    pub fn get_node(&self, id: NodeId) -> Result<&Node> {
        self.node_index(id)
            .map(|i| &self.nodes[i])
            .ok_or(GraphError::NodeNotFound { node_id: id })
    }

    /// Arena index of a node ID.
    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        self.node_ids.get(&id).copied()
    }

    /// Arena index of a node ID, failing when absent.
    pub fn require_index(&self, id: NodeId) -> Result<usize> {
        self.node_index(id)
            .ok_or(GraphError::NodeNotFound { node_id: id })
    }

    /// Node at an arena index.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::IndexOutOfRange`] for an invalid index.
    pub fn node_at(&self, index: usize) -> Result<&Node> {
        self.nodes.get(index).ok_or(GraphError::IndexOutOfRange {
            kind: "node",
            index,
            len: self.nodes.len(),
        })
    }

    /// Position of the node at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MissingCoordinate`] if the node is unlocated.
    pub fn coordinate(&self, index: usize) -> Result<Coordinate> {
        let node = self.node_at(index)?;
        node.coordinate
            .ok_or(GraphError::MissingCoordinate { node_id: node.id })
    }

    /// Distance between two nodes under the network's coordinate system.
    pub fn distance_between(&self, a: usize, b: usize) -> Result<f64> {
        let (ca, cb) = (self.coordinate(a)?, self.coordinate(b)?);
        Ok(geometry::distance(self.config.coordinate_system, &ca, &cb))
    }

    /// Set a node property. Node properties never affect weights.
    pub fn set_node_property(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        let index = self.require_index(id)?;
        self.nodes[index].set_property(key, value);
        Ok(())
    }

    /// Move a node.
    ///
    /// Plain networks refresh the geometry of incident arcs. Geo networks keep the
    /// arcs' source geometry, so the next rebuild re-resolves them spatially.
    pub fn set_node_coordinate(&mut self, id: NodeId, coordinate: Coordinate) -> Result<()> {
        let index = self.require_index(id)?;
        debug!("Moving node {id} to ({}, {})", coordinate.x, coordinate.y);
        self.nodes[index].coordinate = Some(coordinate);
        if self.config.variant == NetworkVariant::Plain {
            for arc_index in 0..self.arcs.len() {
                if self.arcs[arc_index].touches(id) {
                    self.arcs[arc_index].geometry = self.segment_between(
                        self.arcs[arc_index].start,
                        self.arcs[arc_index].end,
                    );
                }
            }
        }
        self.rebuild_spatial_index();
        self.mark_dirty();
        Ok(())
    }

    /// Delete a node and every arc touching it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node doesn't exist.
    pub fn delete_node(&mut self, id: NodeId) -> Result<Node> {
        debug!("Deleting node: id={id}");
        let index = self.require_index(id)?;

        let before = self.arcs.len();
        self.arcs.retain(|arc| !arc.touches(id));
        trace!("Deleted {} incident arcs of node {}", before - self.arcs.len(), id);

        let node = self.nodes.remove(index);
        self.reindex();
        self.mark_dirty();
        Ok(node)
    }

    // ===== Arcs =====

    /// Add an arc between two existing nodes.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if either endpoint doesn't exist.
    pub fn add_arc(&mut self, start: NodeId, end: NodeId, properties: PropertyMap) -> Result<ArcId> {
        debug!("Adding arc: start={start}, end={end}");
        self.get_node(start)?;
        self.get_node(end)?;
        let geometry = self.segment_between(start, end);
        Ok(self.push_arc(start, end, geometry, properties))
    }

    /// Add an arc without checking its endpoints (used by import).
    ///
    /// Plain networks skip such arcs at rebuild if an endpoint never appears.
    pub(crate) fn push_arc_unchecked(
        &mut self,
        start: NodeId,
        end: NodeId,
        geometry: Option<(Coordinate, Coordinate)>,
        properties: PropertyMap,
    ) -> ArcId {
        self.push_arc(start, end, geometry, properties)
    }

    fn push_arc(
        &mut self,
        start: NodeId,
        end: NodeId,
        geometry: Option<(Coordinate, Coordinate)>,
        properties: PropertyMap,
    ) -> ArcId {
        let id = self.next_arc_id();
        let index = self.arcs.len();
        if let Some((a, b)) = geometry {
            self.spatial.insert_arc(index, a, b);
        }
        self.arcs
            .push(Arc::new(id, start, end, geometry, properties));
        self.arc_ids.insert(id, index);
        self.mark_dirty();
        id
    }

    fn segment_between(&self, start: NodeId, end: NodeId) -> Option<(Coordinate, Coordinate)> {
        let a = self.get_node(start).ok()?.coordinate?;
        let b = self.get_node(end).ok()?.coordinate?;
        Some((a, b))
    }

    /// Arc at an arena index.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::IndexOutOfRange`] for an invalid index.
    pub fn get_arc(&self, index: usize) -> Result<&Arc> {
        self.arcs.get(index).ok_or(GraphError::IndexOutOfRange {
            kind: "arc",
            index,
            len: self.arcs.len(),
        })
    }

    /// Arena index of an arc ID.
    pub fn arc_index(&self, id: ArcId) -> Option<usize> {
        self.arc_ids.get(&id).copied()
    }

    /// Arc by its stable ID.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ArcNotFound`] if no arc carries `id`.
    pub fn get_arc_by_id(&self, id: ArcId) -> Result<&Arc> {
        self.arc_index(id)
            .map(|i| &self.arcs[i])
            .ok_or_else(|| GraphError::ArcNotFound { arc: id.to_string() })
    }

    /// Set an arc property. Marks the matrix stale since weights may change.
    pub fn set_arc_property(
        &mut self,
        index: usize,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        self.get_arc(index)?;
        self.arcs[index].set_property(key, value);
        self.mark_dirty();
        Ok(())
    }

    /// Delete the arc at `index`.
    pub fn delete_arc(&mut self, index: usize) -> Result<Arc> {
        self.get_arc(index)?;
        debug!("Deleting arc: index={index}");
        let arc = self.arcs.remove(index);
        self.reindex();
        self.mark_dirty();
        Ok(arc)
    }

    /// All nodes in arena order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All arcs in arena order.
    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    /// Get the total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the total number of arcs.
    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// Write a typed per-node result onto node properties under `key`.
    ///
    /// Nodes absent from `scores` are left untouched.
    pub fn annotate_nodes(&mut self, key: &str, scores: &NodeScores) -> Result<()> {
        for (&id, &score) in scores {
            let index = self.require_index(id)?;
            self.nodes[index].set_property(key, score);
        }
        Ok(())
    }

    // ===== Spatial index =====

    /// Spatial index over node positions and arc segments.
    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.spatial
    }

    /// Rebuild the spatial index from scratch.
    pub fn rebuild_spatial_index(&mut self) {
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.coordinate.map(|c| (i, c)));
        let arcs = self
            .arcs
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.geometry.map(|(s, e)| (i, s, e)));
        self.spatial = SpatialIndex::build(nodes, arcs);
        trace!(
            "Spatial index rebuilt: {} nodes, {} arcs",
            self.spatial.node_len(),
            self.spatial.arc_len()
        );
    }

    // ===== Neighbor matrix =====

    /// Build a new matrix under `weight_field` and publish it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::GraphConsistency`] on a geo network when an arc
    /// endpoint cannot be resolved; the previously published matrix stays stale.
    pub fn rebuild_matrix(&self, weight_field: Option<&str>) -> Result<SharedMatrix> {
        let built = std::sync::Arc::new(matrix::build(self, weight_field)?);
        *self.matrix.write() = Some(built.clone());
        self.dirty.store(false, Ordering::Release);
        info!(
            "Neighbor matrix rebuilt: {} nodes, {} arcs",
            self.nodes.len(),
            self.arcs.len()
        );
        Ok(built)
    }

    /// Current matrix, rebuilt first if stale or built under another field.
    pub fn ensure_matrix(&self, weight_field: Option<&str>) -> Result<SharedMatrix> {
        if !self.is_matrix_stale() {
            if let Some(current) = self.matrix.read().as_ref() {
                if current.weight_field() == weight_field {
                    return Ok(current.clone());
                }
            }
        }
        self.rebuild_matrix(weight_field)
    }

    /// Current matrix.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StaleMatrix`] if it was never built or a mutation
    /// happened since the last rebuild.
    pub fn neighbor_matrix(&self) -> Result<SharedMatrix> {
        if self.is_matrix_stale() {
            return Err(GraphError::StaleMatrix);
        }
        self.matrix.read().clone().ok_or(GraphError::StaleMatrix)
    }

    /// Whether a rebuild is required before analytics may read the matrix.
    pub fn is_matrix_stale(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    // ===== Routing =====

    /// Shortest route between two nodes with the chosen algorithm.
    ///
    /// Uses the current matrix; rebuild it first after mutations.
    pub fn solve_path(&self, start: NodeId, end: NodeId, algorithm: SearchAlgorithm) -> Result<Route> {
        let matrix = self.neighbor_matrix()?;
        path::solve_between_nodes(self, &matrix, start, end, algorithm)
    }

    /// Greedy A* route between two nodes.
    pub fn greedy_solve_path(&self, start: NodeId, end: NodeId) -> Result<Route> {
        self.solve_path(start, end, SearchAlgorithm::GreedyAStar)
    }

    /// Route between two arbitrary coordinates snapped onto the nearest arcs.
    pub fn solve_path_between(
        &self,
        start: &Coordinate,
        end: &Coordinate,
        search: &SearchConfig,
    ) -> Result<Route> {
        let matrix = self.neighbor_matrix()?;
        path::stitch::solve_between_points(self, &matrix, start, end, search)
    }

    /// Greedy A* route between two arbitrary coordinates.
    pub fn greedy_solve_path_between(
        &self,
        start: &Coordinate,
        end: &Coordinate,
        tolerance: f64,
    ) -> Result<Route> {
        let search = SearchConfig::new(SearchAlgorithm::GreedyAStar, tolerance);
        self.solve_path_between(start, end, &search)
    }

    // Private helper methods

    fn next_node_id(&mut self) -> NodeId {
        let id = self.node_counter;
        self.node_counter += 1;
        id
    }

    fn next_arc_id(&mut self) -> ArcId {
        let id = self.arc_counter;
        self.arc_counter += 1;
        id
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Recompute lookup maps and the spatial index after an arena removal.
    fn reindex(&mut self) {
        self.node_ids = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, i))
            .collect();
        self.arc_ids = self
            .arcs
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id, i))
            .collect();
        self.rebuild_spatial_index();
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("config", &self.config)
            .field("nodes", &self.nodes.len())
            .field("arcs", &self.arcs.len())
            .field("stale", &self.is_matrix_stale())
            .finish()
    }
}
