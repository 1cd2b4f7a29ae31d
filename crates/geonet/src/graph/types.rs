//! Core network types: nodes, arcs, IDs, and enums.

use super::property::{PropertyMap, PropertyValue};
use crate::geometry::Coordinate;
use serde::{Deserialize, Serialize};

/// Stable node identifier (monotonic counter starting at 1, never reused).
///
/// ID 0 is reserved for synthetic route waypoints.
pub type NodeId = u64;

/// Stable arc identifier (monotonic counter starting at 1, never reused).
pub type ArcId = u64;

/// ID carried by synthetic waypoints spliced onto stitched routes.
pub const SYNTHETIC_NODE_ID: NodeId = 0;

/// Direction for degree and neighbor queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Follow outgoing arcs (from this node)
    Outgoing,
    /// Follow incoming arcs (to this node)
    Incoming,
    /// Follow arcs in both directions
    Both,
}

/// A node of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier (assigned by the network)
    pub id: NodeId,
    /// Optional 2D or 3D position
    pub coordinate: Option<Coordinate>,
    /// Open attribute map
    pub properties: PropertyMap,
}

impl Node {
    /// Create a new node (ID is assigned by the network).
    pub fn new(id: NodeId, coordinate: Option<Coordinate>, properties: PropertyMap) -> Self {
        Self {
            id,
            coordinate,
            properties,
        }
    }

    /// Add or update a property.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key, value);
    }

    /// Get a property value.
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

/// An arc between two nodes, referenced by node ID.
///
/// In a directed network the arc is traversable from `start` to `end` only.
/// Geometry is the straight segment between the endpoint coordinates, captured
/// when the arc is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    /// Unique identifier (assigned by the network)
    pub id: ArcId,
    /// Start node ID
    pub start: NodeId,
    /// End node ID
    pub end: NodeId,
    /// Segment geometry, when both endpoints had coordinates
    pub geometry: Option<(Coordinate, Coordinate)>,
    /// Open attribute map
    pub properties: PropertyMap,
}

impl Arc {
    /// Create a new arc (ID is assigned by the network).
    pub fn new(
        id: ArcId,
        start: NodeId,
        end: NodeId,
        geometry: Option<(Coordinate, Coordinate)>,
        properties: PropertyMap,
    ) -> Self {
        Self {
            id,
            start,
            end,
            geometry,
            properties,
        }
    }

    /// Add or update a property.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key, value);
    }

    /// Get a property value.
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Whether the arc touches `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.start == node || self.end == node
    }
}
