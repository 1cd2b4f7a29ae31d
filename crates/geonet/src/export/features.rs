//! Point and polyline feature collections.
//!
//! Nodes export as points and arcs as two-vertex polylines. Every property key
//! seen on any node (or arc) is promoted to a schema column.

use crate::config::NetworkConfig;
use crate::error::{GraphError, Result};
use crate::geometry::Coordinate;
use crate::graph::{Network, PropertyMap, PropertyValue};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved point column holding the node ID.
pub const NODE_ID_FIELD: &str = "NodeID";
/// Reserved polyline column holding the start node ID.
pub const FROM_NODE_FIELD: &str = "FromNode";
/// Reserved polyline column holding the end node ID.
pub const TO_NODE_FIELD: &str = "ToNode";

/// Column type of an exported attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Integer or floating point values
    Numeric,
    /// String values
    Text,
    /// Everything else, or a column whose values disagree on type
    Binary,
}

impl FieldType {
    /// Column type of a single value; `None` for nulls.
    pub fn of(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Int(_) | PropertyValue::Float(_) => Some(FieldType::Numeric),
            PropertyValue::String(_) => Some(FieldType::Text),
            PropertyValue::Null => None,
            PropertyValue::Bool(_) | PropertyValue::Bytes(_) => Some(FieldType::Binary),
        }
    }
}

/// One schema column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Column name
    pub name: String,
    /// Column type
    pub field_type: FieldType,
}

/// Shape of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// Single position
    Point(Coordinate),
    /// Ordered vertices
    Polyline(Vec<Coordinate>),
}

/// A geometry with its attribute row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Shape, absent for unlocated nodes
    pub geometry: Option<Geometry>,
    /// Attribute row
    pub attributes: PropertyMap,
}

/// Features sharing one schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Schema columns, reserved ones first
    pub fields: Vec<Field>,
    /// Rows
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection holds no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Schema column by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Export every node as a point feature with a `NodeID` column.
pub fn export_points(network: &Network) -> FeatureCollection {
    let features: Vec<Feature> = network
        .nodes()
        .iter()
        .map(|node| {
            let mut attributes = node.properties.clone();
            if attributes.contains_key(NODE_ID_FIELD) {
                warn!("Node {} property {NODE_ID_FIELD} is overwritten on export", node.id);
            }
            attributes.insert(NODE_ID_FIELD, node.id as i64);
            Feature {
                geometry: node.coordinate.map(Geometry::Point),
                attributes,
            }
        })
        .collect();
    let fields = schema(&features, &[NODE_ID_FIELD]);
    debug!("Exported {} points with {} columns", features.len(), fields.len());
    FeatureCollection { fields, features }
}

/// Export every arc as a polyline feature with `FromNode` and `ToNode` columns.
pub fn export_polylines(network: &Network) -> FeatureCollection {
    let features: Vec<Feature> = network
        .arcs()
        .iter()
        .map(|arc| {
            let mut attributes = arc.properties.clone();
            for reserved in [FROM_NODE_FIELD, TO_NODE_FIELD] {
                if attributes.contains_key(reserved) {
                    warn!("Arc {} property {reserved} is overwritten on export", arc.id);
                }
            }
            attributes.insert(FROM_NODE_FIELD, arc.start as i64);
            attributes.insert(TO_NODE_FIELD, arc.end as i64);
            Feature {
                geometry: arc.geometry.map(|(a, b)| Geometry::Polyline(vec![a, b])),
                attributes,
            }
        })
        .collect();
    let fields = schema(&features, &[FROM_NODE_FIELD, TO_NODE_FIELD]);
    debug!("Exported {} polylines with {} columns", features.len(), fields.len());
    FeatureCollection { fields, features }
}

/// Reserved columns first, then every other key in sorted order.
fn schema(features: &[Feature], reserved: &[&str]) -> Vec<Field> {
    let mut seen: BTreeMap<String, Option<FieldType>> = BTreeMap::new();
    for feature in features {
        for (key, value) in feature.attributes.iter() {
            let slot = seen.entry(key.clone()).or_insert(None);
            *slot = match (*slot, FieldType::of(value)) {
                (None, t) => t,
                (Some(a), Some(b)) if a != b => Some(FieldType::Binary),
                (current, _) => current,
            };
        }
    }
    let mut fields: Vec<Field> = reserved
        .iter()
        .map(|&name| Field {
            name: name.to_string(),
            field_type: FieldType::Numeric,
        })
        .collect();
    fields.extend(
        seen.into_iter()
            .filter(|(name, _)| !reserved.contains(&name.as_str()))
            .map(|(name, t)| Field {
                name,
                field_type: t.unwrap_or(FieldType::Binary),
            }),
    );
    fields
}

/// Rebuild a network from exported point and polyline collections.
///
/// Node IDs are kept. Arcs get fresh IDs in polyline order. On a plain network,
/// polylines whose endpoints never appear are kept and skipped at rebuild.
///
/// # Errors
///
/// Returns [`GraphError::InvalidOperation`] if a point lacks `NodeID` or a
/// polyline lacks `FromNode`/`ToNode`.
pub fn import_features(
    config: NetworkConfig,
    points: &FeatureCollection,
    polylines: &FeatureCollection,
) -> Result<Network> {
    let mut network = Network::new(config)?;

    for (i, feature) in points.features.iter().enumerate() {
        let mut attributes = feature.attributes.clone();
        let id = take_id(&mut attributes, NODE_ID_FIELD)
            .ok_or_else(|| GraphError::invalid(format!("point {i} has no {NODE_ID_FIELD}")))?;
        let coordinate = match &feature.geometry {
            Some(Geometry::Point(at)) => Some(*at),
            Some(Geometry::Polyline(_)) => {
                return Err(GraphError::invalid(format!("point {i} has polyline geometry")));
            }
            None => None,
        };
        network.insert_node_with_id(id, coordinate, attributes)?;
    }

    let mut dangling = 0usize;
    for (i, feature) in polylines.features.iter().enumerate() {
        let mut attributes = feature.attributes.clone();
        let (Some(from), Some(to)) = (
            take_id(&mut attributes, FROM_NODE_FIELD),
            take_id(&mut attributes, TO_NODE_FIELD),
        ) else {
            return Err(GraphError::invalid(format!(
                "polyline {i} needs {FROM_NODE_FIELD} and {TO_NODE_FIELD}"
            )));
        };
        let geometry = match &feature.geometry {
            Some(Geometry::Polyline(vertices)) if vertices.len() >= 2 => {
                Some((vertices[0], vertices[vertices.len() - 1]))
            }
            _ => None,
        };
        if network.node_index(from).is_none() || network.node_index(to).is_none() {
            dangling += 1;
        }
        network.push_arc_unchecked(from, to, geometry, attributes);
    }
    if dangling > 0 {
        warn!("Imported {dangling} polylines whose endpoints are not among the points");
    }
    debug!(
        "Imported {} nodes and {} arcs",
        network.node_count(),
        network.arc_count()
    );
    Ok(network)
}

fn take_id(attributes: &mut PropertyMap, key: &str) -> Option<u64> {
    let id = attributes.get_number(key)?;
    attributes.remove(key);
    (id >= 0.0).then_some(id as u64)
}
