//! Export to, and import from, GIS-style feature collections.
//!
//! - **Features**: nodes as points, arcs as polylines, properties as columns
//! - **JSON**: both layers persisted with serde_json

pub mod features;
pub mod json;

pub use features::{
    export_points, export_polylines, import_features, Feature, FeatureCollection, Field,
    FieldType, Geometry, FROM_NODE_FIELD, NODE_ID_FIELD, TO_NODE_FIELD,
};
pub use json::{load_network, read_json, save_network, write_json, FeatureLayers};
