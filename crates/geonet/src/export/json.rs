//! JSON persistence of exported feature collections.

use super::features::{export_points, export_polylines, import_features, FeatureCollection};
use crate::config::NetworkConfig;
use crate::error::{GraphError, Result};
use crate::graph::Network;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// A point layer and a polyline layer stored side by side.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureLayers {
    /// Nodes
    pub points: FeatureCollection,
    /// Arcs
    pub polylines: FeatureCollection,
}

impl FeatureLayers {
    /// Export both layers of `network`.
    pub fn from_network(network: &Network) -> Self {
        Self {
            points: export_points(network),
            polylines: export_polylines(network),
        }
    }

    /// Rebuild a network from both layers.
    pub fn into_network(&self, config: NetworkConfig) -> Result<Network> {
        import_features(config, &self.points, &self.polylines)
    }
}

/// Write `layers` to `path` as pretty-printed JSON.
pub fn write_json(layers: &FeatureLayers, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        GraphError::io(format!("Failed to create JSON file: {}", path.display()), Some(e))
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, layers)
        .map_err(|e| GraphError::serialization("Failed to write feature layers", Some(e)))?;
    writer.flush().map_err(|e| {
        GraphError::io(format!("Failed to flush JSON file: {}", path.display()), Some(e))
    })?;
    info!(
        "Wrote {} points and {} polylines to {}",
        layers.points.len(),
        layers.polylines.len(),
        path.display()
    );
    Ok(())
}

/// Read layers written by [`write_json`].
pub fn read_json(path: &Path) -> Result<FeatureLayers> {
    let file = File::open(path).map_err(|e| {
        GraphError::io(format!("Failed to open JSON file: {}", path.display()), Some(e))
    })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| GraphError::serialization("Failed to parse feature layers", Some(e)))
}

/// Export `network` and write it to `path`.
pub fn save_network(network: &Network, path: &Path) -> Result<()> {
    write_json(&FeatureLayers::from_network(network), path)
}

/// Read `path` and rebuild a network under `config`.
pub fn load_network(config: NetworkConfig, path: &Path) -> Result<Network> {
    read_json(path)?.into_network(config)
}
