//! Core network types and storage.
//!
//! This module defines the fundamental building blocks:
//! - [`Node`]: a located or abstract network node
//! - [`Arc`]: a weighted connection between two nodes
//! - [`Network`]: the store owning nodes, arcs and the published neighbor matrix

mod network;
mod property;
mod types;

pub use network::{Network, NodeScores, SharedMatrix};
pub use property::{PropertyMap, PropertyValue};
pub use types::{Arc, ArcId, Direction, Node, NodeId, SYNTHETIC_NODE_ID};
