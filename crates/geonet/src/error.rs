//! Error types for geonet operations.
//!
//! All fallible operations return [`Result<T>`]. A route that cannot be found is
//! not an error: it is reported through [`Route::exists`](crate::path::Route).

use thiserror::Error;

/// Result type alias for geonet operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Comprehensive error type for all network operations.
///
/// Precondition violations fail fast and are never retried.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Node not found in the network
    #[error("Node not found: {node_id}")]
    NodeNotFound {
        /// ID of the missing node
        node_id: u64,
    },

    /// Arc not found in the network
    #[error("Arc not found: {arc}")]
    ArcNotFound {
        /// Index or ID of the missing arc
        arc: String,
    },

    /// Arena index outside of the valid range
    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// What was being indexed (node, arc, matrix row)
        kind: &'static str,
        /// Offending index
        index: usize,
        /// Length of the indexed container
        len: usize,
    },

    /// An arc endpoint could not be resolved while rebuilding the neighbor matrix
    #[error("Graph consistency error on arc {arc} ({endpoint} endpoint): {message}")]
    GraphConsistency {
        /// Arc arena index
        arc: usize,
        /// Which endpoint failed ("start" or "end")
        endpoint: &'static str,
        /// Details
        message: String,
    },

    /// Analytics requested while the neighbor matrix is missing or out of date
    #[error("Neighbor matrix is stale; rebuild it before running analytics")]
    StaleMatrix,

    /// A coordinate was required but the node has none
    #[error("Node {node_id} has no coordinate")]
    MissingCoordinate {
        /// ID of the node without coordinate
        node_id: u64,
    },

    /// Operation used on the wrong network variant
    #[error("Wrong network variant: expected {expected}, got {actual}")]
    WrongVariant {
        /// Variant the operation requires
        expected: String,
        /// Variant of the network
        actual: String,
    },

    /// Invalid operation (e.g., negative tolerance, empty input)
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of what went wrong
        message: String,
    },

    /// Configuration could not be parsed or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// Details
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// File I/O error during export or import
    #[error("I/O error: {message}")]
    Io {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl GraphError {
    /// Create a serialization error from a message and optional source.
    pub fn serialization<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Serialization {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create an I/O error from a message and optional source.
    pub fn io<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Io {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Shorthand for [`GraphError::InvalidOperation`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
