//! Error types for graph construction and export.

use crate::serializer::DocumentError;

/// Boxed error raised by a traversal driver or project backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for resource graph operations.
///
/// Any error returned from [`ResourceGraph::add`](crate::ResourceGraph::add)
/// aborts the whole build; the graph is restored to its state before the call.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A resource could not be resolved or parsed by the walker.
    #[error("Failed to traverse resource {path}: {source}")]
    Traversal {
        /// Path of the resource that failed to resolve.
        path: String,
        /// Underlying walker or project error, unchanged.
        #[source]
        source: BoxError,
    },

    /// A callback referenced a resource that was never visited.
    ///
    /// Indicates the driver did not pair `visit`/`leave` calls correctly.
    #[error("No node registered for resource {0} (unpaired visitor callback)")]
    NodeNotFound(String),

    /// Two distinct resources normalize to the same canonical path.
    #[error("Distinct resources share the canonical path {0}")]
    PathCollision(String),

    /// `leave` closed an exclusion scope that was never opened.
    #[error("Exclusion scope underflow while leaving {0}")]
    ScopeUnderflow(String),

    /// A traversal finished with exclusion scopes still open.
    #[error("Traversal finished with {0} exclusion scope(s) still open")]
    UnbalancedScope(u32),

    /// Writing the serialized graph failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding the graph document failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A decoded graph document violates its structural invariants.
    #[error("Invalid graph document: {0}")]
    InvalidDocument(#[from] DocumentError),
}

impl GraphError {
    /// Create a traversal error from any error type.
    pub fn traversal<E: Into<BoxError>>(path: impl Into<String>, source: E) -> Self {
        Self::Traversal {
            path: path.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_traversal_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.go");
        let err = GraphError::traversal("/missing.go", io);

        assert!(err.to_string().contains("/missing.go"));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "missing.go");
    }
}
