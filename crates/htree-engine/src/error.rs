//! Error types for the engine
//!
//! Ingestion itself has no fatal conditions: malformed or unrecognized input
//! degrades to "skip and continue". These errors cover the explicit
//! operations a caller invokes on the session (edits and restarts).

use htree_model::ModelError;

/// Engine error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Edit or restart named a node that was never promoted
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Restart requested while nothing has been ingested
    #[error("cannot restart from an empty tree")]
    EmptyTree,

    /// Invalid model value
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
