//! Editor errors.

use plutis_core::ShapeId;
use thiserror::Error;

/// Errors raised by the editor and its controllers.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The canvas was released by `destroy()`.
    #[error("Editor has been destroyed")]
    Destroyed,
    #[error("State is already bound to an editor")]
    AlreadyBound,
    #[error("Object not found: {0}")]
    ObjectNotFound(ShapeId),
    #[error("Object is not a group: {0}")]
    NotAGroup(ShapeId),
    #[error("Invalid group: {0}")]
    InvalidGroup(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for editor operations.
pub type Result<T> = std::result::Result<T, EditorError>;
