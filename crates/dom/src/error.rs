//! Error types for DOM operations
//!
//! Simple, flat error hierarchy. No over-engineering.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(u32),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error("Document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Node {child} cannot be appended to {parent}: {reason}")]
    InvalidAppend {
        parent: u32,
        child: u32,
        reason: &'static str,
    },
}
