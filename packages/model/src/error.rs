//! Error types for the document model

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Unknown mark type: {0}")]
    UnknownMarkType(String),

    #[error("Missing required attribute '{attribute}' on {type_name}")]
    MissingAttribute {
        type_name: String,
        attribute: String,
    },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Leaf node {0} cannot have content")]
    LeafContent(String),

    #[error("Empty text nodes are not allowed")]
    EmptyText,

    #[error("Position {pos} is out of range (content size {size})")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("Invalid range {from}..{to}")]
    InvalidRange { from: usize, to: usize },

    #[error("Replace across node boundaries is not supported ({from}..{to})")]
    CrossesNodeBoundary { from: usize, to: usize },

    #[error("No node starts at position {0}")]
    NoNodeAt(usize),

    #[error("Transaction was created for version {expected} but the state is at version {actual}")]
    StaleTransaction { expected: u64, actual: u64 },
}
