//! Error types for the extension manager

use plume_model::ModelError;
use std::fmt;
use thiserror::Error;

pub type PlumeResult<T> = Result<T, PlumeError>;

/// One unmet `required_extensions` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingRequirement {
    /// Name of the extension declaring the requirement
    pub extension: String,
    /// Type name of the missing extension
    pub required: String,
}

impl fmt::Display for MissingRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} requires {}", self.extension, self.required)
    }
}

#[derive(Error, Debug)]
pub enum PlumeError {
    #[error("Construction error: {0}")]
    Construction(String),

    #[error("Duplicate {kind} name '{name}' (registered by {first} and {second})")]
    DuplicateName {
        kind: &'static str,
        name: String,
        first: String,
        second: String,
    },

    #[error("'{name}' is a reserved {kind} name")]
    ReservedName { kind: &'static str, name: String },

    #[error("Missing required extensions: {}", join_missing(.0))]
    MissingRequiredExtension(Vec<MissingRequirement>),

    #[error("Phase error: {0}")]
    Phase(String),

    #[error("Invalid option update for {extension}: '{key}' is not a dynamic option")]
    InvalidOptionUpdate { extension: String, key: String },

    #[error("Unknown extension: {0}")]
    UnknownExtension(String),

    #[error("Failed to deserialize: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

fn join_missing(missing: &[MissingRequirement]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while running commands and helpers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unknown helper: {0}")]
    UnknownHelper(String),

    #[error("Command '{0}' dispatched a transaction other than the chained one")]
    ForeignTransaction(String),

    #[error("Invalid arguments for '{name}': {message}")]
    InvalidArguments { name: String, message: String },

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_requirement_message_names_both_sides() {
        let err = PlumeError::MissingRequiredExtension(vec![
            MissingRequirement {
                extension: "heading".to_string(),
                required: "ParagraphExtension".to_string(),
            },
            MissingRequirement {
                extension: "link".to_string(),
                required: "BoldExtension".to_string(),
            },
        ]);

        let message = err.to_string();
        assert!(message.contains("heading requires ParagraphExtension"));
        assert!(message.contains("link requires BoldExtension"));
    }
}
