//! Error Types
//!
//! Errors that cross the engine boundary. Failures inside a capability
//! never appear here; they are stored in the execution record instead
//! (see [`crate::capability::CapabilityError`]).

use std::path::PathBuf;

use thiserror::Error;

use crate::workflow::validator::ValidationError;

/// Hard errors raised by the engine before any step executes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A step's capability id is not registered.
    #[error("Unknown capability: '{capability_id}'")]
    UnknownCapability { capability_id: String },

    /// A capability name has no registered implementation.
    #[error("Unknown capability name: '{name}'")]
    UnknownCapabilityName { name: String },
}

/// Errors raised while loading a settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings at '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors raised while loading or validating a submission file.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Failed to read submission file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse submission JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse submission YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{}", format_validation(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
