//! Capability failures.
//!
//! A capability never returns an error to the engine. It stores one of
//! these in the record instead, and the chain keeps running with the
//! rendered text as the next step's input.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("{service} key not found for user")]
    MissingCredential { service: String },

    #[error("request failed: {0}")]
    Http(String),

    #[error("language model call failed: {0}")]
    Llm(String),

    #[error("template generation failed: {0}")]
    Template(String),

    #[error("feed aggregation failed: {0}")]
    Feed(String),

    #[error("notification failed: {0}")]
    Mail(String),

    #[error("capability '{capability}' panicked: {message}")]
    Panicked { capability: String, message: String },
}

impl CapabilityError {
    pub fn missing_credential(service: impl Into<String>) -> Self {
        Self::MissingCredential {
            service: service.into(),
        }
    }
}

impl From<reqwest::Error> for CapabilityError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            CapabilityError::missing_credential("openai").to_string(),
            "openai key not found for user"
        );
        assert_eq!(
            CapabilityError::MissingInput("URL".to_string()).to_string(),
            "missing input: URL"
        );
        let panicked = CapabilityError::Panicked {
            capability: "fetch".to_string(),
            message: "boom".to_string(),
        };
        assert!(panicked.to_string().contains("'fetch' panicked: boom"));
    }
}
