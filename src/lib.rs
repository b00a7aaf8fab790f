//! NodeFlow - Linear Workflow Engine
//!
//! Executes caller-submitted chains of content capabilities (page fetch,
//! summarization, templating, news aggregation, research, mail) over a
//! single execution record, either to completion or as a live stream of
//! per-step events.
//!
//! # Architecture
//!
//! - [`workflow`]: submission types, the execution record, loading and validation
//! - [`capability`]: the capability trait, registry and standard capabilities
//! - [`pipeline`]: compiles step descriptors into an ordered chain
//! - [`execution`]: synchronous and streaming executors, event normalization
//! - [`secrets`]: per-caller credential lookup
//! - [`monitoring`]: per-run step timeline
//! - [`config`]: endpoints, models and timeouts
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nodeflow::capability::notify::LogMailer;
//! use nodeflow::capability::CapabilityRegistry;
//! use nodeflow::config::Settings;
//! use nodeflow::secrets::EnvSecretStore;
//! use nodeflow::{load_submission, Engine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load(None)?;
//!     let registry = CapabilityRegistry::standard(
//!         &settings,
//!         Arc::new(EnvSecretStore),
//!         Arc::new(LogMailer),
//!     );
//!
//!     let submission = load_submission("flow.json")?;
//!     let engine = Engine::new(Arc::new(registry));
//!     let report = engine.run(&submission, Some("user-1".to_string()))?;
//!
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!     Ok(())
//! }
//! ```

pub mod capability;
pub mod config;
pub mod error;
pub mod execution;
pub mod monitoring;
pub mod pipeline;
pub mod secrets;
pub mod workflow;

// Re-export commonly used types
pub use capability::{Capability, CapabilityError, CapabilityOutput, CapabilityRegistry};
pub use error::{ConfigError, EngineError, SubmissionError};
pub use execution::{Engine, Event, RunReport, RunStream};
pub use workflow::model::{AdditionalInput, StepDescriptor, Submission};
pub use workflow::parser::load_submission;
pub use workflow::record::{ExecutionRecord, StepOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "NodeFlow";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "NodeFlow");
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
        for part in parts {
            assert!(part.parse::<u32>().is_ok(), "Version components should be numeric");
        }
    }

    #[test]
    fn test_module_exports_descriptor() {
        let step = StepDescriptor::new("fetch", 1).with_input("example.com");
        let submission = Submission::from_steps(vec![step]);
        assert_eq!(submission.seed_input(), Some("example.com"));
    }
}
