//! Workflow Definition Module
//!
//! Provides the caller-facing submission types, the execution record
//! threaded through a run, and loading/validation of submissions.
//!
//! # Structure
//!
//! - [`model`]: Submission data structures (StepDescriptor, Submission)
//! - [`record`]: The per-run ExecutionRecord
//! - [`parser`]: JSON/YAML loading
//! - [`validator`]: Structural validation

pub mod model;
pub mod parser;
pub mod record;
pub mod validator;

pub use model::{AdditionalInput, StepDescriptor, Submission};
pub use parser::load_submission;
pub use record::{ExecutionRecord, StepOutcome};
pub use validator::validate_submission;
