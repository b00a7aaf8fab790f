//! Workflow Execution Module
//!
//! Runs compiled chains over an execution record.
//!
//! # Architecture
//!
//! - [`engine`]: synchronous and streaming executors
//! - [`step`]: guarded invocation of one step
//! - [`normalize`]: turns raw step output into caller-facing events

pub mod engine;
pub mod normalize;
pub mod step;

pub use engine::{Engine, RunReport, RunStream};
pub use normalize::{Event, RunContext};
