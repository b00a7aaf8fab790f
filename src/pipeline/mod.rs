//! Pipeline Module
//!
//! Turns a submission's step descriptors into a [`CompiledChain`]: the
//! steps in `seq` order, each resolved to a capability and wrapped with
//! the run's ambient context.
//!
//! Compilation either resolves every step or fails with
//! [`EngineError::UnknownCapability`](crate::error::EngineError) before
//! any capability runs.

pub mod builder;

pub use builder::{BoundCapability, CompiledChain, PipelineBuilder, END, START};
