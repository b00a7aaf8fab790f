//! Capability Module
//!
//! A capability is a named unit of work that takes the execution record,
//! transforms it, and hands it back. Capabilities own their side effects
//! and encode every failure into the record.
//!
//! # Structure
//!
//! - [`registry`]: id -> name -> capability lookup, plus the standard set
//! - [`http`]: shared HTTP client and HTML-to-text extraction
//! - [`llm`]: chat completion client and per-caller key lookup
//! - [`search`]: HTML web search shared by the research capabilities
//! - [`fetch`], [`summarize`], [`template`], [`notify`], [`feed`],
//!   [`research`], [`topic`], [`weather`], [`editor`]: concrete capabilities

pub mod editor;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod http;
pub mod llm;
pub mod notify;
pub mod registry;
pub mod research;
pub mod search;
pub mod summarize;
pub mod template;
pub mod topic;
pub mod weather;

use log::warn;

use crate::workflow::ExecutionRecord;

pub use error::CapabilityError;
pub use registry::CapabilityRegistry;

/// A unit of work that transforms the execution record.
///
/// Implementations must not panic or return early without handing the
/// record back; failures go into `node_result` via
/// [`ExecutionRecord::set_failure`].
pub trait Capability: Send + Sync {
    /// Name this capability is registered under.
    fn name(&self) -> &str;

    /// Runs the capability over the record.
    fn invoke(&self, record: ExecutionRecord) -> CapabilityOutput;
}

/// What a capability hands back.
///
/// Some capabilities report their record nested under their own name;
/// the event normalizer unwraps that form.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityOutput {
    Record(ExecutionRecord),
    Wrapped { name: String, record: ExecutionRecord },
}

impl CapabilityOutput {
    /// Wraps a record under `name`.
    pub fn wrapped(name: impl Into<String>, record: ExecutionRecord) -> Self {
        Self::Wrapped {
            name: name.into(),
            record,
        }
    }

    /// Returns the record regardless of wrapping.
    pub fn into_record(self) -> ExecutionRecord {
        match self {
            Self::Record(record) | Self::Wrapped { record, .. } => record,
        }
    }
}

impl From<ExecutionRecord> for CapabilityOutput {
    fn from(record: ExecutionRecord) -> Self {
        Self::Record(record)
    }
}

/// Capability backed by a closure.
pub struct FnCapability<F> {
    name: String,
    func: F,
}

impl<F> FnCapability<F>
where
    F: Fn(ExecutionRecord) -> CapabilityOutput + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Capability for FnCapability<F>
where
    F: Fn(ExecutionRecord) -> CapabilityOutput + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, record: ExecutionRecord) -> CapabilityOutput {
        (self.func)(record)
    }
}

/// Runs a text-producing step and stores its outcome in the record.
pub(crate) fn apply<F>(name: &str, mut record: ExecutionRecord, step: F) -> CapabilityOutput
where
    F: FnOnce(&ExecutionRecord) -> Result<String, CapabilityError>,
{
    match step(&record) {
        Ok(text) => record.set_result(text),
        Err(err) => {
            warn!("{} failed: {}", name, err);
            record.set_failure(err);
        }
    }
    record.into()
}
