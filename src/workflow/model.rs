//! Submission Data Model
//!
//! Caller-supplied structures describing a linear workflow: the ordered
//! step descriptors and the side-channel inputs.
//!
//! # Example JSON Format
//!
//! ```json
//! {
//!   "steps": [
//!     { "capability_id": "8c5a1f02-d0cd-4c6d-96b6-51f1bc1f0b17",
//!       "display_name": "Fetch page", "seq": 1, "input": "example.com" },
//!     { "capability_id": "0ff35b88-681c-4c64-94b5-7b74dbfbb471",
//!       "display_name": "Summarize", "seq": 2 }
//!   ],
//!   "additional_input": [
//!     { "capability_id": "6789d23f-1352-4b11-b9a3-2f4f6f96fcd0", "input": "team@example.com" }
//!   ]
//! }
//! ```
//!
//! The field names used by the web client (`graph_flowData`, `node_id`,
//! `node_name`, `node_input`, `node_result`) are accepted as aliases.

use serde::{Deserialize, Serialize};

/// A single step of a submission.
///
/// Descriptors are immutable once submitted. `seq` orders the chain;
/// equal values keep their submission order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StepDescriptor {
    /// Opaque identifier resolved through the capability registry
    #[serde(alias = "node_id")]
    pub capability_id: String,

    /// Caller-facing label echoed back on every event
    #[serde(alias = "node_name", default)]
    pub display_name: String,

    /// Position of this step in the chain
    pub seq: i64,

    /// Seed value for the run (only the first non-empty one is used)
    #[serde(alias = "node_input", default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Result carried over from an earlier run, kept for the caller
    #[serde(alias = "node_result", default, skip_serializing_if = "Option::is_none")]
    pub prior_result: Option<String>,
}

impl StepDescriptor {
    /// Creates a descriptor with the given capability id and sequence number.
    ///
    /// The id is kept verbatim, exactly as a deserialized submission keeps it.
    ///
    /// # Example
    ///
    /// ```
    /// use nodeflow::workflow::StepDescriptor;
    ///
    /// let step = StepDescriptor::new("fetch", 1)
    ///     .with_display_name("Fetch page")
    ///     .with_input("example.com");
    /// assert_eq!(step.input.as_deref(), Some("example.com"));
    /// ```
    pub fn new(capability_id: impl Into<String>, seq: i64) -> Self {
        Self {
            capability_id: capability_id.into(),
            display_name: String::new(),
            seq,
            input: None,
            prior_result: None,
        }
    }

    /// Sets the caller-facing label.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Sets the seed input carried by this step.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Sets the prior result carried by this step.
    pub fn with_prior_result(mut self, result: impl Into<String>) -> Self {
        self.prior_result = Some(result.into());
        self
    }

    /// Returns the input if it is present and non-empty.
    pub fn seed_input(&self) -> Option<&str> {
        self.input.as_deref().filter(|s| !s.is_empty())
    }
}

/// Secondary, non-chained input addressed to one capability id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AdditionalInput {
    #[serde(alias = "node_id")]
    pub capability_id: String,

    #[serde(alias = "node_input", default)]
    pub input: Option<String>,
}

impl AdditionalInput {
    pub fn new(capability_id: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            capability_id: capability_id.into(),
            input: Some(input.into()),
        }
    }
}

/// A complete submission: the steps plus the side-channel list.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    /// Steps in submission order (not necessarily `seq` order)
    #[serde(alias = "graph_flowData")]
    pub steps: Vec<StepDescriptor>,

    /// Side-channel inputs, passed through untouched
    #[serde(default)]
    pub additional_input: Vec<AdditionalInput>,
}

impl Submission {
    /// Creates a submission from a list of steps.
    pub fn from_steps(steps: Vec<StepDescriptor>) -> Self {
        Self {
            steps,
            additional_input: Vec::new(),
        }
    }

    /// Adds a side-channel input.
    pub fn with_additional_input(mut self, extra: AdditionalInput) -> Self {
        self.additional_input.push(extra);
        self
    }

    /// Returns the first non-empty step input, in submission order.
    pub fn seed_input(&self) -> Option<&str> {
        self.steps.iter().find_map(|s| s.seed_input())
    }

    /// Returns the number of steps in the submission.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the submission has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
