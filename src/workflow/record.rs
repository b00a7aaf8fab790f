//! Execution Record
//!
//! The single mutable value threaded through a chain during one run.
//! Each capability receives the record by value and hands it back,
//! so exactly one step owns it at any time.

use std::borrow::Cow;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::capability::CapabilityError;

use super::model::{AdditionalInput, Submission};

/// Result written by the most recent capability.
///
/// Failures stay structured while the run is in flight and are rendered
/// to text only when the record is serialized.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Text(String),
    Failed(CapabilityError),
}

impl StepOutcome {
    /// Renders the outcome the way callers see it.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Failed(err) => Cow::Owned(format!("Error: {}", err)),
        }
    }

    /// Returns true if the capability encoded a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl Serialize for StepOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.render())
    }
}

impl<'de> Deserialize<'de> for StepOutcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::Text)
    }
}

/// State shared by every step of a single run.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ExecutionRecord {
    /// Seed value, set once from the submission
    pub node_input: Option<String>,

    /// Output of the most recently executed capability
    pub node_result: Option<StepOutcome>,

    /// Capability id of the step currently or just executing
    pub node_id: Option<String>,

    /// Display name of the step currently or just executing
    pub node_name: Option<String>,

    /// Side-channel inputs; never modified during a run
    #[serde(default, skip_serializing)]
    pub additional_input: Vec<AdditionalInput>,

    /// Ambient caller identity, injected once
    #[serde(alias = "user_id", default, skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<String>,
}

impl ExecutionRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record for a run of `submission`.
    ///
    /// `node_input` comes from the first step (in submission order) that
    /// carries a non-empty input; side-channel inputs and the caller id
    /// are copied verbatim.
    pub fn seed(submission: &Submission, caller_id: Option<String>) -> Self {
        Self {
            node_input: submission.seed_input().map(str::to_string),
            node_result: None,
            node_id: None,
            node_name: None,
            additional_input: submission.additional_input.clone(),
            caller_id,
        }
    }

    /// Sets the seed input.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.node_input = Some(input.into());
        self
    }

    /// Sets the caller identity.
    pub fn with_caller_id(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }

    /// Returns the value a capability should work on.
    ///
    /// This is the previous result, or the seed input when no result
    /// has been produced yet (or the result is empty). A failed previous
    /// step yields its rendered error text.
    pub fn current_input(&self) -> Option<Cow<'_, str>> {
        let result = self
            .node_result
            .as_ref()
            .map(StepOutcome::render)
            .filter(|text| !text.is_empty());

        result.or_else(|| {
            self.node_input
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(Cow::Borrowed)
        })
    }

    /// Stores a successful result.
    pub fn set_result(&mut self, text: impl Into<String>) {
        self.node_result = Some(StepOutcome::Text(text.into()));
    }

    /// Stores a structured failure.
    pub fn set_failure(&mut self, err: CapabilityError) {
        self.node_result = Some(StepOutcome::Failed(err));
    }

    /// Returns the rendered result, if any.
    pub fn result_text(&self) -> Option<Cow<'_, str>> {
        self.node_result.as_ref().map(StepOutcome::render)
    }

    /// Returns the side-channel input addressed to `capability_id`.
    pub fn additional_input_for(&self, capability_id: &str) -> Option<&str> {
        self.additional_input
            .iter()
            .filter(|extra| extra.capability_id == capability_id)
            .find_map(|extra| extra.input.as_deref().filter(|s| !s.is_empty()))
    }

    /// Returns the side-channel input addressed to the executing step.
    pub fn additional_input_for_current(&self) -> Option<&str> {
        self.node_id
            .as_deref()
            .and_then(|id| self.additional_input_for(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::StepDescriptor;

    #[test]
    fn test_seed_copies_submission_fields() {
        let submission = Submission::from_steps(vec![
            StepDescriptor::new("a", 1),
            StepDescriptor::new("b", 2).with_input("seed"),
        ])
        .with_additional_input(AdditionalInput::new("b", "extra"));

        let record = ExecutionRecord::seed(&submission, Some("user-1".to_string()));

        assert_eq!(record.node_input.as_deref(), Some("seed"));
        assert!(record.node_result.is_none());
        assert_eq!(record.caller_id.as_deref(), Some("user-1"));
        assert_eq!(record.additional_input, submission.additional_input);
    }

    #[test]
    fn test_current_input_prefers_result() {
        let mut record = ExecutionRecord::new().with_input("seed");
        assert_eq!(record.current_input().as_deref(), Some("seed"));

        record.set_result("previous");
        assert_eq!(record.current_input().as_deref(), Some("previous"));
    }

    #[test]
    fn test_current_input_falls_back_on_empty_result() {
        let mut record = ExecutionRecord::new().with_input("seed");
        record.set_result("");
        assert_eq!(record.current_input().as_deref(), Some("seed"));
    }

    #[test]
    fn test_current_input_none() {
        let record = ExecutionRecord::new();
        assert!(record.current_input().is_none());
    }

    #[test]
    fn test_failure_flows_forward_as_text() {
        let mut record = ExecutionRecord::new().with_input("seed");
        record.set_failure(CapabilityError::MissingInput("URL".to_string()));

        let input = record.current_input().unwrap();
        assert!(input.starts_with("Error: "));
        assert!(input.contains("URL"));
    }

    #[test]
    fn test_outcome_serializes_as_string() {
        let mut record = ExecutionRecord::new();
        record.set_failure(CapabilityError::Http("timed out".to_string()));

        let json = serde_json::to_value(&record).unwrap();
        let rendered = json["node_result"].as_str().unwrap();
        assert!(rendered.starts_with("Error: "));
        assert!(rendered.contains("timed out"));
    }

    #[test]
    fn test_additional_input_not_serialized_in_record() {
        let mut record = ExecutionRecord::new();
        record.additional_input.push(AdditionalInput::new("x", "y"));

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("additional_input").is_none());
    }

    #[test]
    fn test_deserialize_user_id_alias() {
        let json = r#"{"node_input": "a", "node_result": "b", "node_id": null, "node_name": null, "user_id": "u"}"#;
        let record: ExecutionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.caller_id.as_deref(), Some("u"));
        assert_eq!(record.node_result, Some(StepOutcome::Text("b".to_string())));
    }

    #[test]
    fn test_additional_input_for_current_step() {
        let mut record = ExecutionRecord::new();
        record.additional_input = vec![
            AdditionalInput::new("mail", ""),
            AdditionalInput::new("mail", "team@example.com"),
            AdditionalInput::new("other", "ignored"),
        ];
        assert!(record.additional_input_for_current().is_none());

        record.node_id = Some("mail".to_string());
        assert_eq!(record.additional_input_for_current(), Some("team@example.com"));
    }
}
