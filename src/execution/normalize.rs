//! Event Normalizer
//!
//! Turns a step's raw output into the record seen by the caller: unwraps
//! name-tagged output, back-fills the caller id, restores the submitted
//! side-channel inputs and stamps the originating step's provenance.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::capability::{CapabilityOutput, CapabilityRegistry};
use crate::workflow::{AdditionalInput, ExecutionRecord, StepDescriptor};

/// Session-scoped values shared by every step of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunContext {
    pub caller_id: Option<String>,
    pub additional_input: Vec<AdditionalInput>,
}

impl RunContext {
    /// Takes the session values from a seeded record.
    pub fn from_seed(seed: &ExecutionRecord) -> Self {
        Self {
            caller_id: seed.caller_id.clone(),
            additional_input: seed.additional_input.clone(),
        }
    }
}

/// One normalized emission per completed step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Event {
    pub results: ExecutionRecord,
    pub additional_input: Vec<AdditionalInput>,
}

impl Event {
    pub fn new(results: ExecutionRecord, additional_input: Vec<AdditionalInput>) -> Self {
        Self {
            results,
            additional_input,
        }
    }

    /// Serializes the event as one NDJSON line (without the newline).
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Normalizes a step's output.
///
/// Applying this to an already normalized record for the same step
/// returns it unchanged.
pub fn normalize(
    output: CapabilityOutput,
    descriptor: &StepDescriptor,
    context: &RunContext,
    registry: &CapabilityRegistry,
) -> ExecutionRecord {
    let mut record = match output {
        CapabilityOutput::Record(record) => record,
        CapabilityOutput::Wrapped { name, record } => {
            if !registry.is_known(&name) {
                warn!("Unwrapping output tagged with unknown capability '{}'", name);
            }
            record
        }
    };

    if record.caller_id.is_none() {
        record.caller_id = context.caller_id.clone();
    }
    record.additional_input = context.additional_input.clone();
    record.node_id = Some(descriptor.capability_id.clone());
    record.node_name = Some(descriptor.display_name.clone());
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::FnCapability;

    fn registry() -> CapabilityRegistry {
        CapabilityRegistry::new().register(
            "id-fetch",
            FnCapability::new("fetch", |r: ExecutionRecord| r.into()),
        )
    }

    fn context() -> RunContext {
        RunContext {
            caller_id: Some("user-1".to_string()),
            additional_input: vec![AdditionalInput::new("id-mail", "a@b.c")],
        }
    }

    fn descriptor() -> StepDescriptor {
        StepDescriptor::new("id-fetch", 1).with_display_name("Fetch page")
    }

    #[test]
    fn test_unwraps_and_stamps_provenance() {
        let mut inner = ExecutionRecord::new().with_input("example.com");
        inner.set_result("page");
        inner.node_id = Some("self-reported".to_string());
        inner.node_name = Some("whatever".to_string());

        let record = normalize(
            CapabilityOutput::wrapped("fetch", inner),
            &descriptor(),
            &context(),
            &registry(),
        );

        assert_eq!(record.node_id.as_deref(), Some("id-fetch"));
        assert_eq!(record.node_name.as_deref(), Some("Fetch page"));
        assert_eq!(record.caller_id.as_deref(), Some("user-1"));
        assert_eq!(record.additional_input, context().additional_input);
        assert_eq!(record.result_text().as_deref(), Some("page"));
    }

    #[test]
    fn test_unknown_wrapper_still_unwrapped() {
        let inner = ExecutionRecord::new().with_input("x");
        let record = normalize(
            CapabilityOutput::wrapped("mystery", inner),
            &descriptor(),
            &context(),
            &registry(),
        );
        assert_eq!(record.node_input.as_deref(), Some("x"));
    }

    #[test]
    fn test_restores_submitted_additional_input() {
        let mut inner = ExecutionRecord::new();
        inner.additional_input = vec![AdditionalInput::new("id-mail", "other@example.test")];

        let record = normalize(inner.into(), &descriptor(), &context(), &registry());
        assert_eq!(record.additional_input, context().additional_input);
    }

    #[test]
    fn test_keeps_existing_caller_id() {
        let inner = ExecutionRecord::new().with_caller_id("explicit");
        let record = normalize(inner.into(), &descriptor(), &context(), &registry());
        assert_eq!(record.caller_id.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_idempotent() {
        let mut inner = ExecutionRecord::new().with_input("seed");
        inner.set_result("out");

        let once = normalize(inner.into(), &descriptor(), &context(), &registry());
        let twice = normalize(once.clone().into(), &descriptor(), &context(), &registry());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_event_json_shape() {
        let mut record = ExecutionRecord::new().with_input("seed");
        record.set_result("out");
        let record = normalize(record.into(), &descriptor(), &context(), &registry());

        let event = Event::new(record, context().additional_input);
        let json: serde_json::Value = serde_json::from_str(&event.to_json_line().unwrap()).unwrap();

        assert_eq!(json["results"]["node_result"], "out");
        assert_eq!(json["results"]["node_id"], "id-fetch");
        assert_eq!(json["results"]["caller_id"], "user-1");
        assert!(json["results"].get("additional_input").is_none());
        assert_eq!(json["additional_input"][0]["input"], "a@b.c");
    }
}
