//! Workflow Execution Engine
//!
//! Runs a compiled chain over one execution record, strictly one step at
//! a time:
//! - [`Engine::run`] runs to completion and returns a [`RunReport`]
//! - [`Engine::run_stream`] returns a lazy [`RunStream`] that executes the
//!   next step only when the caller pulls the next [`Event`]
//!
//! Only an unknown capability id fails a run, and it does so before any
//! step executes. Step failures are stored in the record and the chain
//! keeps going.

use std::io::{self, Write};
use std::iter::FusedIterator;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use serde::Serialize;

use crate::capability::CapabilityRegistry;
use crate::error::EngineError;
use crate::monitoring::{EventType, ExecutionTimeline};
use crate::pipeline::{BoundCapability, CompiledChain, PipelineBuilder};
use crate::workflow::{AdditionalInput, ExecutionRecord, StepDescriptor, StepOutcome, Submission};

use super::normalize::{normalize, Event, RunContext};
use super::step::execute_step;

/// Workflow execution engine.
///
/// Holds the read-only capability registry; every run builds its own
/// chain and record, so one engine can serve many independent runs.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use nodeflow::capability::notify::LogMailer;
/// use nodeflow::capability::CapabilityRegistry;
/// use nodeflow::config::Settings;
/// use nodeflow::execution::Engine;
/// use nodeflow::secrets::EnvSecretStore;
/// use nodeflow::load_submission;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let registry = CapabilityRegistry::standard(
///         &Settings::default(),
///         Arc::new(EnvSecretStore),
///         Arc::new(LogMailer),
///     );
///     let engine = Engine::new(Arc::new(registry));
///
///     let submission = load_submission("flow.yaml")?;
///     for event in engine.run_stream(&submission, Some("user-1".to_string()))? {
///         println!("{}", event.to_json_line()?);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Engine {
    registry: Arc<CapabilityRegistry>,
}

impl Engine {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Compiles the steps into a chain bound to `caller_id`.
    pub fn compile(
        &self,
        steps: &[StepDescriptor],
        caller_id: Option<String>,
    ) -> Result<CompiledChain, EngineError> {
        PipelineBuilder::new(&self.registry)
            .with_caller_id(caller_id)
            .build(steps)
    }

    /// Runs a submission to completion.
    pub fn run(
        &self,
        submission: &Submission,
        caller_id: Option<String>,
    ) -> Result<RunReport, EngineError> {
        let stream = self.run_stream(submission, caller_id)?;
        Ok(stream.into_report())
    }

    /// Starts a streaming run of a submission.
    ///
    /// The chain is compiled up front, so an unknown id is reported here
    /// and no step has run when it is.
    pub fn run_stream(
        &self,
        submission: &Submission,
        caller_id: Option<String>,
    ) -> Result<RunStream<'_>, EngineError> {
        let chain = self.compile(&submission.steps, caller_id.clone())?;
        let seed = ExecutionRecord::seed(submission, caller_id);
        Ok(self.stream_chain(chain, seed))
    }

    /// Runs an already compiled chain and returns the final record.
    ///
    /// An empty chain returns the seed unchanged.
    pub fn run_chain(&self, chain: CompiledChain, seed: ExecutionRecord) -> ExecutionRecord {
        self.stream_chain(chain, seed).finish()
    }

    /// Streams an already compiled chain.
    pub fn stream_chain(&self, chain: CompiledChain, seed: ExecutionRecord) -> RunStream<'_> {
        RunStream::new(&self.registry, chain, seed)
    }
}

/// Lazy sequence of per-step events.
///
/// Each call to `next` executes exactly one step. Dropping the stream
/// leaves the remaining steps unexecuted.
pub struct RunStream<'a> {
    registry: &'a CapabilityRegistry,
    steps: std::vec::IntoIter<BoundCapability>,
    record: ExecutionRecord,
    context: RunContext,
    position: usize,
    timeline: ExecutionTimeline,
}

impl<'a> RunStream<'a> {
    fn new(registry: &'a CapabilityRegistry, chain: CompiledChain, seed: ExecutionRecord) -> Self {
        info!("Starting run of {} steps", chain.len());
        Self {
            registry,
            steps: chain.into_steps().into_iter(),
            context: RunContext::from_seed(&seed),
            record: seed,
            position: 0,
            timeline: ExecutionTimeline::new(),
        }
    }

    /// Steps not executed yet.
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    pub fn timeline(&self) -> &ExecutionTimeline {
        &self.timeline
    }

    /// Runs every remaining step and returns the final record.
    pub fn finish(mut self) -> ExecutionRecord {
        for _ in self.by_ref() {}
        self.record
    }

    /// Runs every remaining step and collects the synchronous result.
    pub fn into_report(mut self) -> RunReport {
        let results: Vec<ExecutionRecord> = self.by_ref().map(|event| event.results).collect();
        info!(
            "Run finished: {} steps, {} degraded, {:.2?}",
            results.len(),
            self.timeline.degraded_count(),
            self.timeline.elapsed()
        );

        RunReport {
            results,
            additional_input: self.context.additional_input,
            timeline: self.timeline,
        }
    }

    /// Writes one JSON line per event as each step completes.
    ///
    /// Returns the number of events written.
    pub fn write_ndjson<W: Write>(&mut self, mut writer: W) -> io::Result<usize> {
        let mut written = 0;
        for event in self.by_ref() {
            serde_json::to_writer(&mut writer, &event)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            written += 1;
        }
        Ok(written)
    }
}

impl Iterator for RunStream<'_> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        let step = self.steps.next()?;
        let position = self.position;
        self.position += 1;

        let label = step.label().to_string();
        info!("Running step {}: {}", position + 1, label);
        self.timeline.add_event(position, label.as_str(), EventType::Started);
        let started = Instant::now();

        let record = std::mem::take(&mut self.record);
        let output = execute_step(&step, record);
        let record = normalize(output, step.descriptor(), &self.context, self.registry);

        let degraded = record
            .node_result
            .as_ref()
            .map_or(false, StepOutcome::is_failure);
        if degraded {
            warn!(
                "Step '{}' degraded: {}",
                label,
                record.result_text().unwrap_or_default()
            );
            self.timeline.add_event(position, label.as_str(), EventType::Degraded);
        } else {
            self.timeline.add_event(position, label.as_str(), EventType::Completed);
        }
        debug!("Step '{}' finished in {:.2?}", label, started.elapsed());

        let event = Event::new(record.clone(), self.context.additional_input.clone());
        self.record = record;
        Some(event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.steps.size_hint()
    }
}

impl ExactSizeIterator for RunStream<'_> {}

impl FusedIterator for RunStream<'_> {}

/// Result of a run to completion: one normalized record per step.
#[derive(Serialize, Debug, Clone)]
pub struct RunReport {
    pub results: Vec<ExecutionRecord>,
    pub additional_input: Vec<AdditionalInput>,
    #[serde(skip)]
    pub timeline: ExecutionTimeline,
}

impl RunReport {
    /// The record after the last step, if any step ran.
    pub fn final_record(&self) -> Option<&ExecutionRecord> {
        self.results.last()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
