//! Chain compilation.

use std::fmt;
use std::sync::Arc;

use log::{debug, info};

use crate::capability::{Capability, CapabilityOutput, CapabilityRegistry};
use crate::error::EngineError;
use crate::workflow::{ExecutionRecord, StepDescriptor};

/// Virtual node before the first step.
pub const START: &str = "__start__";

/// Virtual node after the last step.
pub const END: &str = "__end__";

/// A resolved step with the ambient context bound in.
#[derive(Clone)]
pub struct BoundCapability {
    descriptor: StepDescriptor,
    capability: Arc<dyn Capability>,
    caller_id: Option<String>,
}

impl BoundCapability {
    pub fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    /// Registered name of the underlying capability.
    pub fn name(&self) -> &str {
        self.capability.name()
    }

    /// Display name, falling back to the capability name.
    pub fn label(&self) -> &str {
        if self.descriptor.display_name.is_empty() {
            self.capability.name()
        } else {
            &self.descriptor.display_name
        }
    }

    pub fn caller_id(&self) -> Option<&str> {
        self.caller_id.as_deref()
    }

    /// Invokes the capability with the ambient context applied.
    ///
    /// The caller id is injected only when the record does not carry one,
    /// and the step's provenance fields are set before the call so the
    /// capability can address its side-channel input.
    pub fn invoke(&self, mut record: ExecutionRecord) -> CapabilityOutput {
        if record.caller_id.is_none() {
            record.caller_id = self.caller_id.clone();
        }
        record.node_id = Some(self.descriptor.capability_id.clone());
        record.node_name = Some(self.descriptor.display_name.clone());
        self.capability.invoke(record)
    }
}

impl fmt::Debug for BoundCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundCapability")
            .field("capability_id", &self.descriptor.capability_id)
            .field("name", &self.capability.name())
            .field("seq", &self.descriptor.seq)
            .finish()
    }
}

/// Linear chain of bound capabilities in execution order.
#[derive(Debug, Clone, Default)]
pub struct CompiledChain {
    steps: Vec<BoundCapability>,
}

impl CompiledChain {
    pub fn steps(&self) -> &[BoundCapability] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Edges of the chain, from [`START`] through every step to [`END`].
    pub fn edges(&self) -> Vec<(String, String)> {
        let nodes: Vec<String> = std::iter::once(START.to_string())
            .chain(self.steps.iter().map(|s| s.name().to_string()))
            .chain(std::iter::once(END.to_string()))
            .collect();

        nodes
            .windows(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect()
    }

    pub(crate) fn into_steps(self) -> Vec<BoundCapability> {
        self.steps
    }
}

/// Compiles step descriptors against a registry.
pub struct PipelineBuilder<'a> {
    registry: &'a CapabilityRegistry,
    caller_id: Option<String>,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(registry: &'a CapabilityRegistry) -> Self {
        Self {
            registry,
            caller_id: None,
        }
    }

    /// Binds a caller identity into every step.
    pub fn with_caller_id(mut self, caller_id: Option<String>) -> Self {
        self.caller_id = caller_id;
        self
    }

    /// Sorts the descriptors by `seq` (stable) and resolves every one.
    ///
    /// The first unknown id aborts compilation; nothing is executed here.
    pub fn build(&self, descriptors: &[StepDescriptor]) -> Result<CompiledChain, EngineError> {
        let mut ordered: Vec<&StepDescriptor> = descriptors.iter().collect();
        ordered.sort_by_key(|d| d.seq);

        let steps = ordered
            .into_iter()
            .map(|descriptor| -> Result<BoundCapability, EngineError> {
                let name = self.registry.resolve(&descriptor.capability_id)?;
                let capability = self.registry.lookup(name).map_err(|_| {
                    EngineError::UnknownCapability {
                        capability_id: descriptor.capability_id.clone(),
                    }
                })?;
                debug!(
                    "Step seq {} -> {} ({})",
                    descriptor.seq, name, descriptor.capability_id
                );
                Ok(BoundCapability {
                    descriptor: descriptor.clone(),
                    capability,
                    caller_id: self.caller_id.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!("Compiled chain with {} steps", steps.len());
        Ok(CompiledChain { steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::FnCapability;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo_registry() -> CapabilityRegistry {
        CapabilityRegistry::new()
            .register("a", FnCapability::new("alpha", |r: ExecutionRecord| r.into()))
            .register("b", FnCapability::new("beta", |r: ExecutionRecord| r.into()))
            .register("c", FnCapability::new("gamma", |r: ExecutionRecord| r.into()))
    }

    fn names(chain: &CompiledChain) -> Vec<&str> {
        chain.steps().iter().map(|s| s.name()).collect()
    }

    #[test]
    fn test_orders_by_seq() {
        let registry = echo_registry();
        let descriptors = vec![
            StepDescriptor::new("c", 30),
            StepDescriptor::new("a", 10),
            StepDescriptor::new("b", 20),
        ];

        let chain = PipelineBuilder::new(&registry).build(&descriptors).unwrap();
        assert_eq!(names(&chain), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_equal_seq_keeps_submission_order() {
        let registry = echo_registry();
        let descriptors = vec![
            StepDescriptor::new("b", 1),
            StepDescriptor::new("a", 1),
            StepDescriptor::new("c", 0),
        ];

        let chain = PipelineBuilder::new(&registry).build(&descriptors).unwrap();
        assert_eq!(names(&chain), vec!["gamma", "beta", "alpha"]);
    }

    #[test]
    fn test_unknown_id_fails_without_invoking() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let registry = CapabilityRegistry::new().register(
            "count",
            FnCapability::new("count", move |r: ExecutionRecord| {
                counter.fetch_add(1, Ordering::SeqCst);
                r.into()
            }),
        );

        let descriptors = vec![
            StepDescriptor::new("count", 1),
            StepDescriptor::new("missing", 2),
        ];
        let err = PipelineBuilder::new(&registry).build(&descriptors).unwrap_err();

        assert_eq!(
            err,
            EngineError::UnknownCapability {
                capability_id: "missing".to_string()
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_binder_injects_missing_caller_id() {
        let registry = echo_registry();
        let chain = PipelineBuilder::new(&registry)
            .with_caller_id(Some("ambient".to_string()))
            .build(&[StepDescriptor::new("a", 1).with_display_name("First")])
            .unwrap();
        let step = &chain.steps()[0];

        let record = step.invoke(ExecutionRecord::new()).into_record();
        assert_eq!(record.caller_id.as_deref(), Some("ambient"));
        assert_eq!(record.node_id.as_deref(), Some("a"));
        assert_eq!(record.node_name.as_deref(), Some("First"));

        let own = step
            .invoke(ExecutionRecord::new().with_caller_id("explicit"))
            .into_record();
        assert_eq!(own.caller_id.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_edges_and_labels() {
        let registry = echo_registry();
        let chain = PipelineBuilder::new(&registry)
            .build(&[
                StepDescriptor::new("b", 2),
                StepDescriptor::new("a", 1).with_display_name("Start here"),
            ])
            .unwrap();

        let edges: Vec<(String, String)> = chain.edges();
        assert_eq!(
            edges,
            vec![
                (START.to_string(), "alpha".to_string()),
                ("alpha".to_string(), "beta".to_string()),
                ("beta".to_string(), END.to_string()),
            ]
        );
        assert_eq!(chain.steps()[0].label(), "Start here");
        assert_eq!(chain.steps()[1].label(), "beta");
    }

    #[test]
    fn test_empty_chain() {
        let registry = echo_registry();
        let chain = PipelineBuilder::new(&registry).build(&[]).unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.edges(), vec![(START.to_string(), END.to_string())]);
    }
}
