//! Individual Step Execution
//!
//! Invokes one bound capability. A panicking capability does not take
//! the run down: the record it was given is kept and the panic is stored
//! as its failure, so the chain degrades and continues.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use log::error;

use crate::capability::{CapabilityError, CapabilityOutput};
use crate::pipeline::BoundCapability;
use crate::workflow::ExecutionRecord;

/// Executes a single chain step over the record.
pub fn execute_step(step: &BoundCapability, record: ExecutionRecord) -> CapabilityOutput {
    let snapshot = record.clone();

    match panic::catch_unwind(AssertUnwindSafe(|| step.invoke(record))) {
        Ok(output) => output,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("Capability '{}' panicked: {}", step.name(), message);

            let mut record = snapshot;
            record.set_failure(CapabilityError::Panicked {
                capability: step.name().to_string(),
                message,
            });
            record.into()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
