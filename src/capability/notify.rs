//! Email notification capability and the mail dispatch boundary.

use std::sync::Arc;

use log::info;

use super::{apply, Capability, CapabilityError, CapabilityOutput};
use crate::workflow::ExecutionRecord;

pub const NAME: &str = "send_email";

const SUBJECT: &str = "Workflow result";

/// Delivers a message to one recipient.
pub trait Mailer: Send + Sync {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), CapabilityError>;
}

/// Mailer that only records the dispatch in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), CapabilityError> {
        info!("Sending email to {} ({}, {} bytes)", to, subject, body.len());
        Ok(())
    }
}

/// Sends the current content to the recipient given as this step's
/// side-channel input.
pub struct SendEmail {
    mailer: Arc<dyn Mailer>,
}

impl SendEmail {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    fn send(&self, record: &ExecutionRecord) -> Result<String, CapabilityError> {
        let to = record
            .additional_input_for_current()
            .map(str::trim)
            .filter(|to| to.contains('@'))
            .ok_or_else(|| CapabilityError::MissingInput("recipient address".to_string()))?;

        let body = record.current_input().unwrap_or_default();
        self.mailer.send(to, SUBJECT, &body)?;
        Ok(format!("Email sent to {}", to))
    }
}

impl Capability for SendEmail {
    fn name(&self) -> &str {
        NAME
    }

    fn invoke(&self, record: ExecutionRecord) -> CapabilityOutput {
        apply(NAME, record, |record| self.send(record))
    }
}
