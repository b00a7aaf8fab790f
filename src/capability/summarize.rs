//! LLM summary capability.

use std::sync::Arc;

use super::llm::{resolve_api_key, ChatClient};
use super::{apply, Capability, CapabilityError, CapabilityOutput};
use crate::secrets::SecretStore;
use crate::workflow::ExecutionRecord;

pub const NAME: &str = "summarize_html_content";

const SYSTEM_PROMPT: &str = "You are a helpful assistant. Summarize the following text into a few key points. \
If the content carries little meaning, add a short description or key points of your own. \
Keep the result to at most 200 words.";

/// Summarizes the current input with the caller's LLM key.
pub struct SummarizeContent {
    llm: ChatClient,
    secrets: Arc<dyn SecretStore>,
}

impl SummarizeContent {
    pub fn new(llm: ChatClient, secrets: Arc<dyn SecretStore>) -> Self {
        Self { llm, secrets }
    }

    fn summarize(&self, record: &ExecutionRecord) -> Result<String, CapabilityError> {
        let api_key = resolve_api_key(self.secrets.as_ref(), record)?;
        let content = record.current_input().unwrap_or_default();
        self.llm.complete(&api_key, Some(SYSTEM_PROMPT), &content)
    }
}

impl Capability for SummarizeContent {
    fn name(&self) -> &str {
        NAME
    }

    fn invoke(&self, record: ExecutionRecord) -> CapabilityOutput {
        apply(NAME, record, |record| self.summarize(record))
    }
}
