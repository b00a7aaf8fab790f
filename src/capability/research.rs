//! Web research capability for blog writing.

use std::sync::Arc;

use log::debug;
use serde::Deserialize;

use super::http::{extract_main_text, normalize_url, truncate_chars, HttpClient};
use super::llm::{resolve_api_key, ChatClient};
use super::search::WebSearch;
use super::{apply, Capability, CapabilityError, CapabilityOutput};
use crate::secrets::SecretStore;
use crate::workflow::ExecutionRecord;

pub const NAME: &str = "blog_researcher";

/// Characters of page text passed to the LLM.
const MAX_CONTEXT_CHARS: usize = 2000;

/// Topic request carried by the seed input.
#[derive(Deserialize, Debug, Default, PartialEq)]
struct ResearchRequest {
    #[serde(default)]
    input: String,
    #[serde(rename = "refURL", default)]
    ref_url: String,
}

impl ResearchRequest {
    /// Reads `{"input": ..., "refURL": ...}` from the seed input, or
    /// treats the current input as a bare topic.
    fn from_record(record: &ExecutionRecord) -> Self {
        record
            .node_input
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_else(|| Self {
                input: record
                    .current_input()
                    .map(|c| c.trim().to_string())
                    .unwrap_or_default(),
                ref_url: String::new(),
            })
    }
}

/// Searches the web for a topic, reads the first hit and asks the LLM
/// for a research summary.
pub struct BlogResearcher {
    http: HttpClient,
    llm: ChatClient,
    secrets: Arc<dyn SecretStore>,
    search: WebSearch,
}

impl BlogResearcher {
    pub fn new(
        http: HttpClient,
        llm: ChatClient,
        secrets: Arc<dyn SecretStore>,
        search_url: impl Into<String>,
    ) -> Self {
        Self {
            search: WebSearch::new(http.clone(), search_url),
            http,
            llm,
            secrets,
        }
    }

    fn page_text(&self, url: &str) -> String {
        match self.http.get_text(url) {
            Ok(html) => extract_main_text(&html),
            Err(e) => {
                debug!("Could not read {}: {}", url, e);
                String::new()
            }
        }
    }

    fn build_prompt(topic: &str, search_content: &str, ref_content: &str) -> String {
        let search_content = truncate_chars(search_content, MAX_CONTEXT_CHARS);
        if ref_content.is_empty() {
            format!(
                "You are a research assistant for blog writers. Given the following web page content, \
extract and summarize the most important facts, trends and insights relevant to the topic: '{}'.\n\
Web Page Content:\n{}\n\
Organize the output as:\n- Brief Introduction\n- Key Findings (bullet points)",
                topic, search_content
            )
        } else {
            format!(
                "You are a research assistant for blog writers. Given the following web page content and a \
reference blog, extract and summarize the most important facts, trends and insights relevant to the topic: '{}'.\n\
Use the reference blog as a style and structure guide.\n\
Reference Blog Content:\n{}\n\
Web Page Content:\n{}\n\
Match the tone and structure of the reference blog.",
                topic,
                truncate_chars(ref_content, MAX_CONTEXT_CHARS),
                search_content
            )
        }
    }

    fn research(&self, record: &ExecutionRecord) -> Result<String, CapabilityError> {
        let request = ResearchRequest::from_record(record);
        if request.input.is_empty() {
            return Err(CapabilityError::MissingInput("topic".to_string()));
        }
        let api_key = resolve_api_key(self.secrets.as_ref(), record)?;

        let ref_content = if request.ref_url.is_empty() {
            String::new()
        } else {
            self.page_text(&normalize_url(&request.ref_url))
        };

        let search_content = match self.search.first_link(&request.input)? {
            Some(url) => self.page_text(&url),
            None => String::new(),
        };
        if search_content.is_empty() {
            return Ok("No content found from search.".to_string());
        }

        let prompt = Self::build_prompt(&request.input, &search_content, &ref_content);
        self.llm.complete(&api_key, None, &prompt)
    }
}

impl Capability for BlogResearcher {
    fn name(&self) -> &str {
        NAME
    }

    fn invoke(&self, record: ExecutionRecord) -> CapabilityOutput {
        apply(NAME, record, |record| self.research(record))
    }
}
