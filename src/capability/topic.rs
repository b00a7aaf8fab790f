//! Topic lookup: the top web search snippets for the seed topic.

use super::http::HttpClient;
use super::search::WebSearch;
use super::{apply, Capability, CapabilityError, CapabilityOutput};
use crate::workflow::ExecutionRecord;

pub const NAME: &str = "get_topic_content";

/// Snippets returned per topic.
const MAX_SNIPPETS: usize = 5;

pub struct GetTopicContent {
    search: WebSearch,
}

impl GetTopicContent {
    pub fn new(http: HttpClient, search_url: impl Into<String>) -> Self {
        Self {
            search: WebSearch::new(http, search_url),
        }
    }

    fn lookup(&self, topic: &str) -> Result<String, CapabilityError> {
        let snippets = self.search.snippets(topic, MAX_SNIPPETS)?;
        if snippets.is_empty() {
            return Ok("No good search result was found.".to_string());
        }
        Ok(snippets.join("\n"))
    }
}

impl Capability for GetTopicContent {
    fn name(&self) -> &str {
        NAME
    }

    fn invoke(&self, record: ExecutionRecord) -> CapabilityOutput {
        let topic = record
            .current_input()
            .map(|input| input.trim().to_string())
            .unwrap_or_default();

        if topic.is_empty() {
            let mut record = record;
            record.set_result("No topic provided.");
            return record.into();
        }

        apply(NAME, record, |_| self.lookup(&topic))
    }
}
