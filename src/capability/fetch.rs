//! Page fetch capability.

use super::http::{html_to_text, normalize_url, HttpClient};
use super::{apply, Capability, CapabilityError, CapabilityOutput};
use crate::workflow::ExecutionRecord;

pub const NAME: &str = "fetch_html_content";

/// Fetches the URL held in the current input and stores the page text.
pub struct FetchHtmlContent {
    http: HttpClient,
}

impl FetchHtmlContent {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    fn fetch(&self, record: &ExecutionRecord) -> Result<String, CapabilityError> {
        let url = record
            .current_input()
            .map(|input| input.trim().to_string())
            .filter(|input| !input.is_empty())
            .ok_or_else(|| CapabilityError::MissingInput("URL".to_string()))?;

        let html = self.http.get_text(&normalize_url(&url))?;
        Ok(html_to_text(&html))
    }
}

impl Capability for FetchHtmlContent {
    fn name(&self) -> &str {
        NAME
    }

    fn invoke(&self, record: ExecutionRecord) -> CapabilityOutput {
        apply(NAME, record, |record| self.fetch(record))
    }
}
