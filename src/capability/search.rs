//! DuckDuckGo HTML search shared by the research capabilities.

use once_cell::sync::Lazy;
use regex::Regex;

use super::http::{inline_text, normalize_url, HttpClient};
use super::CapabilityError;

static RESULT_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a[^>]*class="[^"]*\bresult__a\b[^"]*"[^>]*href="([^"]+)"|<a[^>]*href="([^"]+)"[^>]*class="[^"]*\bresult__a\b"#)
        .unwrap()
});

static SNIPPET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<(?:a|div|td)[^>]*class="[^"]*\bresult__snippet\b[^"]*"[^>]*>(.*?)</(?:a|div|td)>"#)
        .unwrap()
});

/// Form-posting client for a DuckDuckGo-style HTML results page.
#[derive(Clone)]
pub struct WebSearch {
    http: HttpClient,
    search_url: String,
}

impl WebSearch {
    pub fn new(http: HttpClient, search_url: impl Into<String>) -> Self {
        Self {
            http,
            search_url: search_url.into(),
        }
    }

    /// Raw results page for `query`.
    pub fn results_page(&self, query: &str) -> Result<String, CapabilityError> {
        self.http.post_form(&self.search_url, &[("q", query)])
    }

    /// Link of the first result, if any.
    pub fn first_link(&self, query: &str) -> Result<Option<String>, CapabilityError> {
        Ok(first_result_link(&self.results_page(query)?))
    }

    /// Text of up to `limit` result snippets.
    pub fn snippets(&self, query: &str, limit: usize) -> Result<Vec<String>, CapabilityError> {
        Ok(result_snippets(&self.results_page(query)?, limit))
    }
}

/// Returns the first search result link of a results page.
pub fn first_result_link(page: &str) -> Option<String> {
    RESULT_LINK_RE
        .captures(page)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
        .map(|href| {
            if href.starts_with("//") || !href.contains("://") {
                normalize_url(&href)
            } else {
                href
            }
        })
}

/// Returns the plain text of the first `limit` non-empty snippets.
pub fn result_snippets(page: &str, limit: usize) -> Vec<String> {
    SNIPPET_RE
        .captures_iter(page)
        .filter_map(|caps| caps.get(1))
        .map(|m| inline_text(m.as_str()))
        .filter(|text| !text.is_empty())
        .take(limit)
        .collect()
}
