//! HTTP access and HTML text extraction shared by the web capabilities.

use std::time::Duration;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;

use crate::config::Settings;

use super::CapabilityError;

static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
static NOSCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<noscript\b[^>]*>.*?</noscript\s*>").unwrap());
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static ARTICLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<article\b[^>]*>(.*?)</article\s*>").unwrap());
static BODY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>").unwrap());

/// Blocking HTTP client with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self { client, timeout }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.user_agent, settings.http_timeout())
    }

    /// Fetches a URL and returns the body as text.
    pub fn get_text(&self, url: &str) -> Result<String, CapabilityError> {
        debug!("GET {}", url);
        let response = self.client.get(url).timeout(self.timeout).send()?;

        if !response.status().is_success() {
            return Err(CapabilityError::Http(format!(
                "HTTP {} fetching {}",
                response.status(),
                url
            )));
        }

        Ok(response.text()?)
    }

    /// Fetches a URL and returns the raw body.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, CapabilityError> {
        debug!("GET {}", url);
        let response = self.client.get(url).timeout(self.timeout).send()?;

        if !response.status().is_success() {
            return Err(CapabilityError::Http(format!(
                "HTTP {} fetching {}",
                response.status(),
                url
            )));
        }

        Ok(response.bytes()?.to_vec())
    }

    /// Posts a form and returns the body as text.
    pub fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<String, CapabilityError> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .form(form)
            .timeout(self.timeout)
            .send()?;

        if !response.status().is_success() {
            return Err(CapabilityError::Http(format!(
                "HTTP {} posting to {}",
                response.status(),
                url
            )));
        }

        Ok(response.text()?)
    }
}

/// Adds `http://` to addresses typed without a scheme.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else if let Some(rest) = trimmed.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        format!("http://{}", trimmed)
    }
}

/// Converts an HTML document to text, one text run per line.
///
/// Scripts, styles and comments are dropped, entities are decoded and
/// blank lines are removed.
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_RE.replace_all(html, "\n");
    let text = STYLE_RE.replace_all(&text, "\n");
    let text = NOSCRIPT_RE.replace_all(&text, "\n");
    let text = COMMENT_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, "\n");
    let text = html_escape::decode_html_entities(&text);

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Converts an HTML fragment to a single line of text.
///
/// Inline markup is removed without adding breaks, so `<b>a</b>.` reads
/// as `a.`.
pub fn inline_text(html: &str) -> String {
    let text = TAG_RE.replace_all(html, "");
    html_escape::decode_html_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts the readable text of a page, preferring `<article>`, then
/// `<body>`, then the whole document.
pub fn extract_main_text(html: &str) -> String {
    let section = ARTICLE_RE
        .captures(html)
        .or_else(|| BODY_RE.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(html);

    html_to_text(section)
}

/// Truncates to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
