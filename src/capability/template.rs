//! HTML templating capabilities.
//!
//! [`ConvertToHtmlTemplate`] wraps the current content in a fixed report
//! page. [`TemplateGenerator`] asks the LLM to fill an HTML template with
//! the current content and the metadata carried by the seed input.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Local;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::http::HttpClient;
use super::llm::{resolve_api_key, ChatClient};
use super::{apply, Capability, CapabilityError, CapabilityOutput};
use crate::secrets::SecretStore;
use crate::workflow::ExecutionRecord;

pub const CONVERT_NAME: &str = "convert_to_html_template";
pub const GENERATOR_NAME: &str = "template_generator";

static DATA_URI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^data:([^;,]*);base64,(.*)$").unwrap());

const BLOG_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>{{title}}</title>
</head>
<body>
  <article>
    <header>
      <h1>{{title}}</h1>
      <p class="meta">By {{author}} on {{date}}</p>
    </header>
    <section class="topic"><h2>{{topic}}</h2></section>
    <section class="content">{{content}}</section>
  </article>
</body>
</html>"#;

/// Wraps the current content in a "Summary Report" page.
pub struct ConvertToHtmlTemplate;

impl ConvertToHtmlTemplate {
    pub fn render(content: &str) -> String {
        format!(
            "<html>\n    <head><title>Summary Report</title></head>\n    <body>\n        <h1>Summary</h1>\n        <p>{}</p>\n    </body>\n</html>",
            content
        )
    }
}

impl Capability for ConvertToHtmlTemplate {
    fn name(&self) -> &str {
        CONVERT_NAME
    }

    fn invoke(&self, mut record: ExecutionRecord) -> CapabilityOutput {
        let html = Self::render(&record.current_input().unwrap_or_default());
        record.set_result(html);
        record.into()
    }
}

/// Blog metadata read from the seed input when it holds JSON.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct BlogMeta {
    title: Option<String>,
    author: Option<String>,
    date: Option<String>,
    topic: Option<String>,
    subtopics: Option<Value>,
}

impl BlogMeta {
    fn from_input(input: Option<&str>) -> Self {
        input
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }

    fn subtopics(&self) -> String {
        match &self.subtopics {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        }
    }
}

/// Fills an HTML template with the current content through the LLM.
///
/// The template is taken from a `data:...;base64,` seed input, then from
/// a URL given as this step's side-channel input, then the built-in blog
/// template.
pub struct TemplateGenerator {
    llm: ChatClient,
    http: HttpClient,
    secrets: Arc<dyn SecretStore>,
}

impl TemplateGenerator {
    pub fn new(llm: ChatClient, http: HttpClient, secrets: Arc<dyn SecretStore>) -> Self {
        Self { llm, http, secrets }
    }

    fn template_for(&self, record: &ExecutionRecord) -> Result<String, CapabilityError> {
        if let Some(caps) = record.node_input.as_deref().and_then(|i| DATA_URI_RE.captures(i)) {
            let bytes = STANDARD
                .decode(caps[2].trim())
                .map_err(|e| CapabilityError::Template(format!("bad uploaded template: {}", e)))?;
            debug!("Using uploaded template ({})", &caps[1]);
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }

        if let Some(url) = record
            .additional_input_for_current()
            .map(str::trim)
            .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
        {
            debug!("Fetching template from {}", url);
            return self.http.get_text(url);
        }

        Ok(BLOG_TEMPLATE.to_string())
    }

    fn build_prompt(template: &str, meta: &BlogMeta, content: &str) -> String {
        let today = Local::now().format("%Y-%m-%d").to_string();
        format!(
            "You are an expert blog writer. Write a blog post from the given content, \
following the given HTML template, and make it readable and attractive.\n\
Here is an HTML template:\n{template}\n\n\
Here is the content:\n\
- title: {title}\n\
- author: {author}\n\
- date: {date}\n\
- topic: {topic}\n\
- subtopics: {subtopics}\n\
- content: {content}\n\n\
Fill in anything missing from the content itself; for example, if the title is \
missing and the content is about RAG, use RAG as the title.\n\n\
Return the complete HTML page.",
            template = template,
            title = meta.title.as_deref().unwrap_or("Blog Title"),
            author = meta.author.as_deref().unwrap_or("Author"),
            date = meta.date.as_deref().unwrap_or(&today),
            topic = meta.topic.as_deref().unwrap_or(""),
            subtopics = meta.subtopics(),
            content = content,
        )
    }

    fn generate(&self, record: &ExecutionRecord) -> Result<String, CapabilityError> {
        let template = self.template_for(record)?;
        let meta = BlogMeta::from_input(record.node_input.as_deref());
        let content = record
            .node_result
            .as_ref()
            .map(|r| r.render().into_owned())
            .unwrap_or_default();

        let api_key = resolve_api_key(self.secrets.as_ref(), record)?;
        let prompt = Self::build_prompt(&template, &meta, &content);
        self.llm
            .complete(&api_key, None, &prompt)
            .map_err(|e| CapabilityError::Template(e.to_string()))
    }
}

impl Capability for TemplateGenerator {
    fn name(&self) -> &str {
        GENERATOR_NAME
    }

    fn invoke(&self, record: ExecutionRecord) -> CapabilityOutput {
        apply(GENERATOR_NAME, record, |record| self.generate(record))
    }
}
