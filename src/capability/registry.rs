//! Capability Registry
//!
//! Maps opaque capability ids to names, and names to executable
//! capabilities. A registry is built once at startup and shared
//! read-only by every run.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error};

use super::editor::HtmlEditor;
use super::feed::FeedAggregator;
use super::fetch::FetchHtmlContent;
use super::http::HttpClient;
use super::llm::ChatClient;
use super::notify::{Mailer, SendEmail};
use super::research::BlogResearcher;
use super::summarize::SummarizeContent;
use super::template::{ConvertToHtmlTemplate, TemplateGenerator};
use super::topic::GetTopicContent;
use super::weather::GetWeather;
use super::Capability;
use crate::config::Settings;
use crate::error::EngineError;
use crate::secrets::SecretStore;

pub const FETCH_HTML_CONTENT_ID: &str = "8c5a1f02-d0cd-4c6d-96b6-51f1bc1f0b17";
pub const SUMMARIZE_HTML_CONTENT_ID: &str = "0ff35b88-681c-4c64-94b5-7b74dbfbb471";
pub const CONVERT_TO_HTML_TEMPLATE_ID: &str = "1a7c2b8e-e4ae-4c8e-b2c4-999b4b3cf80d";
pub const TEMPLATE_GENERATOR_ID: &str = "f7e6d5c4-1234-4abc-9def-abcdef123456";
pub const SEND_EMAIL_ID: &str = "6789d23f-1352-4b11-b9a3-2f4f6f96fcd0";
pub const FETCH_TOP_NEWS_ID: &str = "a1b2c3d4-e5f6-7890-abcd-ef1234567890";
pub const FETCH_IT_TECH_NEWS_ID: &str = "b2c3d4e5-f6g7-8901-bcde-f23456789012";
pub const BLOG_RESEARCHER_ID: &str = "d4e5f6a7-1234-4bcd-8ef0-abcdef123456";
pub const GET_WEATHER_ID: &str = "fdc3b924-2f2a-43e8-923f-3f118a51eb0e";
pub const HTML_EDITOR_ID: &str = "a8b9c0d1-2345-4def-8901-abcdef234567";
pub const GET_TOPIC_CONTENT_ID: &str = "e3b0c442-98fc-1c14-9afb-4c8996fb9242";

/// Closed id -> name -> capability mapping.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    ids: HashMap<String, String>,
    capabilities: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a capability under `id` and its own name.
    pub fn register(
        mut self,
        id: impl Into<String>,
        capability: impl Capability + 'static,
    ) -> Self {
        self.insert(id.into(), Arc::new(capability));
        self
    }

    fn insert(&mut self, id: String, capability: Arc<dyn Capability>) {
        let name = capability.name().to_string();
        debug!("Registering capability {} -> {}", id, name);
        self.ids.insert(id, name.clone());
        self.capabilities.insert(name, capability);
    }

    /// The standard capability set, wired to the given settings and
    /// collaborators.
    pub fn standard(
        settings: &Settings,
        secrets: Arc<dyn SecretStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let http = HttpClient::from_settings(settings);
        let llm = ChatClient::from_settings(settings);

        Self::new()
            .register(FETCH_HTML_CONTENT_ID, FetchHtmlContent::new(http.clone()))
            .register(
                SUMMARIZE_HTML_CONTENT_ID,
                SummarizeContent::new(llm.clone(), secrets.clone()),
            )
            .register(CONVERT_TO_HTML_TEMPLATE_ID, ConvertToHtmlTemplate)
            .register(
                TEMPLATE_GENERATOR_ID,
                TemplateGenerator::new(llm.clone(), http.clone(), secrets.clone()),
            )
            .register(SEND_EMAIL_ID, SendEmail::new(mailer))
            .register(
                FETCH_TOP_NEWS_ID,
                FeedAggregator::top_news(http.clone(), settings.news_feeds.clone()),
            )
            .register(
                FETCH_IT_TECH_NEWS_ID,
                FeedAggregator::tech_news(http.clone(), settings.tech_feeds.clone()),
            )
            .register(
                BLOG_RESEARCHER_ID,
                BlogResearcher::new(http.clone(), llm, secrets, settings.search_url.clone()),
            )
            .register(
                GET_TOPIC_CONTENT_ID,
                GetTopicContent::new(http.clone(), settings.search_url.clone()),
            )
            .register(GET_WEATHER_ID, GetWeather::new(http, settings.weather_url.clone()))
            .register(HTML_EDITOR_ID, HtmlEditor)
    }

    /// Maps a capability id to its name.
    pub fn resolve(&self, capability_id: &str) -> Result<&str, EngineError> {
        self.ids.get(capability_id).map(String::as_str).ok_or_else(|| {
            error!("Unknown capability id: {}", capability_id);
            EngineError::UnknownCapability {
                capability_id: capability_id.to_string(),
            }
        })
    }

    /// Maps a capability name to the capability.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Capability>, EngineError> {
        self.capabilities.get(name).cloned().ok_or_else(|| {
            error!("Unknown capability name: {}", name);
            EngineError::UnknownCapabilityName {
                name: name.to_string(),
            }
        })
    }

    /// Returns true if `key` is a registered capability name or id.
    pub fn is_known(&self, key: &str) -> bool {
        self.capabilities.contains_key(key) || self.ids.contains_key(key)
    }

    /// Registered ids with their names, sorted by name.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .ids
            .iter()
            .map(|(id, name)| (id.as_str(), name.as_str()))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(b.1));
        entries
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::notify::LogMailer;
    use crate::capability::{CapabilityOutput, FnCapability};
    use crate::secrets::MemorySecretStore;
    use crate::workflow::ExecutionRecord;

    fn echo(
        name: &str,
    ) -> FnCapability<impl Fn(ExecutionRecord) -> CapabilityOutput + Send + Sync> {
        FnCapability::new(name, |record: ExecutionRecord| record.into())
    }

    #[test]
    fn test_resolve_and_lookup() {
        let registry = CapabilityRegistry::new().register("id-1", echo("first"));

        assert_eq!(registry.resolve("id-1").unwrap(), "first");
        assert_eq!(registry.lookup("first").unwrap().name(), "first");
        assert!(registry.is_known("id-1"));
        assert!(registry.is_known("first"));
        assert!(!registry.is_known("second"));
    }

    #[test]
    fn test_unknown_id_and_name() {
        let registry = CapabilityRegistry::new().register("id-1", echo("first"));

        assert_eq!(
            registry.resolve("nope").unwrap_err(),
            EngineError::UnknownCapability {
                capability_id: "nope".to_string()
            }
        );
        assert_eq!(
            registry.lookup("nope").err(),
            Some(EngineError::UnknownCapabilityName {
                name: "nope".to_string()
            })
        );
    }

    #[test]
    fn test_standard_catalogue() {
        let registry = CapabilityRegistry::standard(
            &Settings::default(),
            Arc::new(MemorySecretStore::new()),
            Arc::new(LogMailer),
        );

        assert_eq!(registry.len(), 11);
        assert_eq!(registry.resolve(FETCH_HTML_CONTENT_ID).unwrap(), "fetch_html_content");
        assert_eq!(registry.resolve(FETCH_IT_TECH_NEWS_ID).unwrap(), "fetch_it_tech_news");
        assert_eq!(registry.resolve(HTML_EDITOR_ID).unwrap(), "html_editor");
        assert_eq!(
            registry.resolve("e3b0c442-98fc-1c14-9afb-4c8996fb9242").unwrap(),
            "get_topic_content"
        );

        for (id, name) in registry.entries() {
            assert_eq!(registry.resolve(id).unwrap(), name);
            assert_eq!(registry.lookup(name).unwrap().name(), name);
        }
    }
}
