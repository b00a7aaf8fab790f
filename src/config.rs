//! Runtime Settings
//!
//! Endpoints, models and timeouts used by the standard capabilities.
//!
//! # Resolution Order
//!
//! 1. Built-in defaults
//! 2. Optional YAML settings file (`--config PATH`)
//! 3. `NODEFLOW_*` environment variables

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::capability::feed::FeedSource;
use crate::error::ConfigError;

/// Prefix shared by every environment override.
const ENV_PREFIX: &str = "NODEFLOW_";

/// Settings for the standard capability set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of an OpenAI-compatible chat completions API
    pub llm_base_url: String,

    /// Model used for summaries, research and template filling
    pub llm_model: String,

    /// Timeout for LLM calls, in seconds
    pub llm_timeout_secs: u64,

    /// Timeout for plain HTTP fetches, in seconds
    pub http_timeout_secs: u64,

    /// User agent sent with HTTP fetches
    pub user_agent: String,

    /// DuckDuckGo HTML search endpoint
    pub search_url: String,

    /// Weather service base URL
    pub weather_url: String,

    /// JSON secrets file consulted before the environment
    pub secrets_file: Option<String>,

    /// Default caller identity for runs that do not supply one
    pub caller_id: Option<String>,

    /// Feeds read by the general news capability
    pub news_feeds: Vec<FeedSource>,

    /// Feeds read by the tech news capability
    pub tech_feeds: Vec<FeedSource>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm_base_url: "https://api.openai.com/v1".to_string(),
            llm_model: "gpt-4.1-mini".to_string(),
            llm_timeout_secs: 30,
            http_timeout_secs: 10,
            user_agent: "Mozilla/5.0 (compatible; nodeflow)".to_string(),
            search_url: "https://html.duckduckgo.com/html/".to_string(),
            weather_url: "https://wttr.in".to_string(),
            secrets_file: None,
            caller_id: None,
            news_feeds: vec![
                FeedSource::new("BBC News", "https://feeds.bbci.co.uk/news/rss.xml"),
                FeedSource::new("CNN", "http://rss.cnn.com/rss/edition.rss"),
                FeedSource::new("Reuters", "http://feeds.reuters.com/reuters/topNews"),
                FeedSource::new("Al Jazeera", "https://www.aljazeera.com/xml/rss/all.xml"),
                FeedSource::new(
                    "Hindustan Times",
                    "https://www.hindustantimes.com/rss/topnews/rssfeed.xml",
                ),
            ],
            tech_feeds: vec![
                FeedSource::new("TechCrunch", "https://techcrunch.com/feed/"),
                FeedSource::new("The Verge", "https://www.theverge.com/rss/index.xml"),
                FeedSource::new("Ars Technica", "https://feeds.arstechnica.com/arstechnica/index"),
                FeedSource::new("Reddit Technology", "https://www.reddit.com/r/technology/.rss"),
                FeedSource::new("Reddit Programming", "https://www.reddit.com/r/programming/.rss"),
            ],
        }
    }
}

impl Settings {
    /// Loads settings from an optional YAML file, then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                let settings: Settings =
                    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                        path: path.to_path_buf(),
                        source,
                    })?;
                info!("Loaded settings from {}", path.display());
                settings
            }
            None => Settings::default(),
        };

        settings.apply_overrides(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok());
        Ok(settings)
    }

    /// Applies overrides looked up by key (without the prefix).
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LLM_BASE_URL") {
            self.llm_base_url = v;
        }
        if let Some(v) = lookup("LLM_MODEL") {
            self.llm_model = v;
        }
        if let Some(v) = lookup("SEARCH_URL") {
            self.search_url = v;
        }
        if let Some(v) = lookup("WEATHER_URL") {
            self.weather_url = v;
        }
        if let Some(v) = lookup("SECRETS_FILE") {
            self.secrets_file = Some(v);
        }
        if let Some(v) = lookup("CALLER_ID") {
            self.caller_id = Some(v);
        }
        if let Some(v) = lookup("HTTP_TIMEOUT_SECS") {
            match v.parse() {
                Ok(secs) => self.http_timeout_secs = secs,
                Err(_) => warn!("Ignoring invalid {}HTTP_TIMEOUT_SECS: {}", ENV_PREFIX, v),
            }
        }
        if let Some(v) = lookup("LLM_TIMEOUT_SECS") {
            match v.parse() {
                Ok(secs) => self.llm_timeout_secs = secs,
                Err(_) => warn!("Ignoring invalid {}LLM_TIMEOUT_SECS: {}", ENV_PREFIX, v),
            }
        }
        debug!("Effective settings: {:?}", self);
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}
