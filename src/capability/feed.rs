//! RSS headline aggregation.
//!
//! Reads a fixed set of feeds, keeps the items published inside a
//! rolling window and renders up to three headlines per source.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use log::{debug, warn};
use rss::Channel;
use serde::{Deserialize, Serialize};

use super::http::HttpClient;
use super::{apply, Capability, CapabilityError, CapabilityOutput};
use crate::workflow::ExecutionRecord;

pub const TOP_NEWS_NAME: &str = "fetch_top_news";
pub const TECH_NEWS_NAME: &str = "fetch_it_tech_news";

/// Items inspected per feed.
const MAX_ITEMS_SCANNED: usize = 20;

/// Headlines kept per feed.
const MAX_HEADLINES: usize = 3;

/// A named RSS feed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Headline {
    title: String,
    description: String,
    published: Option<String>,
}

/// Collects recent headlines from a list of feeds.
pub struct FeedAggregator {
    name: &'static str,
    http: HttpClient,
    sources: Vec<FeedSource>,
    window_days: i64,
    heading: String,
    empty_message: String,
}

impl FeedAggregator {
    /// General news, last 2 days.
    pub fn top_news(http: HttpClient, sources: Vec<FeedSource>) -> Self {
        Self {
            name: TOP_NEWS_NAME,
            http,
            sources,
            window_days: 2,
            heading: "Recent News Articles (Last 2 Days):".to_string(),
            empty_message:
                "No recent news articles found in the last 2 days. Please try again later."
                    .to_string(),
        }
    }

    /// Tech news, last 7 days.
    pub fn tech_news(http: HttpClient, sources: Vec<FeedSource>) -> Self {
        Self {
            name: TECH_NEWS_NAME,
            http,
            sources,
            window_days: 7,
            heading: "Recent Tech News (Last 7 Days):".to_string(),
            empty_message:
                "No recent tech news articles found in the last 7 days. Please try again later."
                    .to_string(),
        }
    }

    fn read_source(
        &self,
        source: &FeedSource,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<Headline>, CapabilityError> {
        let bytes = self.http.get_bytes(&source.url)?;
        let channel = Channel::read_from(&bytes[..])
            .map_err(|e| CapabilityError::Feed(format!("{}: {}", source.name, e)))?;
        debug!("{}: {} items", source.name, channel.items().len());

        let headlines = channel
            .items()
            .iter()
            .take(MAX_ITEMS_SCANNED)
            .filter(|item| {
                item.pub_date()
                    .and_then(parse_date)
                    .map_or(true, |date| date >= threshold)
            })
            .filter_map(|item| {
                let title = item.title()?.trim();
                let len = title.chars().count();
                if len <= 10 || len >= 200 {
                    return None;
                }
                Some(Headline {
                    title: collapse_whitespace(title),
                    description: item.description().map(collapse_whitespace).unwrap_or_default(),
                    published: item.pub_date().map(str::to_string),
                })
            })
            .take(MAX_HEADLINES)
            .collect();

        Ok(headlines)
    }

    /// Reads every source relative to `now` and renders the digest.
    fn digest(&self, now: DateTime<Utc>) -> Result<String, CapabilityError> {
        let threshold = now - Duration::days(self.window_days);
        debug!("{}: keeping items published since {}", self.name, threshold);

        let mut sections = Vec::new();
        let mut failures = 0;
        for source in &self.sources {
            match self.read_source(source, threshold) {
                Ok(headlines) => sections.push((source.name.as_str(), headlines)),
                Err(e) => {
                    warn!("Error fetching from {}: {}", source.name, e);
                    failures += 1;
                }
            }
        }

        if !self.sources.is_empty() && failures == self.sources.len() {
            return Err(CapabilityError::Feed(format!(
                "all {} feeds failed",
                self.sources.len()
            )));
        }

        Ok(self.render(&sections))
    }

    fn render(&self, sections: &[(&str, Vec<Headline>)]) -> String {
        let mut text = format!("{}\n\n", self.heading);
        let mut count = 0;

        for (source, headlines) in sections.iter().filter(|(_, h)| !h.is_empty()) {
            text.push_str(&format!("{}:\n", source));
            for headline in headlines {
                count += 1;
                text.push_str(&format!("{}. {}\n", count, headline.title));
                if !headline.description.is_empty() {
                    text.push_str(&format!("   {}\n", headline.description));
                }
                if let Some(published) = &headline.published {
                    text.push_str(&format!("   Published: {}\n", published));
                }
                text.push('\n');
            }
            text.push('\n');
        }

        if count == 0 {
            self.empty_message.clone()
        } else {
            text
        }
    }
}

impl Capability for FeedAggregator {
    fn name(&self) -> &str {
        self.name
    }

    fn invoke(&self, record: ExecutionRecord) -> CapabilityOutput {
        apply(self.name, record, |_| self.digest(Utc::now()))
    }
}

/// Parses the date formats seen in RSS feeds.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(date.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn http() -> HttpClient {
        HttpClient::new("test", std::time::Duration::from_secs(5))
    }

    fn rss(items: &[(&str, Option<String>)]) -> String {
        let body: String = items
            .iter()
            .map(|(title, date)| {
                let date = date
                    .as_ref()
                    .map(|d| format!("<pubDate>{}</pubDate>", d))
                    .unwrap_or_default();
                format!(
                    "<item><title>{}</title><description>  About   {} </description>{}</item>",
                    title, title, date
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>T</title><link>http://x</link><description>D</description>{}</channel></rss>"#,
            body
        )
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("Tue, 10 Jun 2025 04:00:00 GMT").is_some());
        assert!(parse_date("2025-06-10T04:00:00Z").is_some());
        assert!(parse_date("2025-06-10 04:00:00").is_some());
        assert_eq!(
            parse_date("2025-06-10"),
            NaiveDate::from_ymd_opt(2025, 6, 10)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc())
        );
        assert!(parse_date("yesterday").is_none());
    }

    #[test]
    fn test_digest_filters_and_formats() {
        let now = Utc::now();
        let recent = (now - Duration::hours(3)).to_rfc2822();
        let old = (now - Duration::days(5)).to_rfc2822();

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/world.xml");
            then.status(200).body(rss(&[
                ("Markets rally after rate decision", Some(recent.clone())),
                ("Old story from last week", Some(old.clone())),
                ("Too short", Some(recent.clone())),
                ("Undated story still counts", None),
            ]));
        });

        let aggregator = FeedAggregator::top_news(
            http(),
            vec![FeedSource::new("World", server.url("/world.xml"))],
        );
        let text = aggregator.digest(now).unwrap();

        let expected = format!(
            "Recent News Articles (Last 2 Days):\n\nWorld:\n\
1. Markets rally after rate decision\n   About Markets rally after rate decision\n   Published: {}\n\n\
2. Undated story still counts\n   About Undated story still counts\n\n\n",
            recent
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_keeps_three_per_source() {
        let now = Utc::now();
        let titles = [
            "First headline here",
            "Second headline here",
            "Third headline here",
            "Fourth headline here",
        ];
        let items: Vec<(&str, Option<String>)> = titles.iter().map(|t| (*t, None)).collect();

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/tech.xml");
            then.status(200).body(rss(&items));
        });

        let aggregator = FeedAggregator::tech_news(
            http(),
            vec![FeedSource::new("Tech", server.url("/tech.xml"))],
        );
        let text = aggregator.digest(now).unwrap();

        assert!(text.starts_with("Recent Tech News (Last 7 Days):"));
        assert!(text.contains("3. Third headline here"));
        assert!(!text.contains("Fourth"));
    }

    #[test]
    fn test_empty_and_failing_sources() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/empty.xml");
            then.status(200).body(rss(&[]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/broken.xml");
            then.status(200).body("not xml at all");
        });

        let aggregator = FeedAggregator::top_news(
            http(),
            vec![
                FeedSource::new("Empty", server.url("/empty.xml")),
                FeedSource::new("Broken", server.url("/broken.xml")),
            ],
        );
        assert_eq!(
            aggregator.digest(Utc::now()).unwrap(),
            "No recent news articles found in the last 2 days. Please try again later."
        );

        let all_broken = FeedAggregator::top_news(
            http(),
            vec![FeedSource::new("Broken", server.url("/broken.xml"))],
        );
        let output = all_broken.invoke(ExecutionRecord::new()).into_record();
        assert!(output.result_text().unwrap().starts_with("Error: "));
    }
}
