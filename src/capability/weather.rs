//! Current weather for a city.

use super::http::HttpClient;
use super::{apply, Capability, CapabilityError, CapabilityOutput};
use crate::workflow::ExecutionRecord;

pub const NAME: &str = "get_weather";

/// Queries a wttr.in-style service for `{city}?format=%C+%t`.
pub struct GetWeather {
    http: HttpClient,
    base_url: String,
}

impl GetWeather {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn lookup(&self, record: &ExecutionRecord) -> Result<String, CapabilityError> {
        let city = record
            .current_input()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| CapabilityError::MissingInput("city".to_string()))?;

        let url = format!(
            "{}/{}?format=%C+%t",
            self.base_url.trim_end_matches('/'),
            city.replace(' ', "+")
        );
        let report = self.http.get_text(&url)?;
        Ok(format!("weather in {} is {}.", city, report.trim()))
    }
}

impl Capability for GetWeather {
    fn name(&self) -> &str {
        NAME
    }

    fn invoke(&self, record: ExecutionRecord) -> CapabilityOutput {
        apply(NAME, record, |record| self.lookup(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;

    #[test]
    fn test_weather_sentence() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/Paris");
            then.status(200).body("Sunny +21°C\n");
        });

        let capability = GetWeather::new(
            HttpClient::new("test", Duration::from_secs(5)),
            server.base_url(),
        );
        let output = capability
            .invoke(ExecutionRecord::new().with_input("Paris"))
            .into_record();

        assert_eq!(
            output.result_text().as_deref(),
            Some("weather in Paris is Sunny +21°C.")
        );
        mock.assert();
    }

    #[test]
    fn test_missing_city() {
        let capability = GetWeather::new(
            HttpClient::new("test", Duration::from_secs(5)),
            "http://127.0.0.1:9",
        );
        let output = capability.invoke(ExecutionRecord::new()).into_record();
        assert!(output.node_result.unwrap().is_failure());
    }
}
