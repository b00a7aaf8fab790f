//! Chat completion client for OpenAI-compatible endpoints.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde_json::{json, Value};

use crate::config::Settings;
use crate::secrets::SecretStore;
use crate::workflow::ExecutionRecord;

use super::CapabilityError;

/// Service name under which callers store their LLM key.
pub const LLM_SERVICE: &str = "openai";

/// Blocking chat completion client.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    model: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.llm_base_url.clone(),
            settings.llm_model.clone(),
            settings.llm_timeout(),
        )
    }

    /// Sends one system + user exchange and returns the reply text.
    pub fn complete(
        &self,
        api_key: &str,
        system: Option<&str>,
        prompt: &str,
    ) -> Result<String, CapabilityError> {
        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(json!({ "role": "system", "content": sys }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.7,
        });

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!("POST {} (model {})", url, self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| CapabilityError::Llm(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CapabilityError::Llm(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let json: Value = response
            .json()
            .map_err(|e| CapabilityError::Llm(e.to_string()))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| CapabilityError::Llm("response carried no content".to_string()))
    }
}

/// Looks up the caller's LLM key.
///
/// Both a missing caller identity and a missing secret are reported as
/// a missing credential.
pub fn resolve_api_key(
    secrets: &dyn SecretStore,
    record: &ExecutionRecord,
) -> Result<String, CapabilityError> {
    record
        .caller_id
        .as_deref()
        .and_then(|owner| secrets.get_secret(owner, LLM_SERVICE))
        .ok_or_else(|| CapabilityError::missing_credential(LLM_SERVICE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::MemorySecretStore;
    use httpmock::prelude::*;

    #[test]
    fn test_complete_returns_first_choice() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test")
                .body_includes("\"model\":\"tiny\"");
            then.status(200).json_body(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "  short answer \n" } }]
            }));
        });

        let client = ChatClient::new(server.url("/v1/"), "tiny", Duration::from_secs(5));
        let reply = client.complete("sk-test", Some("be brief"), "question").unwrap();

        assert_eq!(reply, "short answer");
        mock.assert();
    }

    #[test]
    fn test_complete_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(401).body("unauthorized");
        });

        let client = ChatClient::new(server.base_url(), "tiny", Duration::from_secs(5));
        let err = client.complete("bad", None, "question").unwrap_err();
        assert!(matches!(err, CapabilityError::Llm(_)));
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_complete_missing_content() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(serde_json::json!({ "choices": [] }));
        });

        let client = ChatClient::new(server.base_url(), "tiny", Duration::from_secs(5));
        assert!(client.complete("k", None, "q").is_err());
    }

    #[test]
    fn test_resolve_api_key() {
        let secrets = MemorySecretStore::new().with_secret("alice", "openai", "sk-a");

        let record = ExecutionRecord::new().with_caller_id("alice");
        assert_eq!(resolve_api_key(&secrets, &record).unwrap(), "sk-a");

        let anonymous = ExecutionRecord::new();
        assert_eq!(
            resolve_api_key(&secrets, &anonymous).unwrap_err(),
            CapabilityError::missing_credential("openai")
        );

        let stranger = ExecutionRecord::new().with_caller_id("bob");
        assert!(resolve_api_key(&secrets, &stranger).is_err());
    }
}
