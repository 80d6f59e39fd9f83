//! Anthropic Messages API client.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TriageError};

/// Messages endpoint.
const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";

/// API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Model used for all triage calls.
const MODEL: &str = "claude-sonnet-4-5-20250929";

/// Minimal client for the Anthropic Messages API.
#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, ANTHROPIC_API_BASE)
    }

    /// Create a client against a custom base URL (used in tests).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Send a single-turn completion and return the first text block.
    pub async fn complete(
        &self,
        system: Option<&str>,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String> {
        let request = MessagesRequest {
            model: MODEL,
            max_tokens,
            system,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(max_tokens, "Anthropic request");
        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TriageError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| TriageError::Http(format!("failed to parse response: {e}")))?;

        response
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| TriageError::Contract("response contained no text block".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn complete_returns_first_text_block() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content": [{"type": "text", "text": "hello"}]}"#)
            .create_async()
            .await;

        let client = AnthropicClient::with_base_url("test-key", server.url());
        let text = client.complete(Some("be brief"), "say hello", 64).await.unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn complete_surfaces_api_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .with_body(r#"{"error": {"message": "invalid key"}}"#)
            .create_async()
            .await;

        let client = AnthropicClient::with_base_url("bad-key", server.url());
        match client.complete(None, "hi", 64).await {
            Err(TriageError::Api { status: 401, .. }) => {}
            other => panic!("expected 401 Api error, got {other:?}"),
        }
    }
}
