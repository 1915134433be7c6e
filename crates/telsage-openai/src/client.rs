// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat completions endpoints.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use telsage_core::{ProviderError, TelsageError, TransientKind};
use tracing::debug;

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

const COMPLETIONS_PATH: &str = "/chat/completions";

/// HTTP client for one OpenAI-compatible endpoint.
#[derive(Debug)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    endpoint: String,
}

impl OpenAiClient {
    /// `base_url` includes the version segment, e.g. `https://api.openai.com/v1`.
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, TelsageError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| TelsageError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.map(SecretString::from),
            endpoint: format!("{}{COMPLETIONS_PATH}", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let Some(api_key) = &self.api_key else {
            return Err(ProviderError::auth(
                "no API key configured (set api_key or api_key_env)",
            ));
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "chat completion response received");

        let body = response.text().await.map_err(request_error)?;
        if !status.is_success() {
            let detail = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => match api_err.error.type_ {
                    Some(kind) => format!("{kind}: {}", api_err.error.message),
                    None => api_err.error.message,
                },
                Err(_) => body,
            };
            return Err(ProviderError::from_http_status(status.as_u16(), detail));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::transient(
                TransientKind::Malformed,
                format!("failed to parse chat completion: {e}"),
            )
        })
    }
}

fn request_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::transient(TransientKind::Timeout, format!("request timed out: {e}"))
    } else if e.is_decode() {
        ProviderError::transient(TransientKind::Malformed, format!("unreadable body: {e}"))
    } else {
        ProviderError::transient(TransientKind::Network, format!("HTTP request failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new(Some("sk-test".into()), base_url, Duration::from_secs(5)).unwrap()
    }

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o-mini".into(),
            max_tokens: 64,
            messages: vec![ChatMessage::user("Hello")],
        }
    }

    #[tokio::test]
    async fn complete_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "model": "gpt-4o-mini",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Hi!"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 8, "completion_tokens": 2, "total_tokens": 10}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = test_client(&format!("{}/v1", server.uri()))
            .complete(&test_request())
            .await
            .unwrap();
        assert_eq!(resp.text(), Some("Hi!"));
        assert_eq!(resp.usage.unwrap().prompt_tokens, 8);
    }

    #[tokio::test]
    async fn status_codes_follow_the_taxonomy() {
        for (status, expected) in [
            (401, "auth"),
            (403, "auth"),
            (404, "auth"),
            (402, "capacity"),
            (429, "capacity"),
            (408, "transient"),
            (500, "transient"),
            (503, "transient"),
            (400, "transient"),
        ] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
                    "error": {"message": "nope", "type": "test_error"}
                })))
                .mount(&server)
                .await;

            let err = test_client(&server.uri())
                .complete(&test_request())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), expected, "status {status}: {err}");
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let client =
            OpenAiClient::new(Some("sk".into()), "http://127.0.0.1:9", Duration::from_secs(2))
                .unwrap();
        let err = client.complete(&test_request()).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Transient {
                kind: TransientKind::Network | TransientKind::Timeout,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn missing_key_is_auth() {
        let client = OpenAiClient::new(None, "http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        assert!(matches!(
            client.complete(&test_request()).await,
            Err(ProviderError::Auth { .. })
        ));
    }
}
