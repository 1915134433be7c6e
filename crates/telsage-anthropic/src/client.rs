// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! Provides [`AnthropicClient`] which handles request construction,
//! authentication headers, and mapping of HTTP failures onto the provider
//! error taxonomy. Retries are left to the orchestrator.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use telsage_core::{ProviderError, TelsageError, TransientKind};
use tracing::debug;

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

/// Messages endpoint, relative to the base URL.
const MESSAGES_PATH: &str = "/v1/messages";

/// API version header value.
pub const API_VERSION: &str = "2023-06-01";

/// HTTP client for Anthropic API communication.
#[derive(Debug)]
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    endpoint: String,
}

impl AnthropicClient {
    /// Creates a new Anthropic API client.
    ///
    /// A missing `api_key` is not an error here: every call fails with an
    /// auth error instead, so a misconfigured backup does not prevent startup.
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, TelsageError> {
        let mut headers = HeaderMap::new();
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| TelsageError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.map(SecretString::from),
            endpoint: format!("{}{MESSAGES_PATH}", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends a non-streaming request and returns the full response.
    pub async fn send_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, ProviderError> {
        let Some(api_key) = &self.api_key else {
            return Err(ProviderError::auth(
                "no Anthropic API key configured (set api_key, api_key_env or ANTHROPIC_API_KEY)",
            ));
        };
        let key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|e| ProviderError::auth(format!("invalid API key header value: {e}")))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", key)
            .json(request)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "anthropic response received");

        let body = response.text().await.map_err(request_error)?;
        if !status.is_success() {
            let detail = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!("{}: {}", api_err.error.type_, api_err.error.message),
                Err(_) => body,
            };
            return Err(ProviderError::from_http_status(status.as_u16(), detail));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::transient(
                TransientKind::Malformed,
                format!("failed to parse Anthropic response: {e}"),
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
