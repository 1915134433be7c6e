// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible provider adapter for Telsage.
//!
//! Speaks the chat completions protocol, so one adapter covers OpenAI and
//! every vendor exposing the same endpoint (Mistral, OpenRouter, Google's
//! OpenAI-compatible API) through `base_url`.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use telsage_config::model::ProviderConfig;
use telsage_core::{
    AdapterType, HealthStatus, PluginAdapter, ProviderAdapter, ProviderError, ProviderRequest,
    ProviderResponse, TelsageError, TokenUsage, TransientKind,
};
use tracing::{debug, info, warn};

use crate::client::OpenAiClient;
use crate::types::{ChatMessage, ChatRequest};

/// Chat completions provider implementing [`ProviderAdapter`].
pub struct OpenAiProvider {
    name: String,
    client: OpenAiClient,
}

impl OpenAiProvider {
    /// Creates a provider from a `[[providers]]` entry.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, TelsageError> {
        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            warn!(provider = %config.name, "no API key found, calls will fail");
        }
        let client = OpenAiClient::new(
            api_key,
            config.base_url(),
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(
            provider = %config.name,
            model = %config.model,
            endpoint = client.endpoint(),
            "OpenAI-compatible provider initialized"
        );
        Ok(Self::with_client(config.name.clone(), client))
    }

    pub fn with_client(name: impl Into<String>, client: OpenAiClient) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, TelsageError> {
        if self.client.has_api_key() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy("no API key configured".to_string()))
        }
    }

    async fn shutdown(&self) -> Result<(), TelsageError> {
        debug!(provider = %self.name, "OpenAI-compatible provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let chat = ChatRequest {
            model: request.model,
            max_tokens: request.max_tokens,
            messages: vec![ChatMessage::user(request.prompt)],
        };
        let response = self.client.complete(&chat).await?;

        let content = match response.text() {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => {
                let reason = response
                    .choices
                    .first()
                    .and_then(|c| c.finish_reason.as_deref())
                    .unwrap_or("no choices");
                return Err(ProviderError::transient(
                    TransientKind::Malformed,
                    format!("completion contained no text ({reason})"),
                ));
            }
        };

        Ok(ProviderResponse {
            content,
            model: response.model,
            usage: response.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }
}
