// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude provider adapter for Telsage.
//!
//! This crate implements [`ProviderAdapter`] for the Anthropic Messages API.
//! The composed prompt is sent as a single user message.

pub mod client;
pub mod types;

use async_trait::async_trait;
use telsage_config::model::ProviderConfig;
use telsage_core::{
    AdapterType, HealthStatus, PluginAdapter, ProviderAdapter, ProviderError, ProviderRequest,
    ProviderResponse, TelsageError, TokenUsage, TransientKind,
};
use tracing::{debug, info, warn};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

/// Anthropic Claude provider implementing [`ProviderAdapter`].
///
/// API key resolution order: `api_key` -> `api_key_env` -> `ANTHROPIC_API_KEY`.
/// Without a key the provider still starts, and every call fails with an
/// auth error.
pub struct AnthropicProvider {
    name: String,
    client: AnthropicClient,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider from a `[[providers]]` entry.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, TelsageError> {
        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            warn!(provider = %config.name, "no API key found, calls will fail");
        }
        let client = AnthropicClient::new(
            api_key,
            config.base_url(),
            std::time::Duration::from_secs(config.timeout_secs),
        )?;

        info!(
            provider = %config.name,
            model = %config.model,
            endpoint = client.endpoint(),
            "Anthropic provider initialized"
        );

        Ok(Self::with_client(config.name.clone(), client))
    }

    /// Creates a provider with an existing client.
    pub fn with_client(name: impl Into<String>, client: AnthropicClient) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }

    fn to_message_request(request: ProviderRequest) -> MessageRequest {
        MessageRequest {
            model: request.model,
            max_tokens: request.max_tokens,
            messages: vec![ApiMessage::user(request.prompt)],
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
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
        // No API call: health checks must not spend tokens.
        if self.client.has_api_key() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy("no API key configured".to_string()))
        }
    }

    async fn shutdown(&self) -> Result<(), TelsageError> {
        debug!(provider = %self.name, "Anthropic provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let api_request = Self::to_message_request(request);
        let response = self.client.send_message(&api_request).await?;

        let content = response.text();
        if content.trim().is_empty() {
            return Err(ProviderError::transient(
                TransientKind::Malformed,
                format!(
                    "response {} contained no text (stop_reason: {})",
                    response.id,
                    response.stop_reason.as_deref().unwrap_or("none")
                ),
            ));
        }

        Ok(ProviderResponse {
            content,
            model: response.model,
            usage: response.usage.map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        })
    }
}
