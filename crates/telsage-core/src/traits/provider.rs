// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for LLM backends (OpenAI, Anthropic, Mistral, ...).

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Capability interface every LLM backend implements.
///
/// Implementations must report failures through the [`ProviderError`] taxonomy so
/// the orchestrator can decide between failover and abort. Timeouts are enforced
/// by the caller; implementations may additionally apply their own.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a prompt and returns the full completion.
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}
