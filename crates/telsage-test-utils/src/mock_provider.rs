// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with a scripted queue of
//! outcomes, enabling failover and error-taxonomy tests without external
//! API calls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use telsage_core::{
    AdapterType, HealthStatus, PluginAdapter, ProviderAdapter, ProviderError, ProviderRequest,
    ProviderResponse, TelsageError, TokenUsage,
};

/// Usage reported by every scripted success.
pub const MOCK_USAGE: TokenUsage = TokenUsage {
    input_tokens: 10,
    output_tokens: 20,
};

/// A mock LLM provider that replays scripted outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty,
/// a default "mock response" text is returned.
pub struct MockProvider {
    name: String,
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    delay: Option<Duration>,
    health: HealthStatus,
    requests: Mutex<Vec<ProviderRequest>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockProvider {
    /// Create a new mock provider with an empty script.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            delay: None,
            health: HealthStatus::Healthy,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Create a mock provider pre-loaded with successful responses.
    pub fn with_responses(name: impl Into<String>, responses: Vec<String>) -> Self {
        let provider = Self::new(name);
        for text in responses {
            provider.push_ok(text);
        }
        provider
    }

    /// Queue a successful response.
    pub fn then_ok(self, text: impl Into<String>) -> Self {
        self.push_ok(text);
        self
    }

    /// Queue a failure.
    pub fn then_err(self, error: ProviderError) -> Self {
        self.push_err(error);
        self
    }

    /// Sleep this long (on the tokio clock) before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Status returned from `health_check`.
    pub fn with_health(mut self, health: HealthStatus) -> Self {
        self.health = health;
        self
    }

    pub fn push_ok(&self, text: impl Into<String>) {
        lock(&self.script).push_back(Ok(text.into()));
    }

    pub fn push_err(&self, error: ProviderError) {
        lock(&self.script).push_back(Err(error));
    }

    /// Number of times `send` was invoked.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in arrival order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        lock(&self.requests).clone()
    }

    /// Highest number of concurrent `send` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
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
        Ok(self.health.clone())
    }

    async fn shutdown(&self) -> Result<(), TelsageError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let model = request.model.clone();
        lock(&self.requests).push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = lock(&self.script).pop_front();
        match next {
            Some(Ok(content)) => Ok(ProviderResponse {
                content,
                model,
                usage: Some(MOCK_USAGE),
            }),
            Some(Err(error)) => Err(error),
            None => Ok(ProviderResponse {
                content: "mock response".to_string(),
                model,
                usage: Some(MOCK_USAGE),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProviderRequest {
        ProviderRequest {
            prompt: "hello".to_string(),
            model: "test-model".to_string(),
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn default_response_when_script_empty() {
        let provider = MockProvider::new("mock");
        let resp = provider.send(request()).await.unwrap();
        assert_eq!(resp.content, "mock response");
        assert_eq!(resp.model, "test-model");
        assert_eq!(resp.usage, Some(MOCK_USAGE));
    }

    #[tokio::test]
    async fn scripted_outcomes_replay_in_order() {
        let provider = MockProvider::new("mock")
            .then_err(ProviderError::capacity("429"))
            .then_ok("second");
        assert!(matches!(
            provider.send(request()).await,
            Err(ProviderError::Capacity { .. })
        ));
        assert_eq!(provider.send(request()).await.unwrap().content, "second");
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_uses_tokio_clock() {
        let provider = MockProvider::with_responses("slow", vec!["late".into()])
            .with_delay(Duration::from_secs(30));
        let start = tokio::time::Instant::now();
        let resp = provider.send(request()).await.unwrap();
        assert_eq!(resp.content, "late");
        assert!(start.elapsed() >= Duration::from_secs(30));
        assert_eq!(provider.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn health_is_configurable() {
        let provider =
            MockProvider::new("mock").with_health(HealthStatus::Degraded("slow".into()));
        assert_eq!(
            provider.health_check().await.unwrap(),
            HealthStatus::Degraded("slow".into())
        );
    }
}
