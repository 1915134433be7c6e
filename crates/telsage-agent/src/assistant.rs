// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The assistant: classification, prompt composition, caching and dispatch
//! wired into a single `process` call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use telsage_cache::{CacheKey, CacheStats, ResponseCache};
use telsage_config::model::TelsageConfig;
use telsage_context::PromptComposer;
use telsage_core::{
    DispatchOutcome, ObservabilityAdapter, Preferences, ProviderAdapter, ProviderAttempt,
    QueryClassification, QueryTelemetry, TelsageError, TokenUsage,
};
use telsage_router::QueryClassifier;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::orchestrator::{ProviderHealth, ProviderOrchestrator};
use crate::telemetry::{TelemetryDispatcher, DEFAULT_TELEMETRY_CAPACITY};

const DEFAULT_MAX_CONCURRENCY: usize = 4;
const DEFAULT_MAX_QUERY_CHARS: usize = 8000;
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// The answer to one query.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantResponse {
    pub text: String,
    pub classification: QueryClassification,
    /// Provider that produced the text. `None` for cache hits.
    pub provider: Option<String>,
    pub cache_hit: bool,
    /// Failed provider attempts before the answer.
    pub attempts: Vec<ProviderAttempt>,
    pub usage: TokenUsage,
    pub cost_usd: f64,
    pub latency: Duration,
}

/// Builder for [`Assistant`].
pub struct AssistantBuilder {
    classifier: QueryClassifier,
    composer: PromptComposer,
    cache: Option<(usize, Duration)>,
    observers: Vec<Arc<dyn ObservabilityAdapter>>,
    telemetry_capacity: usize,
    max_concurrency: usize,
    max_query_chars: usize,
}

impl AssistantBuilder {
    fn new() -> Self {
        Self {
            classifier: QueryClassifier::new(),
            composer: PromptComposer::new(),
            cache: Some((ResponseCache::DEFAULT_CAPACITY, DEFAULT_CACHE_TTL)),
            observers: Vec::new(),
            telemetry_capacity: DEFAULT_TELEMETRY_CAPACITY,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_query_chars: DEFAULT_MAX_QUERY_CHARS,
        }
    }

    /// Builder seeded from the `[assistant]`, `[cache]` and `[classifier]` sections.
    pub fn from_config(config: &TelsageConfig) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| (config.cache.capacity, Duration::from_secs(config.cache.ttl_secs)));
        Self {
            classifier: QueryClassifier::from_config(&config.classifier),
            composer: PromptComposer::from_config(&config.assistant),
            cache,
            max_concurrency: config.assistant.max_concurrency,
            max_query_chars: config.assistant.max_query_chars,
            ..Self::new()
        }
    }

    pub fn classifier(mut self, classifier: QueryClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn composer(mut self, composer: PromptComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn cache(mut self, capacity: usize, ttl: Duration) -> Self {
        self.cache = Some((capacity, ttl));
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ObservabilityAdapter>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn observers(mut self, observers: Vec<Arc<dyn ObservabilityAdapter>>) -> Self {
        self.observers.extend(observers);
        self
    }

    pub fn telemetry_capacity(mut self, capacity: usize) -> Self {
        self.telemetry_capacity = capacity;
        self
    }

    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit;
        self
    }

    pub fn max_query_chars(mut self, limit: usize) -> Self {
        self.max_query_chars = limit;
        self
    }

    /// Assemble the assistant. Spawns the telemetry task when observers are
    /// registered, so it must run inside a Tokio runtime in that case.
    pub fn build(self, orchestrator: ProviderOrchestrator) -> Result<Assistant, TelsageError> {
        let telemetry = TelemetryDispatcher::spawn(self.observers, self.telemetry_capacity)?;
        let (cache, cache_ttl) = match self.cache {
            Some((capacity, ttl)) => (Some(ResponseCache::new(capacity)), ttl),
            None => (None, Duration::ZERO),
        };
        Ok(Assistant {
            classifier: self.classifier,
            composer: self.composer,
            cache,
            cache_ttl,
            orchestrator,
            telemetry,
            max_concurrency: self.max_concurrency.max(1),
            max_query_chars: self.max_query_chars.max(1),
        })
    }
}

/// Composition root: owns the classifier, composer, cache, orchestrator and
/// telemetry dispatcher for the lifetime of the process.
pub struct Assistant {
    classifier: QueryClassifier,
    composer: PromptComposer,
    cache: Option<ResponseCache>,
    cache_ttl: Duration,
    orchestrator: ProviderOrchestrator,
    telemetry: TelemetryDispatcher,
    max_concurrency: usize,
    max_query_chars: usize,
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("cache_enabled", &self.cache.is_some())
            .field("cache_ttl", &self.cache_ttl)
            .field("max_concurrency", &self.max_concurrency)
            .field("max_query_chars", &self.max_query_chars)
            .finish_non_exhaustive()
    }
}

impl Assistant {
    pub fn builder() -> AssistantBuilder {
        AssistantBuilder::new()
    }

    /// Build the assistant described by `config`, using `providers` as the
    /// client for each configured provider name.
    pub fn from_config(
        config: &TelsageConfig,
        providers: &HashMap<String, Arc<dyn ProviderAdapter>>,
        observers: Vec<Arc<dyn ObservabilityAdapter>>,
    ) -> Result<Self, TelsageError> {
        let orchestrator = ProviderOrchestrator::from_config(config, providers)?;
        let assistant = AssistantBuilder::from_config(config)
            .observers(observers)
            .build(orchestrator)?;
        info!(
            name = %config.assistant.name,
            cache = assistant.cache.is_some(),
            max_concurrency = assistant.max_concurrency,
            "assistant ready"
        );
        Ok(assistant)
    }

    pub fn classifier(&self) -> &QueryClassifier {
        &self.classifier
    }

    pub fn composer(&self) -> &PromptComposer {
        &self.composer
    }

    pub fn orchestrator(&self) -> &ProviderOrchestrator {
        &self.orchestrator
    }

    /// Cache counters, or `None` when caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(ResponseCache::stats)
    }

    /// Answer one query.
    ///
    /// Exactly one telemetry event is emitted per call, whatever the outcome.
    pub async fn process(
        &self,
        query: &str,
        prefs: &Preferences,
    ) -> Result<AssistantResponse, TelsageError> {
        let started = Instant::now();
        let query = query.trim();

        if let Err(err) = self.check_query(query, prefs) {
            debug!(error = %err, "query rejected");
            self.emit(
                &QueryClassification::general(),
                started,
                TokenUsage::default(),
                0.0,
                DispatchOutcome::Rejected,
                None,
            );
            return Err(err);
        }

        let classification = self.classifier.classify(query);
        let prompt = self.composer.compose(query, &classification);
        let cache = self.cache.as_ref().filter(|_| !prefs.bypass_cache);
        let key = CacheKey::fingerprint(
            query,
            &classification,
            prefs.provider.as_deref(),
            prefs.max_tokens,
        );

        if let Some(cache) = cache
            && let Some(text) = cache.get(&key)
        {
            debug!(category = %classification.primary_type(), "cache hit");
            self.emit(
                &classification,
                started,
                TokenUsage::default(),
                0.0,
                DispatchOutcome::CacheHit,
                None,
            );
            return Ok(AssistantResponse {
                text,
                classification,
                provider: None,
                cache_hit: true,
                attempts: Vec::new(),
                usage: TokenUsage::default(),
                cost_usd: 0.0,
                latency: started.elapsed(),
            });
        }

        match self.orchestrator.dispatch(&prompt, &classification, prefs).await {
            Ok(success) => {
                if let Some(cache) = cache {
                    cache.put(key, success.response.content.clone(), self.cache_ttl);
                }
                self.emit(
                    &classification,
                    started,
                    success.usage,
                    success.cost_usd,
                    DispatchOutcome::Success,
                    Some(success.provider.clone()),
                );
                Ok(AssistantResponse {
                    text: success.response.content,
                    classification,
                    provider: Some(success.provider),
                    cache_hit: false,
                    attempts: success.attempts,
                    usage: success.usage,
                    cost_usd: success.cost_usd,
                    latency: started.elapsed(),
                })
            }
            Err(err) => {
                let outcome = match err {
                    TelsageError::Fatal { .. } => DispatchOutcome::Fatal,
                    _ => DispatchOutcome::Exhausted,
                };
                warn!(
                    category = %classification.primary_type(),
                    outcome = %outcome,
                    error = %err,
                    "query failed"
                );
                self.emit(
                    &classification,
                    started,
                    TokenUsage::default(),
                    0.0,
                    outcome,
                    None,
                );
                Err(err)
            }
        }
    }

    /// Answer many queries with at most `max_concurrency` in flight.
    /// Results are returned in input order.
    pub async fn process_batch<S: AsRef<str>>(
        &self,
        queries: &[S],
        prefs: &Preferences,
    ) -> Vec<Result<AssistantResponse, TelsageError>> {
        info!(
            queries = queries.len(),
            max_concurrency = self.max_concurrency,
            "processing batch"
        );
        let mut results: Vec<(usize, Result<AssistantResponse, TelsageError>)> =
            stream::iter(queries.iter().enumerate())
                .map(|(index, query)| async move {
                    (index, self.process(query.as_ref(), prefs).await)
                })
                .buffer_unordered(self.max_concurrency)
                .collect()
                .await;
        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }

    /// Health of every configured provider.
    pub async fn health(&self) -> Vec<ProviderHealth> {
        self.orchestrator.health().await
    }

    /// Flush telemetry, shut down provider clients and drop cached responses.
    pub async fn shutdown(&self) {
        self.telemetry.shutdown().await;
        self.orchestrator.shutdown().await;
        if let Some(cache) = &self.cache {
            cache.clear();
        }
        info!("assistant shut down");
    }

    fn check_query(&self, query: &str, prefs: &Preferences) -> Result<(), TelsageError> {
        if query.is_empty() {
            return Err(TelsageError::InvalidQuery("the query is empty".to_string()));
        }
        let chars = query.chars().count();
        if chars > self.max_query_chars {
            return Err(TelsageError::InvalidQuery(format!(
                "the query is {chars} characters long; the limit is {}",
                self.max_query_chars
            )));
        }
        if let Some(provider) = &prefs.provider
            && !self.orchestrator.has_provider(provider)
        {
            return Err(TelsageError::InvalidQuery(format!(
                "unknown provider `{provider}`; configured: {}",
                self.orchestrator.provider_names().join(", ")
            )));
        }
        Ok(())
    }

    fn emit(
        &self,
        classification: &QueryClassification,
        started: Instant,
        usage: TokenUsage,
        estimated_cost_usd: f64,
        outcome: DispatchOutcome,
        provider: Option<String>,
    ) {
        self.telemetry.emit(QueryTelemetry {
            category: classification.primary_type(),
            confidence: classification.confidence_score(),
            latency: started.elapsed(),
            usage,
            estimated_cost_usd,
            outcome,
            provider,
        });
    }
}

#[cfg(test)]
mod tests {
    use telsage_core::{ProviderDescriptor, ProviderTier};
    use telsage_test_utils::MockProvider;

    use super::*;
    use crate::orchestrator::ProviderSlot;

    fn assistant_with(mock: &Arc<MockProvider>) -> Assistant {
        let descriptor = ProviderDescriptor {
            name: "mock".to_string(),
            tier: ProviderTier::Standard,
            model: "mock-model".to_string(),
            max_tokens: 64,
            cost_per_token: 0.0,
            timeout: Duration::from_secs(5),
        };
        let orchestrator =
            ProviderOrchestrator::new(vec![ProviderSlot::new(descriptor, mock.clone())]).unwrap();
        Assistant::builder()
            .max_query_chars(40)
            .build(orchestrator)
            .unwrap()
    }

    #[tokio::test]
    async fn rejects_blank_and_oversized_queries() {
        let mock = Arc::new(MockProvider::new("mock"));
        let assistant = assistant_with(&mock);
        let prefs = Preferences::default();

        for query in ["", "   \n"] {
            let err = assistant.process(query, &prefs).await.unwrap_err();
            assert!(matches!(err, TelsageError::InvalidQuery(_)));
        }
        let long = "a".repeat(41);
        assert!(matches!(
            assistant.process(&long, &prefs).await,
            Err(TelsageError::InvalidQuery(_))
        ));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn unknown_forced_provider_is_rejected() {
        let mock = Arc::new(MockProvider::new("mock"));
        let assistant = assistant_with(&mock);
        let prefs = Preferences {
            provider: Some("nope".into()),
            ..Preferences::default()
        };
        let err = assistant.process("what is QoS", &prefs).await.unwrap_err();
        assert!(err.to_string().contains("unknown provider `nope`"));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn prompt_carries_classification_and_query() {
        let mock = Arc::new(MockProvider::with_responses("mock", vec!["answer".into()]));
        let assistant = assistant_with(&mock);

        let response = assistant
            .process("Explain the handover procedure", &Preferences::default())
            .await
            .unwrap();
        assert_eq!(response.text, "answer");
        assert_eq!(response.provider.as_deref(), Some("mock"));
        assert!(!response.cache_hit);

        let request = &mock.requests()[0];
        assert!(request.prompt.contains("Primary Focus - procedure"));
        assert!(request.prompt.ends_with("User Query: Explain the handover procedure"));
        assert_eq!(request.max_tokens, 64);
    }

    #[tokio::test]
    async fn bypass_skips_cache_lookup_and_store() {
        let mock = Arc::new(MockProvider::new("mock"));
        let assistant = assistant_with(&mock);
        let bypass = Preferences {
            bypass_cache: true,
            ..Preferences::default()
        };

        assistant.process("what is qos", &bypass).await.unwrap();
        assistant.process("what is qos", &bypass).await.unwrap();
        assert_eq!(mock.call_count(), 2);
        assert_eq!(assistant.cache_stats().unwrap().insertions, 0);

        assistant.process("what is qos", &Preferences::default()).await.unwrap();
        let hit = assistant.process("what is qos", &Preferences::default()).await.unwrap();
        assert!(hit.cache_hit);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn disabled_cache_always_dispatches() {
        let mock = Arc::new(MockProvider::new("mock"));
        let descriptor = ProviderDescriptor {
            name: "mock".to_string(),
            tier: ProviderTier::Standard,
            model: "m".to_string(),
            max_tokens: 64,
            cost_per_token: 0.0,
            timeout: Duration::from_secs(5),
        };
        let orchestrator =
            ProviderOrchestrator::new(vec![ProviderSlot::new(descriptor, mock.clone())]).unwrap();
        let assistant = Assistant::builder().without_cache().build(orchestrator).unwrap();

        assistant.process("latency", &Preferences::default()).await.unwrap();
        assistant.process("latency", &Preferences::default()).await.unwrap();
        assert_eq!(mock.call_count(), 2);
        assert!(assistant.cache_stats().is_none());
    }
}
