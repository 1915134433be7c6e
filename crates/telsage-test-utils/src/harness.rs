// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete assistant from a [`TelsageConfig`]
//! whose providers are all [`MockProvider`]s, plus a [`RecordingObserver`]
//! that sees every telemetry event.

use std::collections::HashMap;
use std::sync::Arc;

use telsage_agent::{Assistant, AssistantResponse};
use telsage_config::model::{ProviderConfig, ProviderKind, TelsageConfig};
use telsage_core::{
    ObservabilityAdapter, PluginAdapter, Preferences, ProviderAdapter, ProviderTier,
    TelsageError,
};

use crate::mock_provider::MockProvider;
use crate::recording_observer::RecordingObserver;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: TelsageConfig,
    providers: Vec<(String, Arc<MockProvider>)>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = TelsageConfig::default();
        config.routing.enabled = false;
        Self {
            config,
            providers: Vec::new(),
        }
    }

    /// Register a mock provider. Declaration order is the dispatch order
    /// unless a primary is set.
    pub fn with_provider(mut self, tier: ProviderTier, mock: MockProvider) -> Self {
        let name = mock.name().to_string();
        self.config.providers.push(ProviderConfig {
            name: name.clone(),
            kind: ProviderKind::Openai,
            tier,
            model: format!("{name}-model"),
            max_tokens: 256,
            cost_per_token: 0.0,
            api_key: Some("test-key".to_string()),
            api_key_env: None,
            base_url: None,
            timeout_secs: 30,
        });
        self.providers.push((name, Arc::new(mock)));
        self
    }

    /// Set the primary provider and its ordered backups.
    pub fn with_order(mut self, primary: &str, backups: &[&str]) -> Self {
        self.config.orchestration.primary = Some(primary.to_string());
        self.config.orchestration.backups = backups.iter().map(|b| b.to_string()).collect();
        self
    }

    /// Set a daily budget cap for the test environment.
    pub fn with_budget(mut self, daily_usd: f64) -> Self {
        self.config.cost.daily_budget_usd = Some(daily_usd);
        self
    }

    /// Apply arbitrary changes to the configuration before building.
    pub fn with_config(mut self, edit: impl FnOnce(&mut TelsageConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Build the test harness. Must run inside a Tokio runtime.
    pub fn build(self) -> Result<TestHarness, TelsageError> {
        let adapters: HashMap<String, Arc<dyn ProviderAdapter>> = self
            .providers
            .iter()
            .map(|(name, mock)| {
                let adapter: Arc<dyn ProviderAdapter> = mock.clone();
                (name.clone(), adapter)
            })
            .collect();

        let observer = Arc::new(RecordingObserver::new());
        let observers: Vec<Arc<dyn ObservabilityAdapter>> = vec![observer.clone()];
        let assistant = Assistant::from_config(&self.config, &adapters, observers)?;

        Ok(TestHarness {
            assistant,
            providers: self.providers.into_iter().collect(),
            observer,
            config: self.config,
        })
    }
}

/// A fully assembled assistant backed by mock providers.
pub struct TestHarness {
    pub assistant: Assistant,
    providers: HashMap<String, Arc<MockProvider>>,
    observer: Arc<RecordingObserver>,
    config: TelsageConfig,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Process a query with default preferences.
    pub async fn ask(&self, query: &str) -> Result<AssistantResponse, TelsageError> {
        self.assistant.process(query, &Preferences::default()).await
    }

    /// The mock registered under `name`.
    ///
    /// # Panics
    ///
    /// Panics if no such provider was registered.
    pub fn provider(&self, name: &str) -> &MockProvider {
        match self.providers.get(name) {
            Some(mock) => mock,
            None => panic!("no mock provider named `{name}`"),
        }
    }

    pub fn observer(&self) -> &RecordingObserver {
        &self.observer
    }

    pub fn config(&self) -> &TelsageConfig {
        &self.config
    }

    /// Flush telemetry and shut the assistant down.
    pub async fn shutdown(&self) {
        self.assistant.shutdown().await;
    }
}
