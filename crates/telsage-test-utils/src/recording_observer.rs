// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observability adapter that captures telemetry for assertions.

use std::sync::Mutex;

use async_trait::async_trait;

use telsage_core::{
    AdapterType, DispatchOutcome, HealthStatus, ObservabilityAdapter, PluginAdapter,
    QueryTelemetry, TelsageError,
};

/// Keeps every recorded [`QueryTelemetry`] in memory.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<QueryTelemetry>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events, in delivery order.
    pub fn events(&self) -> Vec<QueryTelemetry> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn outcomes(&self) -> Vec<DispatchOutcome> {
        self.events().iter().map(|e| e.outcome).collect()
    }
}

#[async_trait]
impl PluginAdapter for RecordingObserver {
    fn name(&self) -> &str {
        "recording-observer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, TelsageError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TelsageError> {
        Ok(())
    }
}

#[async_trait]
impl ObservabilityAdapter for RecordingObserver {
    async fn record(&self, event: QueryTelemetry) -> Result<(), TelsageError> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
        Ok(())
    }
}
