// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics adapter for Telsage.
//!
//! Uses the metrics-rs facade with the Prometheus exporter.
//! Metrics are rendered as Prometheus text format via the `render()` method.

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use telsage_core::{
    AdapterType, HealthStatus, ObservabilityAdapter, PluginAdapter, QueryTelemetry, TelsageError,
};

pub use recording::{record_query, record_tokens, register_metrics};

/// Prometheus metrics adapter.
///
/// Installs the Prometheus recorder and exposes a handle for rendering
/// metrics in Prometheus text format.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Installs the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn new() -> Result<Self, TelsageError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            TelsageError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();
        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
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
impl ObservabilityAdapter for PrometheusAdapter {
    async fn record(&self, event: QueryTelemetry) -> Result<(), TelsageError> {
        recording::record_query(&event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use telsage_core::{DispatchOutcome, QueryCategory, TokenUsage};

    use super::*;

    // The only test in this crate that touches the global recorder.
    #[tokio::test]
    async fn global_adapter_records_and_renders() {
        let adapter = PrometheusAdapter::new().unwrap();
        assert_eq!(adapter.name(), "prometheus");
        assert_eq!(adapter.adapter_type(), AdapterType::Observability);

        adapter
            .record(QueryTelemetry {
                category: QueryCategory::Qos,
                confidence: 0.5,
                latency: Duration::from_millis(40),
                usage: TokenUsage::default(),
                estimated_cost_usd: 0.0,
                outcome: DispatchOutcome::Exhausted,
                provider: None,
            })
            .await
            .unwrap();

        let text = adapter.render();
        assert!(text.contains(r#"outcome="exhausted""#), "{text}");
        assert!(text.contains(r#"category="qos""#), "{text}");

        assert!(PrometheusAdapter::new().is_err());
    }
}
