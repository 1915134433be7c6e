// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-query telemetry fan-out.
//!
//! Events go through a bounded channel to a background task that forwards
//! them to every registered [`ObservabilityAdapter`]. Emitting never blocks:
//! when the channel is full the event is dropped.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use telsage_core::{
    AdapterType, HealthStatus, ObservabilityAdapter, PluginAdapter, QueryTelemetry, TelsageError,
};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default number of events buffered between the query path and observers.
pub const DEFAULT_TELEMETRY_CAPACITY: usize = 256;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends telemetry events to observers off the query path.
pub struct TelemetryDispatcher {
    sender: Mutex<Option<mpsc::Sender<QueryTelemetry>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    observers: Vec<Arc<dyn ObservabilityAdapter>>,
}

impl TelemetryDispatcher {
    /// A dispatcher that drops every event.
    pub fn disabled() -> Self {
        Self {
            sender: Mutex::new(None),
            worker: Mutex::new(None),
            observers: Vec::new(),
        }
    }

    /// Spawn the forwarding task on the current Tokio runtime.
    ///
    /// With no observers nothing is spawned and events are discarded.
    pub fn spawn(
        observers: Vec<Arc<dyn ObservabilityAdapter>>,
        capacity: usize,
    ) -> Result<Self, TelsageError> {
        if observers.is_empty() {
            return Ok(Self::disabled());
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            TelsageError::Internal(format!("telemetry requires a Tokio runtime: {e}"))
        })?;

        let (tx, mut rx) = mpsc::channel::<QueryTelemetry>(capacity.max(1));
        let targets = observers.clone();
        let worker = runtime.spawn(async move {
            while let Some(event) = rx.recv().await {
                for observer in &targets {
                    if let Err(e) = observer.record(event.clone()).await {
                        warn!(observer = observer.name(), error = %e, "telemetry observer failed");
                    }
                }
            }
            debug!("telemetry channel closed");
        });

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            observers,
        })
    }

    /// Queue an event without waiting.
    pub fn emit(&self, event: QueryTelemetry) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(tx) = sender.as_ref() else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                debug!(outcome = %event.outcome, "telemetry channel full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("telemetry channel closed, dropping event");
            }
        }
    }

    /// Stop accepting events, deliver the ones already queued, then shut
    /// down every observer.
    pub async fn shutdown(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        drop(sender);

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(worker) = worker {
            match tokio::time::timeout(FLUSH_TIMEOUT, worker).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "telemetry task failed"),
                Err(_) => warn!("telemetry flush timed out"),
            }
        }

        for observer in &self.observers {
            if let Err(e) = observer.shutdown().await {
                warn!(observer = observer.name(), error = %e, "observer shutdown failed");
            }
        }
    }
}

/// Writes one structured log line per processed query.
#[derive(Debug, Default)]
pub struct TracingObserver;

#[async_trait]
impl PluginAdapter for TracingObserver {
    fn name(&self) -> &str {
        "tracing"
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
impl ObservabilityAdapter for TracingObserver {
    async fn record(&self, event: QueryTelemetry) -> Result<(), TelsageError> {
        info!(
            category = %event.category,
            confidence = event.confidence,
            latency_ms = event.latency.as_millis() as u64,
            input_tokens = event.usage.input_tokens,
            output_tokens = event.usage.output_tokens,
            cost_usd = event.estimated_cost_usd,
            outcome = %event.outcome,
            provider = event.provider.as_deref().unwrap_or("-"),
            "query processed"
        );
        Ok(())
    }
}
