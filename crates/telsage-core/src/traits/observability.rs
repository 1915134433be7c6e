// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observability adapter trait for metrics and telemetry.

use async_trait::async_trait;

use crate::error::TelsageError;
use crate::traits::adapter::PluginAdapter;
use crate::types::QueryTelemetry;

/// Sink for per-query telemetry.
///
/// Invoked off the critical path; a slow or failing sink never delays a response.
#[async_trait]
pub trait ObservabilityAdapter: PluginAdapter {
    /// Records one processed query.
    async fn record(&self, event: QueryTelemetry) -> Result<(), TelsageError>;
}
