// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider orchestration and the assistant composition root.
//!
//! The [`Assistant`] is the central coordinator that:
//! - Validates and classifies each query
//! - Composes the category-specific prompt
//! - Serves repeated queries from the response cache
//! - Dispatches through the [`ProviderOrchestrator`] with failover
//! - Emits one telemetry event per query

pub mod assistant;
pub mod orchestrator;
pub mod shutdown;
pub mod telemetry;

pub use assistant::{Assistant, AssistantBuilder, AssistantResponse};
pub use orchestrator::{DispatchSuccess, ProviderHealth, ProviderOrchestrator, ProviderSlot};
pub use shutdown::install_signal_handler;
pub use telemetry::{TelemetryDispatcher, TracingObserver, DEFAULT_TELEMETRY_CAPACITY};
