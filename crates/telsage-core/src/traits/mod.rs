// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod observability;
pub mod provider;

pub use adapter::PluginAdapter;
pub use observability::ObservabilityAdapter;
pub use provider::ProviderAdapter;
