// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Telsage.
//!
//! Foundational trait definitions, the provider error taxonomy, and the types
//! shared by the classifier, the orchestrator and every adapter crate.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{ProviderAttempt, ProviderError, TelsageError, TransientKind};
pub use types::{
    AdapterType, CategoryScore, DispatchOutcome, HealthStatus, KeywordPriority, Preferences,
    ProviderDescriptor, ProviderRequest, ProviderResponse, ProviderTier, QueryCategory,
    QueryClassification, QueryTelemetry, TokenUsage,
};

pub use traits::{ObservabilityAdapter, PluginAdapter, ProviderAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telsage_error_has_all_variants() {
        let _config = TelsageError::Config("test".into());
        let _invalid = TelsageError::InvalidQuery("empty".into());
        let _fatal = TelsageError::Fatal {
            provider: "p".into(),
            source: ProviderError::auth("bad key"),
            attempts: vec![],
        };
        let _dispatch = TelsageError::from(ProviderError::capacity("429"));
        let _internal = TelsageError::Internal("test".into());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_observability_adapter<T: ObservabilityAdapter>() {}
    }

    #[test]
    fn token_usage_total_saturates() {
        let usage = TokenUsage {
            input_tokens: u32::MAX,
            output_tokens: 10,
        };
        assert_eq!(usage.total(), u32::MAX);
    }
}
