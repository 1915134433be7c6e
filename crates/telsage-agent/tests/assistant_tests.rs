// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests driving the assistant through mock providers.

use std::time::Duration;

use telsage_core::{
    DispatchOutcome, ObservabilityAdapter, Preferences, ProviderError, ProviderTier,
    QueryCategory, TelsageError, TransientKind,
};
use telsage_test_utils::{MockProvider, TestHarness};

#[tokio::test]
async fn identical_query_within_ttl_invokes_provider_once() {
    let harness = TestHarness::builder()
        .with_provider(
            ProviderTier::Standard,
            MockProvider::with_responses("primary", vec!["NAS security explained".into()]),
        )
        .build()
        .unwrap();

    let first = harness.ask("What is NAS security?").await.unwrap();
    let second = harness.ask("  what is NAS SECURITY?  ").await.unwrap();

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(second.text, "NAS security explained");
    assert_eq!(harness.provider("primary").call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn cached_response_expires_after_ttl() {
    let harness = TestHarness::builder()
        .with_provider(ProviderTier::Standard, MockProvider::new("primary"))
        .with_config(|c| c.cache.ttl_secs = 60)
        .build()
        .unwrap();

    harness.ask("explain paging").await.unwrap();
    tokio::time::advance(Duration::from_secs(61)).await;
    let again = harness.ask("explain paging").await.unwrap();

    assert!(!again.cache_hit);
    assert_eq!(harness.provider("primary").call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn capacity_on_primary_fails_over_to_backup() {
    let harness = TestHarness::builder()
        .with_provider(
            ProviderTier::Standard,
            MockProvider::new("primary")
                .then_err(ProviderError::capacity("429 rate limited"))
                .then_err(ProviderError::capacity("429 rate limited")),
        )
        .with_provider(
            ProviderTier::Standard,
            MockProvider::with_responses("backup", vec!["backup answer".into()]),
        )
        .with_order("primary", &["backup"])
        .build()
        .unwrap();

    let response = harness.ask("Explain the 5G registration procedure").await.unwrap();

    assert_eq!(response.text, "backup answer");
    assert_eq!(response.provider.as_deref(), Some("backup"));
    assert!(!response.attempts.is_empty());
    assert!(response.attempts.iter().all(|a| a.provider == "primary"));
}

#[tokio::test]
async fn auth_failure_never_reaches_backup() {
    let harness = TestHarness::builder()
        .with_provider(
            ProviderTier::Standard,
            MockProvider::new("primary").then_err(ProviderError::auth("401 invalid x-api-key")),
        )
        .with_provider(ProviderTier::Standard, MockProvider::new("backup"))
        .with_order("primary", &["backup"])
        .build()
        .unwrap();

    let err = harness.ask("What is QoS?").await.unwrap_err();

    assert!(matches!(err, TelsageError::Fatal { ref provider, .. } if provider == "primary"));
    assert!(!err.is_retryable());
    assert!(err.user_message().contains("contact the operator"));
    assert_eq!(harness.provider("backup").call_count(), 0);
}

#[tokio::test]
async fn exhaustion_names_every_provider() {
    let harness = TestHarness::builder()
        .with_provider(
            ProviderTier::Standard,
            MockProvider::new("primary").then_err(ProviderError::transient(
                TransientKind::Server,
                "502 bad gateway",
            )),
        )
        .with_provider(
            ProviderTier::Standard,
            MockProvider::new("backup").then_err(ProviderError::transient(
                TransientKind::Malformed,
                "missing choices",
            )),
        )
        .with_order("primary", &["backup"])
        .build()
        .unwrap();

    let err = harness.ask("What is QoS?").await.unwrap_err();

    assert!(err.is_retryable());
    assert!(err.user_message().contains("try again later"));
    let attempted: Vec<&str> = err.attempts().iter().map(|a| a.provider.as_str()).collect();
    assert_eq!(attempted, ["primary", "backup"]);
}

#[tokio::test]
async fn failures_are_not_cached() {
    let harness = TestHarness::builder()
        .with_provider(
            ProviderTier::Standard,
            MockProvider::new("only")
                .then_err(ProviderError::transient(TransientKind::Network, "reset"))
                .then_ok("recovered"),
        )
        .build()
        .unwrap();

    assert!(harness.ask("bearer setup").await.is_err());
    let response = harness.ask("bearer setup").await.unwrap();
    assert_eq!(response.text, "recovered");
    assert!(!response.cache_hit);
}

#[tokio::test]
async fn tier_routing_prefers_premium_for_security() {
    let harness = TestHarness::builder()
        .with_provider(ProviderTier::Economy, MockProvider::new("econ"))
        .with_provider(ProviderTier::Premium, MockProvider::new("prem"))
        .with_config(|c| c.routing.enabled = true)
        .build()
        .unwrap();

    let security = harness
        .ask("How does authentication protect integrity?")
        .await
        .unwrap();
    assert_eq!(security.classification.primary_type(), QueryCategory::Security);
    assert_eq!(security.provider.as_deref(), Some("prem"));

    let general = harness.ask("hello there").await.unwrap();
    assert_eq!(general.classification.primary_type(), QueryCategory::General);
    assert_eq!(general.provider.as_deref(), Some("econ"));
}

#[tokio::test]
async fn forced_provider_goes_first_and_keys_the_cache() {
    let harness = TestHarness::builder()
        .with_provider(ProviderTier::Standard, MockProvider::new("a"))
        .with_provider(ProviderTier::Standard, MockProvider::new("b"))
        .build()
        .unwrap();

    let forced = Preferences {
        provider: Some("b".into()),
        ..Preferences::default()
    };
    let via_b = harness.assistant.process("latency budget", &forced).await.unwrap();
    assert_eq!(via_b.provider.as_deref(), Some("b"));

    let default = harness.ask("latency budget").await.unwrap();
    assert!(!default.cache_hit);
    assert_eq!(default.provider.as_deref(), Some("a"));
}

#[tokio::test]
async fn truncated_answer_is_not_served_to_default_requests() {
    let harness = TestHarness::builder()
        .with_provider(
            ProviderTier::Standard,
            MockProvider::with_responses("primary", vec!["short".into(), "full answer".into()]),
        )
        .build()
        .unwrap();

    let capped = Preferences {
        max_tokens: Some(5),
        ..Preferences::default()
    };
    let first = harness.assistant.process("explain RRC states", &capped).await.unwrap();
    assert_eq!(first.text, "short");

    let second = harness.ask("explain RRC states").await.unwrap();
    assert!(!second.cache_hit);
    assert_eq!(second.text, "full answer");

    let repeat = harness.assistant.process("explain RRC states", &capped).await.unwrap();
    assert!(repeat.cache_hit);
    assert_eq!(repeat.text, "short");
    assert_eq!(harness.provider("primary").call_count(), 2);
}

#[tokio::test]
async fn request_ceiling_skips_expensive_provider() {
    let harness = TestHarness::builder()
        .with_provider(ProviderTier::Premium, MockProvider::new("pricey"))
        .with_provider(ProviderTier::Economy, MockProvider::new("cheap"))
        .with_config(|c| {
            c.providers[0].cost_per_token = 0.01;
            c.providers[1].cost_per_token = 0.000_000_1;
            c.cost.max_request_cost_usd = Some(0.05);
        })
        .build()
        .unwrap();

    let response = harness.ask("What is the N2 interface?").await.unwrap();

    assert_eq!(response.provider.as_deref(), Some("cheap"));
    assert_eq!(harness.provider("pricey").call_count(), 0);
    assert!(matches!(
        response.attempts[0].error,
        ProviderError::BudgetExceeded { .. }
    ));
}

#[tokio::test]
async fn daily_budget_blocks_once_spent() {
    let harness = TestHarness::builder()
        .with_provider(ProviderTier::Standard, MockProvider::new("only"))
        .with_config(|c| c.providers[0].cost_per_token = 0.001)
        .with_budget(0.01)
        .build()
        .unwrap();

    // Mock usage is 30 tokens: 0.03 USD, which spends the whole daily cap.
    harness.ask("first question about qos").await.unwrap();
    let err = harness.ask("second question about qos").await.unwrap_err();

    assert!(matches!(
        err.attempts()[0].error,
        ProviderError::BudgetExceeded { .. }
    ));
    assert_eq!(harness.provider("only").call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn batch_respects_concurrency_and_preserves_order() {
    let harness = TestHarness::builder()
        .with_provider(
            ProviderTier::Standard,
            MockProvider::new("slow").with_delay(Duration::from_secs(1)),
        )
        .with_config(|c| c.assistant.max_concurrency = 2)
        .build()
        .unwrap();

    let queries = [
        "Explain the attach procedure",
        "Describe the core network architecture",
        "What encryption protects the air interface?",
        "How is throughput measured?",
        "Plan the migration from legacy systems",
    ];
    let results = harness
        .assistant
        .process_batch(&queries, &Preferences::default())
        .await;

    let categories: Vec<QueryCategory> = results
        .iter()
        .map(|r| r.as_ref().unwrap().classification.primary_type())
        .collect();
    assert_eq!(
        categories,
        [
            QueryCategory::Procedure,
            QueryCategory::Architecture,
            QueryCategory::Security,
            QueryCategory::Performance,
            QueryCategory::Migration,
        ]
    );
    assert_eq!(harness.provider("slow").call_count(), 5);
    assert_eq!(harness.provider("slow").max_in_flight(), 2);
}

#[tokio::test]
async fn batch_keeps_per_query_errors() {
    let harness = TestHarness::builder()
        .with_provider(ProviderTier::Standard, MockProvider::new("only"))
        .build()
        .unwrap();

    let results = harness
        .assistant
        .process_batch(&["what is qos", "", "what is a bearer"], &Preferences::default())
        .await;

    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(TelsageError::InvalidQuery(_))));
    assert!(results[2].is_ok());
}

#[tokio::test]
async fn every_processed_query_emits_one_event() {
    let harness = TestHarness::builder()
        .with_provider(
            ProviderTier::Standard,
            MockProvider::new("primary")
                .then_ok("answer")
                .then_err(ProviderError::auth("403")),
        )
        .build()
        .unwrap();

    harness.ask("registration flow").await.unwrap();
    harness.ask("registration flow").await.unwrap();
    harness.ask("   ").await.unwrap_err();
    harness.ask("handover failure").await.unwrap_err();
    harness.shutdown().await;

    let events = harness.observer().events();
    let outcomes: Vec<DispatchOutcome> = events.iter().map(|e| e.outcome).collect();
    assert_eq!(
        outcomes,
        [
            DispatchOutcome::Success,
            DispatchOutcome::CacheHit,
            DispatchOutcome::Rejected,
            DispatchOutcome::Fatal,
        ]
    );
    assert_eq!(events[0].category, QueryCategory::Procedure);
    assert_eq!(events[0].provider.as_deref(), Some("primary"));
    assert_eq!(events[0].usage.total(), 30);
    assert_eq!(events[1].provider, None);
}

#[tokio::test]
async fn missing_provider_client_is_a_config_error() {
    use std::collections::HashMap;
    use std::sync::Arc;

    use telsage_agent::{Assistant, TracingObserver};
    use telsage_config::model::{ProviderConfig, ProviderKind, TelsageConfig};

    let mut config = TelsageConfig::default();
    config.providers.push(ProviderConfig {
        name: "orphan".into(),
        kind: ProviderKind::Anthropic,
        tier: ProviderTier::Standard,
        model: "claude".into(),
        max_tokens: 100,
        cost_per_token: 0.0,
        api_key: None,
        api_key_env: None,
        base_url: None,
        timeout_secs: 30,
    });

    let result = Assistant::from_config(&config, &HashMap::new(), Vec::new());
    assert!(matches!(result, Err(TelsageError::Config(_))));

    let observers: Vec<Arc<dyn ObservabilityAdapter>> = vec![Arc::new(TracingObserver)];
    let no_providers =
        Assistant::from_config(&TelsageConfig::default(), &HashMap::new(), observers);
    assert!(matches!(no_providers, Err(TelsageError::Config(_))));
}
