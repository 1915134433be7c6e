// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics.

use metrics::{describe_counter, describe_gauge, describe_histogram};
use telsage_core::QueryTelemetry;

pub const QUERIES_TOTAL: &str = "telsage_queries_total";
pub const TOKENS_TOTAL: &str = "telsage_tokens_total";
pub const SPEND_USD: &str = "telsage_spend_usd";
pub const LATENCY_SECONDS: &str = "telsage_query_latency_seconds";
pub const CONFIDENCE: &str = "telsage_classification_confidence";

/// Register all Telsage metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(QUERIES_TOTAL, "Processed queries by outcome and category");
    describe_counter!(TOKENS_TOTAL, "Tokens consumed by provider calls");
    describe_gauge!(SPEND_USD, "Estimated provider spend in USD since start");
    describe_histogram!(LATENCY_SECONDS, "End-to-end query latency in seconds");
    describe_histogram!(CONFIDENCE, "Confidence of the primary classification");
}

/// Record one processed query.
pub fn record_query(event: &QueryTelemetry) {
    metrics::counter!(
        QUERIES_TOTAL,
        "outcome" => event.outcome.to_string(),
        "category" => event.category.to_string()
    )
    .increment(1);

    metrics::histogram!(LATENCY_SECONDS, "outcome" => event.outcome.to_string())
        .record(event.latency.as_secs_f64());
    metrics::histogram!(CONFIDENCE, "category" => event.category.to_string())
        .record(event.confidence);

    if let Some(provider) = &event.provider {
        record_tokens(
            provider,
            event.usage.input_tokens,
            event.usage.output_tokens,
        );
        if event.estimated_cost_usd > 0.0 {
            metrics::gauge!(SPEND_USD, "provider" => provider.clone())
                .increment(event.estimated_cost_usd);
        }
    }
}

/// Record token consumption for one provider call.
pub fn record_tokens(provider: &str, input: u32, output: u32) {
    metrics::counter!(TOKENS_TOTAL, "provider" => provider.to_string(), "type" => "input")
        .increment(u64::from(input));
    metrics::counter!(TOKENS_TOTAL, "provider" => provider.to_string(), "type" => "output")
        .increment(u64::from(output));
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use metrics_exporter_prometheus::PrometheusBuilder;
    use telsage_core::{DispatchOutcome, QueryCategory, TokenUsage};

    use super::*;

    fn event(outcome: DispatchOutcome, provider: Option<&str>) -> QueryTelemetry {
        QueryTelemetry {
            category: QueryCategory::Security,
            confidence: 0.8,
            latency: Duration::from_millis(250),
            usage: TokenUsage {
                input_tokens: 12,
                output_tokens: 30,
            },
            estimated_cost_usd: 0.002,
            outcome,
            provider: provider.map(str::to_string),
        }
    }

    #[test]
    fn success_records_counters_and_tokens() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_query(&event(DispatchOutcome::Success, Some("claude")));
            record_query(&event(DispatchOutcome::Success, Some("claude")));
        });

        let text = handle.render();
        assert!(text.contains(QUERIES_TOTAL), "{text}");
        assert!(text.contains(r#"outcome="success""#), "{text}");
        assert!(text.contains(r#"category="security""#), "{text}");
        assert!(text.contains(TOKENS_TOTAL), "{text}");
        assert!(text.contains(r#"provider="claude""#), "{text}");
        assert!(text.contains(LATENCY_SECONDS), "{text}");
    }

    #[test]
    fn cache_hit_records_no_tokens() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_query(&event(DispatchOutcome::CacheHit, None));
        });

        let text = handle.render();
        assert!(text.contains(r#"outcome="cache_hit""#), "{text}");
        assert!(!text.contains(TOKENS_TOTAL), "{text}");
        assert!(!text.contains(SPEND_USD), "{text}");
    }
}
