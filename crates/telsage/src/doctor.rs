// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `telsage doctor` command implementation.
//!
//! Runs diagnostic checks against the loaded configuration: provider
//! credentials, dispatch order, budget caps and the allocator.

use std::time::{Duration, Instant};

use telsage_config::model::TelsageConfig;
use telsage_core::HealthStatus;

use crate::providers::build_providers;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: impl Into<String>, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
            duration: Duration::ZERO,
        }
    }

    fn timed(mut self, start: Instant) -> Self {
        self.duration = start.elapsed();
        self
    }
}

/// Run every check, print the report and return the number of failures.
pub async fn run_doctor(config: &TelsageConfig) -> usize {
    let results = collect_checks(config).await;

    println!();
    println!("  telsage doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => {
                warn_count += 1;
                "[WARN]"
            }
            CheckStatus::Fail => {
                fail_count += 1;
                "[FAIL]"
            }
        };
        println!(
            "    {tag} {:<24} {} ({}ms)",
            result.name,
            result.message,
            result.duration.as_millis()
        );
    }

    println!();
    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    fail_count
}

pub async fn collect_checks(config: &TelsageConfig) -> Vec<CheckResult> {
    let mut results = vec![check_providers(config), check_dispatch_order(config)];
    results.extend(check_credentials(config).await);
    results.push(check_budget(config));
    results.push(check_cache(config));
    results.push(check_memory_baseline());
    results
}

fn check_providers(config: &TelsageConfig) -> CheckResult {
    match config.providers.len() {
        0 => CheckResult::new(
            "Providers",
            CheckStatus::Fail,
            "none configured; add a [[providers]] entry",
        ),
        n => CheckResult::new("Providers", CheckStatus::Pass, format!("{n} configured")),
    }
}

fn check_dispatch_order(config: &TelsageConfig) -> CheckResult {
    let order = config.dispatch_order();
    if order.is_empty() {
        return CheckResult::new("Dispatch order", CheckStatus::Fail, "empty");
    }
    let routing = if config.routing.enabled {
        "tier routing on"
    } else {
        "tier routing off"
    };
    let status = if order.len() == 1 {
        CheckStatus::Warn
    } else {
        CheckStatus::Pass
    };
    let message = match status {
        CheckStatus::Warn => format!("{} only, no failover ({routing})", order.join(" -> ")),
        _ => format!("{} ({routing})", order.join(" -> ")),
    };
    CheckResult::new("Dispatch order", status, message)
}

async fn check_credentials(config: &TelsageConfig) -> Vec<CheckResult> {
    let start = Instant::now();
    let providers = match build_providers(config) {
        Ok(providers) => providers,
        Err(e) => {
            return vec![
                CheckResult::new("Provider clients", CheckStatus::Fail, e.to_string())
                    .timed(start),
            ];
        }
    };

    let mut results = Vec::with_capacity(config.providers.len());
    for entry in &config.providers {
        let start = Instant::now();
        let name = format!("Provider `{}`", entry.name);
        let Some(adapter) = providers.get(&entry.name) else {
            continue;
        };
        let result = match adapter.health_check().await {
            Ok(HealthStatus::Healthy) => CheckResult::new(
                name,
                CheckStatus::Pass,
                format!("{} via {}", entry.model, entry.base_url()),
            ),
            Ok(HealthStatus::Degraded(reason)) => {
                CheckResult::new(name, CheckStatus::Warn, reason)
            }
            Ok(HealthStatus::Unhealthy(reason)) => {
                CheckResult::new(name, CheckStatus::Fail, reason)
            }
            Err(e) => CheckResult::new(name, CheckStatus::Fail, e.to_string()),
        };
        results.push(result.timed(start));
    }
    results
}

fn check_budget(config: &TelsageConfig) -> CheckResult {
    let cost = &config.cost;
    let fmt = |cap: Option<f64>| match cap {
        Some(usd) => format!("${usd:.2}"),
        None => "unlimited".to_string(),
    };
    let status = if cost.daily_budget_usd.is_none() && cost.monthly_budget_usd.is_none() {
        CheckStatus::Warn
    } else {
        CheckStatus::Pass
    };
    CheckResult::new(
        "Budget",
        status,
        format!(
            "daily {}, monthly {}",
            fmt(cost.daily_budget_usd),
            fmt(cost.monthly_budget_usd)
        ),
    )
}

fn check_cache(config: &TelsageConfig) -> CheckResult {
    if config.cache.enabled {
        CheckResult::new(
            "Response cache",
            CheckStatus::Pass,
            format!(
                "{} entries, ttl {}s",
                config.cache.capacity, config.cache.ttl_secs
            ),
        )
    } else {
        CheckResult::new("Response cache", CheckStatus::Warn, "disabled")
    }
}

fn check_memory_baseline() -> CheckResult {
    let start = Instant::now();

    #[cfg(not(target_env = "msvc"))]
    {
        use tikv_jemalloc_ctl::{epoch, stats};

        let reading = epoch::advance()
            .and_then(|_| stats::allocated::read())
            .map(|bytes| bytes as f64 / (1024.0 * 1024.0));
        match reading {
            Ok(mb) => {
                CheckResult::new("Memory", CheckStatus::Pass, format!("{mb:.1} MB allocated"))
                    .timed(start)
            }
            Err(e) => CheckResult::new("Memory", CheckStatus::Warn, format!("jemalloc stats: {e}"))
                .timed(start),
        }
    }

    #[cfg(target_env = "msvc")]
    {
        CheckResult::new("Memory", CheckStatus::Warn, "jemalloc not available").timed(start)
    }
}

#[cfg(test)]
mod tests {
    use telsage_config::model::{ProviderConfig, ProviderKind};
    use telsage_core::ProviderTier;

    use super::*;

    fn provider(name: &str, api_key: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            name: name.into(),
            kind: ProviderKind::Openai,
            tier: ProviderTier::Standard,
            model: "gpt-4o-mini".into(),
            max_tokens: 256,
            cost_per_token: 0.0,
            api_key: api_key.map(str::to_string),
            api_key_env: Some("TELSAGE_TEST_UNSET_DOCTOR_KEY".into()),
            base_url: Some("http://127.0.0.1:9".into()),
            timeout_secs: 5,
        }
    }

    fn find<'a>(results: &'a [CheckResult], name: &str) -> &'a CheckResult {
        results
            .iter()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("no check named {name}"))
    }

    #[tokio::test]
    async fn empty_config_fails_provider_checks() {
        let results = collect_checks(&TelsageConfig::default()).await;
        assert_eq!(find(&results, "Providers").status, CheckStatus::Fail);
        assert_eq!(find(&results, "Dispatch order").status, CheckStatus::Fail);
        assert_eq!(find(&results, "Budget").status, CheckStatus::Warn);
    }

    #[tokio::test]
    #[cfg(feature = "openai")]
    async fn missing_key_fails_credential_check() {
        let mut config = TelsageConfig::default();
        config.providers.push(provider("keyed", Some("sk-1")));
        config.providers.push(provider("keyless", None));
        config.cost.daily_budget_usd = Some(5.0);

        let results = collect_checks(&config).await;

        assert_eq!(find(&results, "Provider `keyed`").status, CheckStatus::Pass);
        assert_eq!(find(&results, "Provider `keyless`").status, CheckStatus::Fail);
        assert_eq!(find(&results, "Dispatch order").status, CheckStatus::Pass);
        assert_eq!(find(&results, "Budget").message, "daily $5.00, monthly unlimited");
    }

    #[test]
    fn single_provider_warns_about_failover() {
        let mut config = TelsageConfig::default();
        config.providers.push(provider("solo", Some("k")));
        let result = check_dispatch_order(&config);
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("no failover"));
    }

    #[test]
    fn memory_baseline_reports() {
        let result = check_memory_baseline();
        assert!(result.status == CheckStatus::Pass || result.status == CheckStatus::Warn);
    }
}
