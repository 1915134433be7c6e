// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Checks cross-references and value ranges that serde attributes cannot
//! express. All problems are collected; validation does not stop at the first.

use std::collections::HashSet;
use std::str::FromStr;

use telsage_core::QueryCategory;

use crate::diagnostic::{suggest_key, ConfigError};
use crate::model::TelsageConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
pub fn validate_config(config: &TelsageConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    validate_assistant(config, &mut errors);
    validate_providers(config, &mut errors);
    validate_orchestration(config, &mut errors);
    validate_routing(config, &mut errors);
    validate_limits(config, &mut errors);
    validate_classifier(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_assistant(config: &TelsageConfig, errors: &mut Vec<ConfigError>) {
    let assistant = &config.assistant;
    if !LOG_LEVELS.contains(&assistant.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "assistant.log_level `{}` is not one of {}",
            assistant.log_level,
            LOG_LEVELS.join(", ")
        )));
    }
    if assistant.max_concurrency == 0 {
        errors.push(ConfigError::validation(
            "assistant.max_concurrency must be at least 1",
        ));
    }
    if assistant.max_query_chars == 0 {
        errors.push(ConfigError::validation(
            "assistant.max_query_chars must be at least 1",
        ));
    }
}

fn validate_providers(config: &TelsageConfig, errors: &mut Vec<ConfigError>) {
    let mut seen = HashSet::new();
    for (i, provider) in config.providers.iter().enumerate() {
        if provider.name.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "providers[{i}].name must not be empty"
            )));
        } else if !seen.insert(provider.name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate provider name `{}` in [[providers]] array",
                provider.name
            )));
        }
        if provider.model.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "providers[{i}].model must not be empty"
            )));
        }
        if provider.max_tokens == 0 {
            errors.push(ConfigError::validation(format!(
                "providers[{i}].max_tokens must be at least 1"
            )));
        }
        if !provider.cost_per_token.is_finite() || provider.cost_per_token < 0.0 {
            errors.push(ConfigError::validation(format!(
                "providers[{i}].cost_per_token must be non-negative, got {}",
                provider.cost_per_token
            )));
        }
        if provider.timeout_secs == 0 {
            errors.push(ConfigError::validation(format!(
                "providers[{i}].timeout_secs must be at least 1"
            )));
        }
    }
}

fn validate_orchestration(config: &TelsageConfig, errors: &mut Vec<ConfigError>) {
    let names: Vec<&str> = config.providers.iter().map(|p| p.name.as_str()).collect();
    let orchestration = &config.orchestration;

    if let Some(primary) = &orchestration.primary {
        check_provider_ref("orchestration.primary", primary, &names, errors);
        if orchestration.backups.contains(primary) {
            errors.push(ConfigError::validation(format!(
                "orchestration.backups must not repeat the primary provider `{primary}`"
            )));
        }
    } else if !orchestration.backups.is_empty() {
        errors.push(ConfigError::validation(
            "orchestration.backups requires orchestration.primary to be set",
        ));
    }

    let mut seen = HashSet::new();
    for backup in &orchestration.backups {
        check_provider_ref("orchestration.backups", backup, &names, errors);
        if !seen.insert(backup.as_str()) {
            errors.push(ConfigError::validation(format!(
                "provider `{backup}` listed twice in orchestration.backups"
            )));
        }
    }
}

fn check_provider_ref(field: &str, name: &str, known: &[&str], errors: &mut Vec<ConfigError>) {
    if !known.contains(&name) {
        errors.push(ConfigError::UnknownReference {
            field: field.to_string(),
            kind: "provider",
            name: name.to_string(),
            suggestion: suggest_key(name, known),
            valid: known.join(", "),
        });
    }
}

fn validate_routing(config: &TelsageConfig, errors: &mut Vec<ConfigError>) {
    let categories: Vec<String> = QueryCategory::ALL.iter().map(|c| c.to_string()).collect();
    let category_refs: Vec<&str> = categories.iter().map(String::as_str).collect();
    for name in config.routing.tiers.keys() {
        if QueryCategory::from_str(name).is_err() {
            errors.push(ConfigError::UnknownReference {
                field: "routing.tiers".to_string(),
                kind: "category",
                name: name.clone(),
                suggestion: suggest_key(&name.to_lowercase(), &category_refs),
                valid: categories.join(", "),
            });
        }
    }
}

fn validate_limits(config: &TelsageConfig, errors: &mut Vec<ConfigError>) {
    let cache = &config.cache;
    if cache.enabled && cache.capacity == 0 {
        errors.push(ConfigError::validation(
            "cache.capacity must be at least 1 when the cache is enabled",
        ));
    }
    if cache.enabled && cache.ttl_secs == 0 {
        errors.push(ConfigError::validation(
            "cache.ttl_secs must be at least 1 when the cache is enabled",
        ));
    }

    let rate = &config.rate_limit;
    if rate.requests_per_minute == Some(0) {
        errors.push(ConfigError::validation(
            "rate_limit.requests_per_minute must be at least 1 (omit it for no limit)",
        ));
    }
    if rate.backoff_base_ms > rate.backoff_max_ms {
        errors.push(ConfigError::validation(format!(
            "rate_limit.backoff_base_ms ({}) must not exceed rate_limit.backoff_max_ms ({})",
            rate.backoff_base_ms, rate.backoff_max_ms
        )));
    }

    let cost = &config.cost;
    for (key, value) in [
        ("max_request_cost_usd", cost.max_request_cost_usd),
        ("daily_budget_usd", cost.daily_budget_usd),
        ("monthly_budget_usd", cost.monthly_budget_usd),
    ] {
        if let Some(v) = value
            && (!v.is_finite() || v < 0.0)
        {
            errors.push(ConfigError::validation(format!(
                "cost.{key} must be non-negative, got {v}"
            )));
        }
    }
}

fn validate_classifier(config: &TelsageConfig, errors: &mut Vec<ConfigError>) {
    let threshold = config.classifier.secondary_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        errors.push(ConfigError::validation(format!(
            "classifier.secondary_threshold must be in (0, 1], got {threshold}"
        )));
    }
    for (i, keyword) in config.classifier.keywords.iter().enumerate() {
        if !keyword.keyword.chars().any(char::is_alphanumeric) {
            errors.push(ConfigError::validation(format!(
                "classifier.keywords[{i}].keyword must contain a letter or digit"
            )));
        }
    }
}
