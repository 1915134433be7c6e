// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Telsage.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so misspelled keys fail at
//! startup with a suggestion instead of being silently ignored.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use telsage_core::{KeywordPriority, ProviderDescriptor, ProviderTier, QueryCategory};

/// Top-level Telsage configuration.
///
/// Every section is optional; an empty file yields a working classifier and
/// prompt composer but no providers to dispatch to.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelsageConfig {
    /// Assistant identity and concurrency.
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// LLM backends, in declaration order.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    /// Primary/backup ordering and retry behavior.
    #[serde(default)]
    pub orchestration: OrchestrationConfig,

    /// Category to provider-tier routing.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Local per-provider rate limiting.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Cost ceilings and budgets.
    #[serde(default)]
    pub cost: CostConfig,

    /// Query classifier tuning.
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl TelsageConfig {
    /// Look up a provider by its configured name.
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Provider names in dispatch order before tier routing is applied.
    ///
    /// With an explicit `orchestration.primary` this is the primary followed by
    /// the backups; otherwise every provider in declaration order.
    pub fn dispatch_order(&self) -> Vec<String> {
        match &self.orchestration.primary {
            Some(primary) => std::iter::once(primary.clone())
                .chain(self.orchestration.backups.iter().cloned())
                .collect(),
            None => self.providers.iter().map(|p| p.name.clone()).collect(),
        }
    }
}

/// Assistant identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssistantConfig {
    /// Display name, used in logs.
    #[serde(default = "default_assistant_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Maximum dispatches in flight during batch processing.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Queries longer than this many characters are rejected.
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,

    /// Replaces the built-in expert persona at the top of every prompt.
    #[serde(default)]
    pub base_context: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            log_level: default_log_level(),
            max_concurrency: default_max_concurrency(),
            max_query_chars: default_max_query_chars(),
            base_context: None,
        }
    }
}

fn default_assistant_name() -> String {
    "telsage".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_concurrency() -> usize {
    4
}

fn default_max_query_chars() -> usize {
    8000
}

/// Wire protocol spoken by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Messages API.
    Anthropic,
    /// OpenAI-compatible chat completions (OpenAI, Mistral, OpenRouter, ...).
    Openai,
}

impl ProviderKind {
    /// Public API endpoint used when `base_url` is not set.
    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::Openai => "https://api.openai.com/v1",
        }
    }

    /// Environment variable consulted when no key is configured.
    pub fn default_api_key_env(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Openai => "OPENAI_API_KEY",
        }
    }
}

/// One `[[providers]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Unique name referenced by `orchestration.primary`/`backups`.
    pub name: String,

    /// Wire protocol, which selects the client implementation.
    pub kind: ProviderKind,

    /// Cost and quality class used by tier routing. Defaults to `standard`.
    #[serde(default = "default_tier")]
    pub tier: ProviderTier,

    /// Model identifier sent with every request.
    pub model: String,

    /// Completion token limit per request.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// USD per token, used for budget estimates.
    #[serde(default)]
    pub cost_per_token: f64,

    /// Inline API key. Prefer `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Override of the API base URL (proxies, compatible vendors).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Static descriptor handed to the orchestrator.
    pub fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            name: self.name.clone(),
            tier: self.tier,
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            cost_per_token: self.cost_per_token,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    /// Resolve the API key: inline value first, then the configured (or the
    /// kind's default) environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(key.clone());
        }
        let var = self
            .api_key_env
            .as_deref()
            .unwrap_or_else(|| self.kind.default_api_key_env());
        std::env::var(var).ok().filter(|k| !k.trim().is_empty())
    }

    /// Configured base URL, or the kind's public endpoint.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }
}

fn default_tier() -> ProviderTier {
    ProviderTier::Standard
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    30
}

/// Provider ordering and retry behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestrationConfig {
    /// Provider tried first. When unset, providers are tried in declaration order.
    #[serde(default)]
    pub primary: Option<String>,

    /// Providers tried after the primary, in order.
    #[serde(default)]
    pub backups: Vec<String>,

    /// Retry a provider once, after its backoff, when it reports capacity exhaustion.
    #[serde(default = "default_true")]
    pub retry_capacity_once: bool,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            primary: None,
            backups: Vec::new(),
            retry_capacity_once: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Category to preferred provider tier routing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Move providers of the preferred tier to the front of the candidate list.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Category name to tier, e.g. `security = "premium"`.
    #[serde(default = "default_tiers")]
    pub tiers: BTreeMap<String, ProviderTier>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tiers: default_tiers(),
        }
    }
}

impl RoutingConfig {
    /// Parsed tier table. Entries with unknown category names are skipped;
    /// validation reports them.
    pub fn preferred_tiers(&self) -> BTreeMap<QueryCategory, ProviderTier> {
        self.tiers
            .iter()
            .filter_map(|(name, tier)| QueryCategory::from_str(name).ok().map(|c| (c, *tier)))
            .collect()
    }
}

fn default_tiers() -> BTreeMap<String, ProviderTier> {
    [
        (QueryCategory::General, ProviderTier::Economy),
        (QueryCategory::Feature, ProviderTier::Economy),
        (QueryCategory::Security, ProviderTier::Premium),
        (QueryCategory::Compliance, ProviderTier::Premium),
    ]
    .into_iter()
    .map(|(c, t)| (c.to_string(), t))
    .collect()
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// When false every query goes to a provider and nothing is stored.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of cached responses.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Time-to-live of a cached response, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

/// Local rate limiting applied before a provider is called.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Requests allowed per provider per rolling minute. Unlimited when unset.
    #[serde(default)]
    pub requests_per_minute: Option<u32>,

    /// First backoff after a capacity error, in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Backoff ceiling, in milliseconds.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: None,
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_backoff_max_ms() -> u64 {
    60_000
}

/// Cost ceilings and budgets. All limits are optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CostConfig {
    /// Skip a provider whose estimated cost for one request exceeds this.
    #[serde(default)]
    pub max_request_cost_usd: Option<f64>,

    /// Spend cap for the current UTC day. Resets at midnight.
    #[serde(default)]
    pub daily_budget_usd: Option<f64>,

    /// Spend cap for the current calendar month.
    #[serde(default)]
    pub monthly_budget_usd: Option<f64>,
}

/// Query classifier tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// A category is secondary when its score is at least this fraction of
    /// the primary category's score.
    #[serde(default = "default_secondary_threshold")]
    pub secondary_threshold: f64,

    /// Keywords appended to the built-in index.
    #[serde(default)]
    pub keywords: Vec<KeywordConfig>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            secondary_threshold: default_secondary_threshold(),
            keywords: Vec::new(),
        }
    }
}

fn default_secondary_threshold() -> f64 {
    0.5
}

/// One `[[classifier.keywords]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeywordConfig {
    /// Word or phrase, matched case-insensitively against the query's words.
    pub keyword: String,
    /// Category a match scores for.
    pub category: QueryCategory,
    /// Weight of a match. Defaults to `high`.
    #[serde(default = "default_keyword_priority")]
    pub priority: KeywordPriority,
}

fn default_keyword_priority() -> KeywordPriority {
    KeywordPriority::High
}
