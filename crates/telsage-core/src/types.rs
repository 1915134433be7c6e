// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the classifier, the orchestrator, and the adapters.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::TelsageError;

/// Telecom subject of a query.
///
/// Declaration order is the fixed priority order used to break score ties:
/// earlier variants win.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    Procedure,
    Architecture,
    Protocol,
    Interface,
    Security,
    Performance,
    Qos,
    Reliability,
    Deployment,
    Interworking,
    Migration,
    Troubleshooting,
    Compliance,
    Feature,
    General,
}

impl QueryCategory {
    /// All categories in tie-break priority order.
    pub const ALL: [QueryCategory; 15] = [
        QueryCategory::Procedure,
        QueryCategory::Architecture,
        QueryCategory::Protocol,
        QueryCategory::Interface,
        QueryCategory::Security,
        QueryCategory::Performance,
        QueryCategory::Qos,
        QueryCategory::Reliability,
        QueryCategory::Deployment,
        QueryCategory::Interworking,
        QueryCategory::Migration,
        QueryCategory::Troubleshooting,
        QueryCategory::Compliance,
        QueryCategory::Feature,
        QueryCategory::General,
    ];

    /// Position in the tie-break order (0 is highest priority).
    pub fn priority(self) -> usize {
        self as usize
    }
}

/// Accumulated keyword score of one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryScore {
    pub category: QueryCategory,
    pub score: f64,
}

/// Result of classifying a query.
///
/// Constructed only through [`QueryClassification::new`] or
/// [`QueryClassification::general`], which uphold the invariants: exactly one
/// primary category, secondaries never contain it, confidence within [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryClassification {
    primary_type: QueryCategory,
    secondary_types: Vec<QueryCategory>,
    confidence_score: f64,
    keywords_matched: BTreeSet<String>,
    scores: Vec<CategoryScore>,
}

impl QueryClassification {
    pub fn new(
        primary_type: QueryCategory,
        secondary_types: Vec<QueryCategory>,
        confidence_score: f64,
        keywords_matched: BTreeSet<String>,
        scores: Vec<CategoryScore>,
    ) -> Self {
        let mut seen = BTreeSet::new();
        let secondary_types = secondary_types
            .into_iter()
            .filter(|c| *c != primary_type && seen.insert(*c))
            .collect();
        let confidence_score = if confidence_score.is_finite() {
            confidence_score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            primary_type,
            secondary_types,
            confidence_score,
            keywords_matched,
            scores,
        }
    }

    /// The no-signal classification: `General`, zero confidence, nothing matched.
    pub fn general() -> Self {
        Self::new(
            QueryCategory::General,
            Vec::new(),
            0.0,
            BTreeSet::new(),
            Vec::new(),
        )
    }

    pub fn primary_type(&self) -> QueryCategory {
        self.primary_type
    }

    /// Secondary categories, by descending score then priority.
    pub fn secondary_types(&self) -> &[QueryCategory] {
        &self.secondary_types
    }

    pub fn confidence_score(&self) -> f64 {
        self.confidence_score
    }

    pub fn keywords_matched(&self) -> &BTreeSet<String> {
        &self.keywords_matched
    }

    /// Every category with a positive score, by descending score then priority.
    pub fn scores(&self) -> &[CategoryScore] {
        &self.scores
    }
}

/// Weight class of a classifier keyword.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum KeywordPriority {
    High,
    Medium,
    Low,
}

impl KeywordPriority {
    /// Score contribution in tenths (1.0, 0.6, 0.3).
    ///
    /// Kept integral so accumulated scores compare exactly.
    pub fn weight_tenths(self) -> u32 {
        match self {
            KeywordPriority::High => 10,
            KeywordPriority::Medium => 6,
            KeywordPriority::Low => 3,
        }
    }
}

/// Cost and capability grouping of providers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTier {
    /// Cheapest models, for general and feature questions.
    Economy,
    Standard,
    /// Highest-capability models, for security and compliance work.
    Premium,
}

/// Static description of one configured provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDescriptor {
    pub name: String,
    pub tier: ProviderTier,
    pub model: String,
    pub max_tokens: u32,
    /// USD per token, applied to both prompt and completion tokens.
    pub cost_per_token: f64,
    /// Upper bound for a single `send` call.
    pub timeout: Duration,
}

impl AsRef<ProviderDescriptor> for ProviderDescriptor {
    fn as_ref(&self) -> &ProviderDescriptor {
        self
    }
}

/// A request to an LLM provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub prompt: String,
    pub model: String,
    pub max_tokens: u32,
}

/// Token counts reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// A response from an LLM provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub content: String,
    pub model: String,
    /// `None` when the provider does not report usage.
    pub usage: Option<TokenUsage>,
}

/// Optional per-call preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    /// Try this provider first, regardless of tier routing.
    pub provider: Option<String>,
    /// Cap the completion length below the provider's configured maximum.
    pub max_tokens: Option<u32>,
    /// Skip the response cache for both lookup and store.
    pub bypass_cache: bool,
}

impl Preferences {
    /// Parse preferences from a loose string map.
    ///
    /// Recognized keys: `provider`, `max_tokens`, `cache` (`"off"`/`"false"`
    /// disables caching). Unknown keys are rejected.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, TelsageError> {
        let mut prefs = Preferences::default();
        for (key, value) in map {
            match key.as_str() {
                "provider" => prefs.provider = Some(value.clone()),
                "max_tokens" => {
                    let parsed = value.parse::<u32>().map_err(|e| {
                        TelsageError::InvalidQuery(format!("max_tokens `{value}`: {e}"))
                    })?;
                    prefs.max_tokens = Some(parsed);
                }
                "cache" => {
                    prefs.bypass_cache = matches!(value.as_str(), "off" | "false" | "no");
                }
                other => {
                    return Err(TelsageError::InvalidQuery(format!(
                        "unknown preference `{other}`"
                    )));
                }
            }
        }
        Ok(prefs)
    }
}

/// How a processed query ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    CacheHit,
    Success,
    Exhausted,
    Fatal,
    Rejected,
}

/// Telemetry event emitted once per processed query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryTelemetry {
    pub category: QueryCategory,
    pub confidence: f64,
    pub latency: Duration,
    pub usage: TokenUsage,
    pub estimated_cost_usd: f64,
    pub outcome: DispatchOutcome,
    /// Provider that produced the response, if any.
    pub provider: Option<String>,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Observability,
}
