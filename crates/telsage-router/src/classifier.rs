// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-weighted query classification.
//!
//! Pure and deterministic: no model call, no I/O. Scores are accumulated in
//! tenths of a point so ties and threshold comparisons are exact.

use std::collections::BTreeSet;

use telsage_config::model::ClassifierConfig;
use telsage_core::{CategoryScore, QueryCategory, QueryClassification};
use tracing::debug;

use crate::keywords::{tokenize, KeywordIndex};

/// Default fraction of the primary score a category needs to count as secondary.
pub const DEFAULT_SECONDARY_THRESHOLD: f64 = 0.5;

/// Confidence denominators never drop below one full point.
const MIN_CONFIDENCE_DENOMINATOR_TENTHS: u32 = 10;

/// Classifies free-text telecom queries into [`QueryCategory`] values.
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    index: KeywordIndex,
    secondary_threshold: f64,
}

impl QueryClassifier {
    /// Classifier over the built-in keyword table with the default threshold.
    pub fn new() -> Self {
        Self::with_index(KeywordIndex::builtin())
    }

    pub fn with_index(index: KeywordIndex) -> Self {
        Self {
            index,
            secondary_threshold: DEFAULT_SECONDARY_THRESHOLD,
        }
    }

    /// Override the secondary threshold. Values outside (0, 1] fall back to the default.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.secondary_threshold = if threshold > 0.0 && threshold <= 1.0 {
            threshold
        } else {
            DEFAULT_SECONDARY_THRESHOLD
        };
        self
    }

    /// Built-in table extended with `[[classifier.keywords]]`.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        let mut index = KeywordIndex::builtin();
        for kw in &config.keywords {
            index.insert(&kw.keyword, kw.category, kw.priority);
        }
        Self::with_index(index).with_threshold(config.secondary_threshold)
    }

    pub fn index(&self) -> &KeywordIndex {
        &self.index
    }

    pub fn secondary_threshold(&self) -> f64 {
        self.secondary_threshold
    }

    /// Classify `text`. Never fails; text without any keyword is `General`.
    pub fn classify(&self, text: &str) -> QueryClassification {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return QueryClassification::general();
        }

        let mut tenths = [0u32; QueryCategory::ALL.len()];
        let mut matched = BTreeSet::new();
        for entry in self.index.entries() {
            if !entry.matches(&tokens) {
                continue;
            }
            matched.insert(entry.phrase().to_string());
            for (category, priority) in entry.targets() {
                tenths[category.priority()] += priority.weight_tenths();
            }
        }

        let mut ranked: Vec<(QueryCategory, u32)> = QueryCategory::ALL
            .iter()
            .map(|c| (*c, tenths[c.priority()]))
            .filter(|(_, score)| *score > 0)
            .collect();
        // Stable sort: equal scores keep declaration (priority) order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let Some(&(primary, primary_score)) = ranked.first() else {
            return QueryClassification::general();
        };
        let runner_up = ranked.get(1).map_or(0, |(_, s)| *s);

        let cutoff = self.secondary_threshold * f64::from(primary_score);
        let secondaries: Vec<QueryCategory> = ranked
            .iter()
            .skip(1)
            .filter(|(_, s)| f64::from(*s) >= cutoff)
            .map(|(c, _)| *c)
            .collect();

        let denominator = (primary_score + runner_up).max(MIN_CONFIDENCE_DENOMINATOR_TENTHS);
        let confidence = f64::from(primary_score) / f64::from(denominator);

        let scores = ranked
            .iter()
            .map(|(category, s)| CategoryScore {
                category: *category,
                score: f64::from(*s) / 10.0,
            })
            .collect();

        debug!(
            primary = %primary,
            confidence,
            secondaries = secondaries.len(),
            keywords = matched.len(),
            "query classified"
        );

        QueryClassification::new(primary, secondaries, confidence, matched, scores)
    }
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new()
    }
}
