// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `telsage classify` and `telsage prompt`: offline views of what the
//! assistant would do with a query. Neither touches a provider.

use telsage_config::model::TelsageConfig;
use telsage_context::PromptComposer;
use telsage_core::{QueryClassification, TelsageError};
use telsage_router::QueryClassifier;

pub fn classify(config: &TelsageConfig, query: &str) -> QueryClassification {
    QueryClassifier::from_config(&config.classifier).classify(query.trim())
}

/// Classification as pretty-printed JSON.
pub fn classify_json(config: &TelsageConfig, query: &str) -> Result<String, TelsageError> {
    serde_json::to_string_pretty(&classify(config, query))
        .map_err(|e| TelsageError::Internal(format!("failed to serialize classification: {e}")))
}

/// The full prompt that would be sent for `query`.
pub fn compose_prompt(config: &TelsageConfig, query: &str) -> String {
    let query = query.trim();
    let classification = classify(config, query);
    PromptComposer::from_config(&config.assistant).compose(query, &classification)
}
