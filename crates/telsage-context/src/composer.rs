// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt composition from a query and its classification.

use telsage_config::model::AssistantConfig;
use telsage_core::{QueryCategory, QueryClassification};
use tracing::debug;

use crate::blocks::{block_for, BASE_CONTEXT, GENERIC_GUIDANCE};

/// Guidance lines taken from each secondary category's block.
const SECONDARY_GUIDANCE_LINES: usize = 3;

/// Builds the final prompt text sent to a provider.
///
/// Layout: persona, primary focus block, secondary considerations,
/// confidence, response guidelines, then the literal user query last.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    base_context: String,
}

impl PromptComposer {
    pub fn new() -> Self {
        Self {
            base_context: BASE_CONTEXT.to_string(),
        }
    }

    /// Replace the built-in persona.
    pub fn with_base_context(base_context: impl Into<String>) -> Self {
        Self {
            base_context: base_context.into(),
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        match config.base_context.as_deref().map(str::trim) {
            Some(custom) if !custom.is_empty() => Self::with_base_context(custom),
            _ => Self::new(),
        }
    }

    pub fn base_context(&self) -> &str {
        &self.base_context
    }

    pub fn compose(&self, query: &str, classification: &QueryClassification) -> String {
        let primary = classification.primary_type();
        let secondaries = classification.secondary_types();

        let mut prompt = String::with_capacity(self.base_context.len() + query.len() + 1024);
        prompt.push_str(&self.base_context);
        prompt.push_str("\n\n");

        prompt.push_str(&format!("Primary Focus - {primary}:\n"));
        match block_for(primary) {
            Some(block) => {
                prompt.push_str(block.heading);
                prompt.push('\n');
                for line in block.guidance {
                    prompt.push_str(&format!("- {line}\n"));
                }
            }
            None => {
                prompt.push_str(GENERIC_GUIDANCE);
                prompt.push('\n');
            }
        }

        let considered: Vec<(QueryCategory, &[&str])> = secondaries
            .iter()
            .filter_map(|c| block_for(*c).map(|b| (*c, b.guidance)))
            .collect();
        if !considered.is_empty() {
            prompt.push_str("\nAlso consider:\n");
            for (category, guidance) in considered {
                prompt.push_str(&format!("- {category}:\n"));
                for line in guidance.iter().take(SECONDARY_GUIDANCE_LINES) {
                    prompt.push_str(&format!("  - {line}\n"));
                }
            }
        }

        prompt.push_str(&format!(
            "\nQuery Classification Confidence: {:.2}\n",
            classification.confidence_score()
        ));

        let interdependencies = if secondaries.is_empty() {
            "other aspects".to_string()
        } else {
            secondaries
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        prompt.push_str("\nResponse Guidelines:\n");
        prompt.push_str("1. Start with a clear overview\n");
        prompt.push_str(&format!("2. Focus on {primary}-related aspects\n"));
        prompt.push_str("3. Include relevant 3GPP specification references\n");
        prompt.push_str("4. Provide practical examples where applicable\n");
        prompt.push_str(&format!("5. Consider interdependencies with {interdependencies}\n"));
        prompt.push_str("6. Conclude with key takeaways and considerations\n");

        prompt.push_str(&format!("\nUser Query: {query}"));

        debug!(
            primary = %primary,
            secondaries = secondaries.len(),
            prompt_chars = prompt.len(),
            "prompt composed"
        );
        prompt
    }
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new()
    }
}
