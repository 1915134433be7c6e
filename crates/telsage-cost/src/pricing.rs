// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token and cost estimation.
//!
//! Prompt tokens are estimated at four characters per token. Cost uses the
//! provider's single `cost_per_token` rate for prompt and completion alike.

use telsage_core::{ProviderDescriptor, TokenUsage};

/// Characters per token for estimation.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimated token count of `text`, rounded up.
pub fn estimate_tokens(text: &str) -> u32 {
    let tokens = text.chars().count().div_ceil(CHARS_PER_TOKEN);
    u32::try_from(tokens).unwrap_or(u32::MAX)
}

/// Worst-case cost of sending `prompt` with a completion of `max_tokens`.
pub fn estimate_request_cost(provider: &ProviderDescriptor, prompt: &str, max_tokens: u32) -> f64 {
    let tokens = f64::from(estimate_tokens(prompt)) + f64::from(max_tokens);
    tokens * provider.cost_per_token
}

/// Cost of a completed call from reported usage.
pub fn usage_cost(provider: &ProviderDescriptor, usage: &TokenUsage) -> f64 {
    f64::from(usage.total()) * provider.cost_per_token
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use telsage_core::ProviderTier;

    use super::*;

    fn provider(cost_per_token: f64) -> ProviderDescriptor {
        ProviderDescriptor {
            name: "p".into(),
            tier: ProviderTier::Standard,
            model: "m".into(),
            max_tokens: 1000,
            cost_per_token,
            timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn tokens_round_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        // Characters, not bytes.
        assert_eq!(estimate_tokens("ééééé"), 2);
    }

    #[test]
    fn request_cost_includes_completion_budget() {
        let p = provider(0.001);
        let prompt = "x".repeat(400);
        let cost = estimate_request_cost(&p, &prompt, 900);
        assert!((cost - 1.0).abs() < 1e-9, "got {cost}");
    }

    #[test]
    fn usage_cost_uses_both_directions() {
        let p = provider(0.01);
        let usage = TokenUsage {
            input_tokens: 30,
            output_tokens: 70,
        };
        assert!((usage_cost(&p, &usage) - 1.0).abs() < 1e-9);
    }
}
