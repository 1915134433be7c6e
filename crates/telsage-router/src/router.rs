// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate ordering by provider tier.
//!
//! Precedence: forced provider > preferred tier for the query category >
//! configured primary/backup order.

use std::collections::BTreeMap;

use telsage_config::model::RoutingConfig;
use telsage_core::{ProviderDescriptor, ProviderTier, QueryCategory};
use tracing::debug;

/// Reorders dispatch candidates for a query category.
#[derive(Debug, Clone, Default)]
pub struct TierRouter {
    enabled: bool,
    tiers: BTreeMap<QueryCategory, ProviderTier>,
}

impl TierRouter {
    pub fn new(tiers: BTreeMap<QueryCategory, ProviderTier>) -> Self {
        Self {
            enabled: true,
            tiers,
        }
    }

    /// A router that keeps the configured order (forced providers still move first).
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self {
            enabled: config.enabled,
            tiers: config.preferred_tiers(),
        }
    }

    /// Tier preferred for `category`, if routing is enabled and one is mapped.
    pub fn preferred_tier(&self, category: QueryCategory) -> Option<ProviderTier> {
        if !self.enabled {
            return None;
        }
        self.tiers.get(&category).copied()
    }

    /// Order `candidates` for one dispatch.
    ///
    /// Providers of the preferred tier move to the front, keeping their relative
    /// order; then a forced provider, if present, moves to the very front. An
    /// unknown forced name is ignored.
    pub fn order<'a, T: AsRef<ProviderDescriptor>>(
        &self,
        candidates: &'a [T],
        category: QueryCategory,
        forced: Option<&str>,
    ) -> Vec<&'a T> {
        let mut ordered: Vec<&T> = candidates.iter().collect();

        if let Some(tier) = self.preferred_tier(category) {
            // Stable: false sorts before true.
            ordered.sort_by_key(|c| descriptor(*c).tier != tier);
        }

        if let Some(name) = forced
            && let Some(pos) = ordered.iter().position(|c| descriptor(*c).name == name)
        {
            let chosen = ordered.remove(pos);
            ordered.insert(0, chosen);
        }

        debug!(
            category = %category,
            order = ?ordered.iter().map(|c| descriptor(*c).name.as_str()).collect::<Vec<_>>(),
            "candidate order"
        );
        ordered
    }
}

fn descriptor<T: AsRef<ProviderDescriptor>>(candidate: &T) -> &ProviderDescriptor {
    candidate.as_ref()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn provider(name: &str, tier: ProviderTier) -> ProviderDescriptor {
        ProviderDescriptor {
            name: name.to_string(),
            tier,
            model: format!("{name}-model"),
            max_tokens: 256,
            cost_per_token: 0.0,
            timeout: Duration::from_secs(30),
        }
    }

    fn names(ordered: &[&ProviderDescriptor]) -> Vec<String> {
        ordered.iter().map(|d| d.name.clone()).collect()
    }

    fn fleet() -> Vec<ProviderDescriptor> {
        vec![
            provider("openai", ProviderTier::Standard),
            provider("mistral", ProviderTier::Economy),
            provider("claude", ProviderTier::Premium),
            provider("gemini", ProviderTier::Economy),
        ]
    }

    #[test]
    fn preferred_tier_moves_to_front_stably() {
        let router = TierRouter::from_config(&RoutingConfig::default());
        let fleet = fleet();
        let ordered = router.order(&fleet, QueryCategory::General, None);
        assert_eq!(names(&ordered), vec!["mistral", "gemini", "openai", "claude"]);

        let ordered = router.order(&fleet, QueryCategory::Security, None);
        assert_eq!(names(&ordered), vec!["claude", "openai", "mistral", "gemini"]);
    }

    #[test]
    fn unmapped_category_keeps_configured_order() {
        let router = TierRouter::from_config(&RoutingConfig::default());
        let fleet = fleet();
        let ordered = router.order(&fleet, QueryCategory::Procedure, None);
        assert_eq!(names(&ordered), vec!["openai", "mistral", "claude", "gemini"]);
    }

    #[test]
    fn forced_provider_goes_first() {
        let router = TierRouter::from_config(&RoutingConfig::default());
        let fleet = fleet();
        let ordered = router.order(&fleet, QueryCategory::Security, Some("gemini"));
        assert_eq!(names(&ordered), vec!["gemini", "claude", "openai", "mistral"]);

        let ordered = router.order(&fleet, QueryCategory::Security, Some("nope"));
        assert_eq!(ordered[0].name, "claude");
    }

    #[test]
    fn disabled_router_ignores_tiers() {
        let router = TierRouter::disabled();
        let fleet = fleet();
        assert_eq!(router.preferred_tier(QueryCategory::Security), None);
        let ordered = router.order(&fleet, QueryCategory::General, None);
        assert_eq!(names(&ordered), vec!["openai", "mistral", "claude", "gemini"]);
    }
}
