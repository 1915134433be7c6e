// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider client construction from `[[providers]]` entries.

use std::collections::HashMap;
use std::sync::Arc;

use telsage_config::model::{ProviderConfig, ProviderKind, TelsageConfig};
use telsage_core::{ProviderAdapter, TelsageError};

/// Build one client per configured provider, keyed by provider name.
pub fn build_providers(
    config: &TelsageConfig,
) -> Result<HashMap<String, Arc<dyn ProviderAdapter>>, TelsageError> {
    let mut providers = HashMap::with_capacity(config.providers.len());
    for provider in &config.providers {
        providers.insert(provider.name.clone(), build_provider(provider)?);
    }
    Ok(providers)
}

fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn ProviderAdapter>, TelsageError> {
    match config.kind {
        #[cfg(feature = "anthropic")]
        ProviderKind::Anthropic => Ok(Arc::new(
            telsage_anthropic::AnthropicProvider::from_config(config)?,
        )),
        #[cfg(feature = "openai")]
        ProviderKind::Openai => Ok(Arc::new(telsage_openai::OpenAiProvider::from_config(
            config,
        )?)),
        #[allow(unreachable_patterns)]
        kind => Err(TelsageError::Config(format!(
            "provider `{}` has kind {kind:?}, which this build does not include",
            config.name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use telsage_core::ProviderTier;

    use super::*;

    fn entry(name: &str, kind: ProviderKind) -> ProviderConfig {
        ProviderConfig {
            name: name.into(),
            kind,
            tier: ProviderTier::Standard,
            model: "m".into(),
            max_tokens: 64,
            cost_per_token: 0.0,
            api_key: Some("k".into()),
            api_key_env: None,
            base_url: Some("http://127.0.0.1:9".into()),
            timeout_secs: 5,
        }
    }

    #[test]
    #[cfg(all(feature = "anthropic", feature = "openai"))]
    fn builds_one_client_per_entry() {
        let mut config = TelsageConfig::default();
        config.providers.push(entry("claude", ProviderKind::Anthropic));
        config.providers.push(entry("mistral", ProviderKind::Openai));

        let providers = build_providers(&config).unwrap();

        assert_eq!(providers.len(), 2);
        assert_eq!(providers["claude"].name(), "claude");
        assert_eq!(providers["mistral"].name(), "mistral");
    }

    #[test]
    fn no_entries_yields_empty_map() {
        assert!(build_providers(&TelsageConfig::default()).unwrap().is_empty());
    }
}
