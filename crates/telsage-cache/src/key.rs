// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache key fingerprinting.

use std::fmt;

use sha2::{Digest, Sha256};
use telsage_core::QueryClassification;

/// Hex SHA-256 fingerprint of a normalized query and its classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Fingerprint `query` as classified, optionally scoped to a forced provider
    /// and a completion length override.
    ///
    /// Normalization lowercases and collapses whitespace, so `"What is  AMF?"`
    /// and `"what is amf?"` share a key.
    pub fn fingerprint(
        query: &str,
        classification: &QueryClassification,
        forced_provider: Option<&str>,
        max_tokens: Option<u32>,
    ) -> Self {
        let normalized = normalize(query);
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        hasher.update([0x1f]);
        hasher.update(classification.primary_type().to_string().as_bytes());
        if let Some(provider) = forced_provider {
            hasher.update([0x1f]);
            hasher.update(provider.as_bytes());
        }
        if let Some(max_tokens) = max_tokens {
            hasher.update([0x1e]);
            hasher.update(max_tokens.to_be_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use telsage_core::QueryCategory;

    use super::*;

    fn classified(primary: QueryCategory) -> QueryClassification {
        QueryClassification::new(primary, Vec::new(), 1.0, BTreeSet::new(), Vec::new())
    }

    #[test]
    fn normalized_queries_share_a_key() {
        let c = classified(QueryCategory::Architecture);
        let a = CacheKey::fingerprint("What is the  AMF?", &c, None, None);
        let b = CacheKey::fingerprint("  what is the amf? ", &c, None, None);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn classification_and_provider_change_the_key() {
        let arch = classified(QueryCategory::Architecture);
        let proc = classified(QueryCategory::Procedure);
        let base = CacheKey::fingerprint("amf", &arch, None, None);
        assert_ne!(base, CacheKey::fingerprint("amf", &proc, None, None));
        assert_ne!(base, CacheKey::fingerprint("amf", &arch, Some("openai"), None));
    }

    #[test]
    fn max_tokens_override_changes_the_key() {
        let arch = classified(QueryCategory::Architecture);
        let base = CacheKey::fingerprint("amf", &arch, None, None);
        let short = CacheKey::fingerprint("amf", &arch, None, Some(5));
        assert_ne!(base, short);
        assert_ne!(short, CacheKey::fingerprint("amf", &arch, None, Some(500)));
        assert_eq!(short, CacheKey::fingerprint("AMF", &arch, None, Some(5)));
    }
}
