// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain keyword index used by the query classifier.
//!
//! A keyword is a phrase of one or more tokens. It may feed several categories
//! ("flow" is both a procedure and a QoS term), each with its own weight.

use telsage_core::{KeywordPriority, QueryCategory};

use QueryCategory::*;

type KeywordRow = (
    QueryCategory,
    &'static [&'static str],
    &'static [&'static str],
    &'static [&'static str],
);

/// Built-in table: category, then high, medium and low priority keywords.
const DEFAULT_KEYWORDS: &[KeywordRow] = &[
    (
        Procedure,
        &[
            "procedure", "process", "flow", "step", "sequence", "operation",
            "registration", "handover", "attach", "paging",
        ],
        &["how to", "when", "trigger", "initiate", "handle"],
        &["do", "perform", "execute"],
    ),
    (
        Architecture,
        &["architecture", "structure", "framework", "design", "topology"],
        &["component", "element", "node", "entity", "function"],
        &["system", "network", "setup"],
    ),
    (
        Protocol,
        &["protocol", "signaling", "message", "packet", "format"],
        &["header", "payload", "encoding", "decoding", "stack"],
        &["communicate", "exchange", "transfer"],
    ),
    (
        Interface,
        &["interface", "reference point", "connection", "link"],
        &["between", "connects to", "interconnection"],
        &["connect", "communicate"],
    ),
    (
        Security,
        &["security", "authentication", "encryption", "integrity", "privacy"],
        &["protect", "secure", "cipher", "key", "credential"],
        &["safe", "guard", "threat"],
    ),
    (
        Performance,
        &["performance", "throughput", "latency", "bandwidth", "capacity"],
        &["speed", "efficiency", "optimization", "metric"],
        &["fast", "slow", "measure"],
    ),
    (
        Qos,
        &["qos", "quality of service", "priority", "class", "bearer"],
        &["traffic", "flow", "guarantee", "requirement"],
        &["quality", "service"],
    ),
    (
        Reliability,
        &["reliability", "availability", "redundancy", "resilience"],
        &["failover", "backup", "recovery", "robust"],
        &["stable", "reliable", "maintain"],
    ),
    (
        Deployment,
        &["deployment", "installation", "configuration", "setup"],
        &["implement", "roll out", "provision", "integrate"],
        &["deploy", "install", "configure"],
    ),
    (
        Interworking,
        &["interworking", "interoperability", "compatibility", "integration"],
        &["interact", "work together", "coordinate"],
        &["between", "with"],
    ),
    (
        Migration,
        &["migration", "upgrade", "transition", "evolution"],
        &["move to", "change", "transform"],
        &["new", "old", "legacy"],
    ),
    (
        Troubleshooting,
        &["troubleshoot", "debug", "diagnose", "problem", "issue"],
        &["error", "fault", "failure", "fix"],
        &["wrong", "fail", "break"],
    ),
    (
        Compliance,
        &["compliance", "standard", "regulation", "requirement"],
        &["conform", "adhere", "follow", "meet"],
        &["rule", "guideline", "specification"],
    ),
    (
        Feature,
        &["feature", "capability", "functionality", "service"],
        &["support", "provide", "enable", "offer"],
        &["can", "able", "function"],
    ),
];

/// Lowercase `text` and split it on every non-alphanumeric character.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// A query token matches a keyword token when equal, or equal plus a plural suffix.
fn token_matches(query_token: &str, keyword_token: &str) -> bool {
    query_token
        .strip_prefix(keyword_token)
        .is_some_and(|rest| rest.is_empty() || rest == "s" || rest == "es")
}

/// One keyword phrase and the categories it contributes to.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordEntry {
    phrase: String,
    tokens: Vec<String>,
    targets: Vec<(QueryCategory, KeywordPriority)>,
}

impl KeywordEntry {
    /// Normalized phrase, tokens joined by single spaces.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn targets(&self) -> &[(QueryCategory, KeywordPriority)] {
        &self.targets
    }

    /// Whether the phrase occurs contiguously in `query_tokens`.
    pub fn matches(&self, query_tokens: &[String]) -> bool {
        let n = self.tokens.len();
        n > 0
            && query_tokens.windows(n).any(|window| {
                window
                    .iter()
                    .zip(&self.tokens)
                    .all(|(q, k)| token_matches(q, k))
            })
    }
}

/// Mapping from keyword phrase to weighted categories.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    entries: Vec<KeywordEntry>,
}

impl KeywordIndex {
    /// An index with no keywords. Every query classifies as `General`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in telecom keyword table.
    pub fn builtin() -> Self {
        let mut index = Self::empty();
        for (category, high, medium, low) in DEFAULT_KEYWORDS {
            for (words, priority) in [
                (*high, KeywordPriority::High),
                (*medium, KeywordPriority::Medium),
                (*low, KeywordPriority::Low),
            ] {
                for word in words {
                    index.insert(word, *category, priority);
                }
            }
        }
        index
    }

    /// Add a keyword. Re-adding an existing (phrase, category) pair replaces its
    /// priority. Keywords without any alphanumeric token are ignored.
    pub fn insert(&mut self, keyword: &str, category: QueryCategory, priority: KeywordPriority) {
        let tokens = tokenize(keyword);
        if tokens.is_empty() {
            return;
        }
        let phrase = tokens.join(" ");
        match self.entries.iter_mut().find(|e| e.phrase == phrase) {
            Some(entry) => match entry.targets.iter_mut().find(|(c, _)| *c == category) {
                Some(target) => target.1 = priority,
                None => entry.targets.push((category, priority)),
            },
            None => self.entries.push(KeywordEntry {
                phrase,
                tokens,
                targets: vec![(category, priority)],
            }),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_keyword(
        mut self,
        keyword: &str,
        category: QueryCategory,
        priority: KeywordPriority,
    ) -> Self {
        self.insert(keyword, category, priority);
        self
    }

    pub fn entries(&self) -> &[KeywordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_punctuation() {
        assert_eq!(
            tokenize("5G-NR: N2/N3 interfaces?"),
            vec!["5g", "nr", "n2", "n3", "interfaces"]
        );
        assert!(tokenize("  ?!  ").is_empty());
    }

    #[test]
    fn plural_suffix_matches_but_prefix_does_not() {
        assert!(token_matches("procedures", "procedure"));
        assert!(token_matches("classes", "class"));
        assert!(token_matches("do", "do"));
        assert!(!token_matches("document", "do"));
        assert!(!token_matches("key", "keys"));
    }

    #[test]
    fn phrases_match_contiguously() {
        let index = KeywordIndex::empty().with_keyword(
            "Quality of Service",
            Qos,
            KeywordPriority::High,
        );
        let entry = &index.entries()[0];
        assert_eq!(entry.phrase(), "quality of service");
        assert!(entry.matches(&tokenize("what is quality of service?")));
        assert!(!entry.matches(&tokenize("quality and class of service")));
    }

    #[test]
    fn shared_keywords_feed_several_categories() {
        let index = KeywordIndex::builtin();
        let flow = index
            .entries()
            .iter()
            .find(|e| e.phrase() == "flow")
            .unwrap();
        assert_eq!(
            flow.targets(),
            &[(Procedure, KeywordPriority::High), (Qos, KeywordPriority::Medium)]
        );
    }

    #[test]
    fn reinserting_replaces_priority() {
        let mut index = KeywordIndex::builtin();
        let before = index.len();
        index.insert("handover", Procedure, KeywordPriority::Low);
        assert_eq!(index.len(), before);
        let entry = index
            .entries()
            .iter()
            .find(|e| e.phrase() == "handover")
            .unwrap();
        assert_eq!(entry.targets(), &[(Procedure, KeywordPriority::Low)]);
    }

    #[test]
    fn blank_keywords_are_ignored() {
        let index = KeywordIndex::empty().with_keyword(" - ", Security, KeywordPriority::High);
        assert!(index.is_empty());
    }
}
