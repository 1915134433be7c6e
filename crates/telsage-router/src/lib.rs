// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query classification and provider routing for Telsage.
//!
//! - [`KeywordIndex`]: telecom keywords mapped to weighted categories
//! - [`QueryClassifier`]: deterministic keyword scoring into a [`QueryClassification`]
//! - [`TierRouter`]: category-driven reordering of dispatch candidates
//!
//! [`QueryClassification`]: telsage_core::QueryClassification

pub mod classifier;
pub mod keywords;
pub mod router;

pub use classifier::{QueryClassifier, DEFAULT_SECONDARY_THRESHOLD};
pub use keywords::{tokenize, KeywordEntry, KeywordIndex};
pub use router::TierRouter;
