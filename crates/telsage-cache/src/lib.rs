// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response cache for Telsage: a capacity-bounded LRU with per-entry TTL,
//! keyed by a SHA-256 fingerprint of the normalized query and its classification.

pub mod cache;
pub mod key;

pub use cache::{CacheStats, ResponseCache};
pub use key::CacheKey;
