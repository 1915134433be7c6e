// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate limiting and backoff for Telsage provider dispatch.

pub mod backoff;
pub mod limiter;

pub use backoff::BackoffPolicy;
pub use limiter::RateLimiter;
