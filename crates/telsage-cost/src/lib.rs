// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cost estimation and budget enforcement for Telsage.
//!
//! - **Pricing**: prompt token estimation and per-request cost estimates
//! - **Budget tracker**: per-request ceiling with daily/monthly caps and 80% warnings

pub mod budget;
pub mod pricing;

pub use budget::{BudgetSnapshot, BudgetTracker};
pub use pricing::{estimate_request_cost, estimate_tokens, usage_cost, CHARS_PER_TOKEN};
