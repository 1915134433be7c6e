// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request cost ceiling plus daily and monthly spending caps.
//!
//! Totals are in memory only and reset when the UTC day or month rolls over.
//! A `tracing::warn` is emitted once per period when spending passes 80% of a
//! cap.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use telsage_config::model::CostConfig;
use telsage_core::ProviderError;
use tracing::warn;

const WARN_FRACTION: f64 = 0.8;

/// Point-in-time view of spending, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetSnapshot {
    pub daily_total_usd: f64,
    pub monthly_total_usd: f64,
    pub daily_cap_usd: Option<f64>,
    pub monthly_cap_usd: Option<f64>,
}

/// In-memory budget tracker.
#[derive(Debug, Clone)]
pub struct BudgetTracker {
    daily_total_usd: f64,
    monthly_total_usd: f64,
    request_ceiling: Option<f64>,
    daily_cap: Option<f64>,
    monthly_cap: Option<f64>,
    current_day: NaiveDate,
    /// (year, month) of the running monthly total.
    current_month: (i32, u32),
    daily_warned: bool,
    monthly_warned: bool,
}

impl BudgetTracker {
    pub fn new(config: &CostConfig) -> Self {
        Self::starting_at(config, Utc::now())
    }

    /// A tracker with no ceiling and no caps.
    pub fn unlimited() -> Self {
        Self::new(&CostConfig::default())
    }

    fn starting_at(config: &CostConfig, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        Self {
            daily_total_usd: 0.0,
            monthly_total_usd: 0.0,
            request_ceiling: config.max_request_cost_usd,
            daily_cap: config.daily_budget_usd,
            monthly_cap: config.monthly_budget_usd,
            current_day: today,
            current_month: (today.year(), today.month()),
            daily_warned: false,
            monthly_warned: false,
        }
    }

    /// Check whether a request estimated at `estimate_usd` may be sent.
    pub fn check(&mut self, estimate_usd: f64) -> Result<(), ProviderError> {
        self.check_at(estimate_usd, Utc::now())
    }

    fn check_at(&mut self, estimate_usd: f64, now: DateTime<Utc>) -> Result<(), ProviderError> {
        self.roll_over(now.date_naive());

        if let Some(ceiling) = self.request_ceiling
            && estimate_usd > ceiling
        {
            return Err(ProviderError::budget(format!(
                "estimated request cost ${estimate_usd:.4} exceeds the per-request ceiling of ${ceiling:.4}"
            )));
        }

        if let Some(cap) = self.daily_cap {
            if self.daily_total_usd >= cap {
                return Err(ProviderError::budget(format!(
                    "daily budget of ${cap:.2} reached; resumes at midnight UTC"
                )));
            }
            if !self.daily_warned && self.daily_total_usd >= cap * WARN_FRACTION {
                self.daily_warned = true;
                warn!(
                    daily_total = self.daily_total_usd,
                    daily_cap = cap,
                    "approaching daily budget cap (80%+)"
                );
            }
        }

        if let Some(cap) = self.monthly_cap {
            if self.monthly_total_usd >= cap {
                return Err(ProviderError::budget(format!(
                    "monthly budget of ${cap:.2} reached; resumes next month"
                )));
            }
            if !self.monthly_warned && self.monthly_total_usd >= cap * WARN_FRACTION {
                self.monthly_warned = true;
                warn!(
                    monthly_total = self.monthly_total_usd,
                    monthly_cap = cap,
                    "approaching monthly budget cap (80%+)"
                );
            }
        }

        Ok(())
    }

    /// Add a completed call's cost to the running totals.
    pub fn record_cost(&mut self, cost_usd: f64) {
        self.record_cost_at(cost_usd, Utc::now());
    }

    fn record_cost_at(&mut self, cost_usd: f64, now: DateTime<Utc>) {
        self.roll_over(now.date_naive());
        let cost = if cost_usd.is_finite() { cost_usd.max(0.0) } else { 0.0 };
        self.daily_total_usd += cost;
        self.monthly_total_usd += cost;
    }

    fn roll_over(&mut self, today: NaiveDate) {
        if today != self.current_day {
            self.daily_total_usd = 0.0;
            self.daily_warned = false;
            self.current_day = today;
        }
        let month = (today.year(), today.month());
        if month != self.current_month {
            self.monthly_total_usd = 0.0;
            self.monthly_warned = false;
            self.current_month = month;
        }
    }

    pub fn daily_total(&self) -> f64 {
        self.daily_total_usd
    }

    pub fn monthly_total(&self) -> f64 {
        self.monthly_total_usd
    }

    pub fn snapshot(&self) -> BudgetSnapshot {
        BudgetSnapshot {
            daily_total_usd: self.daily_total_usd,
            monthly_total_usd: self.monthly_total_usd,
            daily_cap_usd: self.daily_cap,
            monthly_cap_usd: self.monthly_cap,
        }
    }
}
