// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local per-provider rate limiter.
//!
//! Two gates per provider: a capacity backoff window opened by provider
//! capacity errors, and an optional rolling one-minute request allowance.
//! Requests that would violate either are refused before the provider is called.

use std::collections::VecDeque;
use std::time::Duration;

use dashmap::DashMap;
use telsage_config::model::RateLimitConfig;
use telsage_core::ProviderError;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::backoff::BackoffPolicy;

const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct ProviderState {
    /// Start times of requests inside the rolling window.
    recent: VecDeque<Instant>,
    consecutive_capacity: u32,
    backoff_until: Option<Instant>,
}

impl ProviderState {
    fn prune(&mut self, now: Instant) {
        while self
            .recent
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= WINDOW)
        {
            self.recent.pop_front();
        }
    }
}

/// Per-provider request window and capacity backoff.
#[derive(Debug)]
pub struct RateLimiter {
    policy: BackoffPolicy,
    requests_per_minute: Option<u32>,
    providers: DashMap<String, ProviderState>,
}

impl RateLimiter {
    pub fn new(policy: BackoffPolicy, requests_per_minute: Option<u32>) -> Self {
        Self {
            policy,
            requests_per_minute,
            providers: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(BackoffPolicy::from_config(config), config.requests_per_minute)
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Reserve one request slot for `provider`, or explain why it must be skipped.
    pub fn try_acquire(&self, provider: &str) -> Result<(), ProviderError> {
        let now = Instant::now();
        let mut state = self.providers.entry(provider.to_string()).or_default();

        if let Some(until) = state.backoff_until.filter(|t| *t > now) {
            let remaining = until - now;
            return Err(ProviderError::capacity(format!(
                "backing off for another {}ms after capacity errors",
                remaining.as_millis()
            )));
        }

        state.prune(now);
        if let Some(limit) = self.requests_per_minute
            && state.recent.len() >= limit as usize
        {
            return Err(ProviderError::capacity(format!(
                "local allowance of {limit} requests per minute used"
            )));
        }

        state.recent.push_back(now);
        Ok(())
    }

    /// Record a capacity error and open (or extend) the backoff window.
    ///
    /// Returns the backoff applied.
    pub fn record_capacity(&self, provider: &str) -> Duration {
        let now = Instant::now();
        let mut state = self.providers.entry(provider.to_string()).or_default();
        state.consecutive_capacity = state.consecutive_capacity.saturating_add(1);
        let delay = self.policy.delay(state.consecutive_capacity);
        state.backoff_until = Some(now + delay);
        warn!(
            provider,
            consecutive = state.consecutive_capacity,
            backoff_ms = delay.as_millis() as u64,
            "provider at capacity, backing off"
        );
        delay
    }

    /// Clear the backoff state after a successful call.
    pub fn record_success(&self, provider: &str) {
        if let Some(mut state) = self.providers.get_mut(provider)
            && state.consecutive_capacity > 0
        {
            debug!(provider, "provider recovered, clearing backoff");
            state.consecutive_capacity = 0;
            state.backoff_until = None;
        }
    }

    /// Time left in `provider`'s backoff window, if any.
    pub fn backoff_remaining(&self, provider: &str) -> Option<Duration> {
        let now = Instant::now();
        self.providers
            .get(provider)
            .and_then(|s| s.backoff_until)
            .filter(|t| *t > now)
            .map(|t| t - now)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(rpm: Option<u32>) -> RateLimiter {
        RateLimiter::new(
            BackoffPolicy::new(Duration::from_millis(500), Duration::from_secs(4)),
            rpm,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn capacity_backoff_blocks_then_expires() {
        let limiter = limiter(None);
        assert_eq!(limiter.record_capacity("openai"), Duration::from_millis(500));
        let err = limiter.try_acquire("openai").unwrap_err();
        assert_eq!(err.kind(), "capacity");
        assert!(limiter.try_acquire("mistral").is_ok(), "state is per provider");

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(limiter.try_acquire("openai").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_capacity_errors_grow_backoff() {
        let limiter = limiter(None);
        let delays: Vec<Duration> = (0..5).map(|_| limiter.record_capacity("p")).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(4),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn success_clears_backoff() {
        let limiter = limiter(None);
        limiter.record_capacity("p");
        limiter.record_capacity("p");
        assert!(limiter.backoff_remaining("p").is_some());
        limiter.record_success("p");
        assert_eq!(limiter.backoff_remaining("p"), None);
        assert_eq!(limiter.record_capacity("p"), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn per_minute_allowance_rolls() {
        let limiter = limiter(Some(2));
        assert!(limiter.try_acquire("p").is_ok());
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(limiter.try_acquire("p").is_ok());
        assert!(limiter.try_acquire("p").is_err());

        tokio::time::advance(Duration::from_secs(30)).await;
        // The first request left the window.
        assert!(limiter.try_acquire("p").is_ok());
        assert!(limiter.try_acquire("p").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn refused_requests_do_not_consume_allowance() {
        let limiter = limiter(Some(1));
        limiter.record_capacity("p");
        assert!(limiter.try_acquire("p").is_err());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(limiter.try_acquire("p").is_ok());
    }
}
