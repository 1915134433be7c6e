// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider failover with budget, rate-limit and timeout enforcement.
//!
//! A dispatch walks an ordered candidate list (primary, then backups,
//! reordered by tier routing and a forced-provider preference). Each
//! candidate is checked against the budget and the rate limiter before it is
//! called under its own timeout. Retryable failures advance to the next
//! candidate; an auth failure ends the dispatch at once.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use telsage_config::model::{RateLimitConfig, TelsageConfig};
use telsage_core::{
    HealthStatus, Preferences, ProviderAdapter, ProviderAttempt,
    ProviderDescriptor, ProviderError, ProviderRequest, ProviderResponse, QueryClassification,
    TelsageError, TokenUsage,
};
use telsage_cost::{
    estimate_request_cost, estimate_tokens, usage_cost, BudgetSnapshot, BudgetTracker,
};
use telsage_resilience::RateLimiter;
use telsage_router::TierRouter;
use tracing::{debug, error, info, warn};

/// A configured provider paired with its client.
#[derive(Clone)]
pub struct ProviderSlot {
    descriptor: ProviderDescriptor,
    adapter: Arc<dyn ProviderAdapter>,
}

impl ProviderSlot {
    pub fn new(descriptor: ProviderDescriptor, adapter: Arc<dyn ProviderAdapter>) -> Self {
        Self {
            descriptor,
            adapter,
        }
    }

    pub fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    pub fn adapter(&self) -> &Arc<dyn ProviderAdapter> {
        &self.adapter
    }
}

impl AsRef<ProviderDescriptor> for ProviderSlot {
    fn as_ref(&self) -> &ProviderDescriptor {
        &self.descriptor
    }
}

impl std::fmt::Debug for ProviderSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSlot")
            .field("descriptor", &self.descriptor)
            .field("adapter", &self.adapter.name())
            .finish()
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone)]
pub struct DispatchSuccess {
    pub response: ProviderResponse,
    /// Name of the provider that answered.
    pub provider: String,
    /// Failed attempts made before the successful one.
    pub attempts: Vec<ProviderAttempt>,
    /// Reported usage, or an estimate when the provider reported none.
    pub usage: TokenUsage,
    pub cost_usd: f64,
}

/// Health of one configured provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderHealth {
    pub provider: String,
    pub status: HealthStatus,
}

/// Tries candidate providers in order until one answers.
pub struct ProviderOrchestrator {
    slots: Vec<ProviderSlot>,
    router: TierRouter,
    limiter: RateLimiter,
    budget: Mutex<BudgetTracker>,
    retry_capacity_once: bool,
}

impl ProviderOrchestrator {
    /// Orchestrator over `slots` in the given order, with tier routing off, no
    /// budget and the default rate-limit policy.
    ///
    /// Fails when `slots` is empty or names a provider twice.
    pub fn new(slots: Vec<ProviderSlot>) -> Result<Self, TelsageError> {
        if slots.is_empty() {
            return Err(TelsageError::Config(
                "no providers configured; add at least one [[providers]] entry".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for slot in &slots {
            if !seen.insert(slot.descriptor.name.as_str()) {
                return Err(TelsageError::Config(format!(
                    "provider `{}` is configured more than once",
                    slot.descriptor.name
                )));
            }
        }
        Ok(Self {
            slots,
            router: TierRouter::disabled(),
            limiter: RateLimiter::from_config(&RateLimitConfig::default()),
            budget: Mutex::new(BudgetTracker::unlimited()),
            retry_capacity_once: true,
        })
    }

    /// Build from configuration, pairing each provider in dispatch order with
    /// the adapter registered under its name.
    pub fn from_config(
        config: &TelsageConfig,
        adapters: &HashMap<String, Arc<dyn ProviderAdapter>>,
    ) -> Result<Self, TelsageError> {
        let mut slots = Vec::new();
        for name in config.dispatch_order() {
            let provider = config.provider(&name).ok_or_else(|| {
                TelsageError::Config(format!("orchestration refers to unknown provider `{name}`"))
            })?;
            let adapter = adapters.get(&name).ok_or_else(|| {
                TelsageError::Config(format!("no client registered for provider `{name}`"))
            })?;
            slots.push(ProviderSlot::new(provider.descriptor(), Arc::clone(adapter)));
        }

        let orchestrator = Self::new(slots)?
            .with_router(TierRouter::from_config(&config.routing))
            .with_rate_limiter(RateLimiter::from_config(&config.rate_limit))
            .with_budget(BudgetTracker::new(&config.cost))
            .with_capacity_retry(config.orchestration.retry_capacity_once);

        info!(
            providers = orchestrator.slots.len(),
            order = %orchestrator.provider_names().join(" -> "),
            "provider orchestrator ready"
        );
        Ok(orchestrator)
    }

    pub fn with_router(mut self, router: TierRouter) -> Self {
        self.router = router;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_budget(mut self, budget: BudgetTracker) -> Self {
        self.budget = Mutex::new(budget);
        self
    }

    /// Whether a capacity failure is retried once on the same provider after
    /// its backoff delay.
    pub fn with_capacity_retry(mut self, enabled: bool) -> Self {
        self.retry_capacity_once = enabled;
        self
    }

    /// Provider names in configured order.
    pub fn provider_names(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|s| s.descriptor.name.clone())
            .collect()
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.slots.iter().any(|s| s.descriptor.name == name)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.slots.iter().map(|s| &s.descriptor)
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn budget_snapshot(&self) -> BudgetSnapshot {
        self.lock_budget().snapshot()
    }

    fn lock_budget(&self) -> MutexGuard<'_, BudgetTracker> {
        self.budget
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Dispatch `prompt` to the first candidate that answers.
    ///
    /// Fails with [`TelsageError::Fatal`] on an auth failure, or with
    /// [`ProviderError::AllProvidersExhausted`] once every candidate failed
    /// retryably.
    pub async fn dispatch(
        &self,
        prompt: &str,
        classification: &QueryClassification,
        prefs: &Preferences,
    ) -> Result<DispatchSuccess, TelsageError> {
        let candidates = self.router.order(
            &self.slots,
            classification.primary_type(),
            prefs.provider.as_deref(),
        );
        let mut attempts = Vec::new();

        for slot in candidates {
            let descriptor = &slot.descriptor;
            let max_tokens = prefs
                .max_tokens
                .filter(|m| *m > 0)
                .map_or(descriptor.max_tokens, |m| m.min(descriptor.max_tokens));

            let estimate = estimate_request_cost(descriptor, prompt, max_tokens);
            let budget_check = self.lock_budget().check(estimate);
            if let Err(err) = budget_check {
                debug!(provider = %descriptor.name, estimate, "skipping provider: {err}");
                attempts.push(attempt(descriptor, err));
                continue;
            }

            match self.call_with_retry(slot, prompt, max_tokens, &mut attempts).await {
                Ok(response) => {
                    let usage = response.usage.unwrap_or_else(|| TokenUsage {
                        input_tokens: estimate_tokens(prompt),
                        output_tokens: estimate_tokens(&response.content),
                    });
                    let cost_usd = match response.usage {
                        Some(reported) => usage_cost(descriptor, &reported),
                        None => estimate,
                    };
                    self.lock_budget().record_cost(cost_usd);
                    self.limiter.record_success(&descriptor.name);

                    debug!(
                        provider = %descriptor.name,
                        failed_attempts = attempts.len(),
                        input_tokens = usage.input_tokens,
                        output_tokens = usage.output_tokens,
                        cost_usd,
                        "dispatch succeeded"
                    );
                    return Ok(DispatchSuccess {
                        response,
                        provider: descriptor.name.clone(),
                        attempts,
                        usage,
                        cost_usd,
                    });
                }
                Err(err @ ProviderError::Auth { .. }) => {
                    error!(
                        provider = %descriptor.name,
                        error = %err,
                        "provider rejected credentials or configuration, aborting dispatch"
                    );
                    attempts.push(attempt(descriptor, err.clone()));
                    return Err(TelsageError::Fatal {
                        provider: descriptor.name.clone(),
                        source: err,
                        attempts,
                    });
                }
                Err(err) => {
                    warn!(
                        provider = %descriptor.name,
                        kind = err.kind(),
                        error = %err,
                        "provider failed, trying next candidate"
                    );
                    attempts.push(attempt(descriptor, err));
                }
            }
        }

        warn!(attempts = attempts.len(), "all providers exhausted");
        Err(TelsageError::Dispatch(ProviderError::AllProvidersExhausted {
            attempts,
        }))
    }

    /// Call one provider, retrying once after a capacity failure when enabled.
    /// A capacity failure that is retried is recorded in `attempts`.
    async fn call_with_retry(
        &self,
        slot: &ProviderSlot,
        prompt: &str,
        max_tokens: u32,
        attempts: &mut Vec<ProviderAttempt>,
    ) -> Result<ProviderResponse, ProviderError> {
        let name = &slot.descriptor.name;
        let mut retried = false;
        loop {
            self.limiter.try_acquire(name)?;
            match self.call(slot, prompt, max_tokens).await {
                Err(err @ ProviderError::Capacity { .. }) => {
                    let delay = self.limiter.record_capacity(name);
                    if !self.retry_capacity_once || retried {
                        return Err(err);
                    }
                    retried = true;
                    info!(
                        provider = %name,
                        delay_ms = delay.as_millis() as u64,
                        "provider at capacity, retrying once after backoff"
                    );
                    attempts.push(attempt(&slot.descriptor, err));
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn call(
        &self,
        slot: &ProviderSlot,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<ProviderResponse, ProviderError> {
        let descriptor = &slot.descriptor;
        let request = ProviderRequest {
            prompt: prompt.to_string(),
            model: descriptor.model.clone(),
            max_tokens,
        };
        match tokio::time::timeout(descriptor.timeout, slot.adapter.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::timeout(descriptor.timeout)),
        }
    }

    /// Health-check every provider. Errors are reported as unhealthy.
    pub async fn health(&self) -> Vec<ProviderHealth> {
        let mut report = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let status = match slot.adapter.health_check().await {
                Ok(status) => status,
                Err(e) => HealthStatus::Unhealthy(e.to_string()),
            };
            report.push(ProviderHealth {
                provider: slot.descriptor.name.clone(),
                status,
            });
        }
        report
    }

    /// Shut down every provider client.
    pub async fn shutdown(&self) {
        for slot in &self.slots {
            if let Err(e) = slot.adapter.shutdown().await {
                warn!(provider = %slot.descriptor.name, error = %e, "provider shutdown failed");
            }
        }
    }
}

fn attempt(descriptor: &ProviderDescriptor, error: ProviderError) -> ProviderAttempt {
    ProviderAttempt {
        provider: descriptor.name.clone(),
        error,
    }
}
