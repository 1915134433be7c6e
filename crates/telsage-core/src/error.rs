// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Telsage.
//!
//! [`ProviderError`] is the closed taxonomy that provider clients return and the
//! orchestrator pattern-matches on to decide between advancing to the next
//! candidate and aborting the dispatch. [`TelsageError`] is the crate-level error
//! surfaced to callers of the assistant.

use std::time::Duration;

use serde::Serialize;
use strum::Display;
use thiserror::Error;

/// Sub-kind of a [`ProviderError::Transient`] failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransientKind {
    /// The call did not complete within the provider's timeout.
    Timeout,
    /// Connection, DNS or TLS failure.
    Network,
    /// The provider answered with a body that could not be decoded.
    Malformed,
    /// The provider reported an internal error (5xx, overloaded).
    Server,
}

/// One provider attempted during a dispatch and the error it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderAttempt {
    /// Configured provider name.
    pub provider: String,
    /// The error that made the orchestrator move on.
    pub error: ProviderError,
}

/// Provider failure taxonomy.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ProviderError {
    /// Rate-limit or quota exhaustion. Retryable.
    #[error("capacity exceeded: {message}")]
    Capacity { message: String },

    /// Credentials rejected or the provider is misconfigured. Fatal.
    #[error("authentication or configuration rejected: {message}")]
    Auth { message: String },

    /// Timeout, network failure, malformed response, server error. Retryable.
    #[error("transient {kind} error: {message}")]
    Transient { kind: TransientKind, message: String },

    /// Estimated cost exceeds the configured ceiling. Retryable (skip provider).
    #[error("budget exceeded: {message}")]
    BudgetExceeded { message: String },

    /// Every candidate provider failed with a retryable error.
    #[error("all providers exhausted: {}", format_attempts(attempts))]
    AllProvidersExhausted { attempts: Vec<ProviderAttempt> },
}

impl ProviderError {
    pub fn capacity(message: impl Into<String>) -> Self {
        Self::Capacity {
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn transient(kind: TransientKind, message: impl Into<String>) -> Self {
        Self::Transient {
            kind,
            message: message.into(),
        }
    }

    pub fn budget(message: impl Into<String>) -> Self {
        Self::BudgetExceeded {
            message: message.into(),
        }
    }

    /// A call cancelled after `after` elapsed.
    pub fn timeout(after: Duration) -> Self {
        Self::transient(
            TransientKind::Timeout,
            format!("no response within {}ms", after.as_millis()),
        )
    }

    /// Whether the orchestrator may advance to the next candidate.
    ///
    /// `AllProvidersExhausted` counts as retryable from the caller's point of view:
    /// trying again later may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Auth { .. })
    }

    /// Short stable label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Capacity { .. } => "capacity",
            Self::Auth { .. } => "auth",
            Self::Transient { .. } => "transient",
            Self::BudgetExceeded { .. } => "budget_exceeded",
            Self::AllProvidersExhausted { .. } => "all_providers_exhausted",
        }
    }

    /// Map an HTTP status returned by a provider API to the taxonomy.
    ///
    /// Only meaningful for non-success statuses.
    pub fn from_http_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let message = format!("HTTP {status}: {detail}");
        match status {
            401 | 403 | 404 => Self::auth(message),
            402 | 429 => Self::capacity(message),
            408 | 500..=599 => Self::transient(TransientKind::Server, message),
            // Other 4xx: the request itself was rejected. Another provider with a
            // different model may still accept it.
            _ => Self::transient(TransientKind::Malformed, message),
        }
    }
}

fn format_attempts(attempts: &[ProviderAttempt]) -> String {
    if attempts.is_empty() {
        return "no candidate providers".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{} ({})", a.provider, a.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// The primary error type surfaced by the assistant and its components.
#[derive(Debug, Error)]
pub enum TelsageError {
    /// Configuration errors (invalid TOML, unknown provider references, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The query was rejected before classification (empty, too long).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A provider returned a non-retryable error; the dispatch was aborted.
    #[error("provider `{provider}` failed with a non-retryable error: {source}")]
    Fatal {
        provider: String,
        source: ProviderError,
        /// Attempts made before the fatal one (the fatal attempt is included last).
        attempts: Vec<ProviderAttempt>,
    },

    /// A dispatch failure from the retryable part of the taxonomy.
    #[error(transparent)]
    Dispatch(#[from] ProviderError),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TelsageError {
    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Dispatch(e) => e.is_retryable(),
            Self::Fatal { .. } | Self::Config(_) | Self::InvalidQuery(_) | Self::Internal(_) => {
                false
            }
        }
    }

    /// Provider attempts recorded for this failure, if any.
    pub fn attempts(&self) -> &[ProviderAttempt] {
        match self {
            Self::Fatal { attempts, .. } => attempts,
            Self::Dispatch(ProviderError::AllProvidersExhausted { attempts }) => attempts,
            _ => &[],
        }
    }

    /// Message suitable for an end user.
    ///
    /// Retryable exhaustion and fatal misconfiguration produce distinct messages so
    /// operators can tell them apart.
    pub fn user_message(&self) -> String {
        match self {
            Self::Dispatch(_) => {
                "All language model providers are busy or unavailable right now. \
                 Please try again later."
                    .to_string()
            }
            Self::Fatal { provider, .. } => format!(
                "The assistant cannot reach its language model: provider `{provider}` \
                 rejected its credentials or configuration. This will not resolve by \
                 retrying; please contact the operator."
            ),
            Self::Config(_) => {
                "The assistant is misconfigured. Please contact the operator.".to_string()
            }
            Self::InvalidQuery(reason) => {
                format!("Your question could not be processed: {reason}.")
            }
            Self::Internal(_) => "An internal error occurred. Please try again.".to_string(),
        }
    }
}
