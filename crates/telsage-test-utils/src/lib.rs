// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Telsage integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Provider adapter with a scripted queue of outcomes
//! - [`RecordingObserver`] - Observability adapter that keeps every event
//! - [`TestHarness`] - Assistant wired to mock providers

pub mod harness;
pub mod mock_provider;
pub mod recording_observer;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_provider::MockProvider;
pub use recording_observer::RecordingObserver;
