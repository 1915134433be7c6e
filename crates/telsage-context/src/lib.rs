// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt composition for Telsage.
//!
//! [`PromptComposer`] turns a query and its classification into the prompt
//! sent to a provider, using the per-category guidance in [`blocks`].

pub mod blocks;
pub mod composer;

pub use blocks::{block_for, CategoryBlock, BASE_CONTEXT, GENERIC_GUIDANCE};
pub use composer::PromptComposer;
