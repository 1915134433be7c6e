// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order (later overrides earlier):
//! 1. Compiled defaults
//! 2. `/etc/telsage/telsage.toml`
//! 3. `~/.config/telsage/telsage.toml`
//! 4. `./telsage.toml`
//! 5. `TELSAGE_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use tracing::debug;

use crate::model::TelsageConfig;

pub const SYSTEM_CONFIG_PATH: &str = "/etc/telsage/telsage.toml";
pub const LOCAL_CONFIG_PATH: &str = "telsage.toml";

/// Top-level sections reachable through `TELSAGE_<SECTION>_<KEY>`.
///
/// `rate_limit` must be matched as a whole, so longer names come first.
const ENV_SECTIONS: &[&str] = &[
    "orchestration",
    "rate_limit",
    "classifier",
    "assistant",
    "routing",
    "cache",
    "cost",
];

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<TelsageConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<TelsageConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TelsageConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TelsageConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TelsageConfig::default()))
        .merge(toml_layer(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TelsageConfig::default()))
        .merge(toml_layer(Path::new(SYSTEM_CONFIG_PATH)))
        .merge(toml_layer(&user_config_path().unwrap_or_default()))
        .merge(toml_layer(Path::new(LOCAL_CONFIG_PATH)))
        .merge(env_provider())
}

/// `~/.config/telsage/telsage.toml` on XDG systems.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("telsage/telsage.toml"))
}

/// A TOML file layer. Missing files contribute nothing.
fn toml_layer(path: &Path) -> figment::providers::Data<Toml> {
    if path.is_file() {
        debug!(path = %path.display(), "merging config layer");
    } else {
        debug!(path = %path.display(), "config layer not present");
    }
    Toml::file(path)
}

/// Env provider mapping `TELSAGE_CACHE_TTL_SECS` to `cache.ttl_secs`.
///
/// Only the section prefix is split, so keys containing underscores stay intact.
fn env_provider() -> Env {
    Env::prefixed("TELSAGE_").map(|key| env_key_to_path(key.as_str()).into())
}

pub(crate) fn env_key_to_path(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_'))
            && !rest.is_empty()
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
