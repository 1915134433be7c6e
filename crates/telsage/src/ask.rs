// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `telsage ask` and `telsage batch`: answer queries through the configured
//! providers.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use telsage_agent::{install_signal_handler, Assistant, AssistantResponse, TracingObserver};
use telsage_config::model::TelsageConfig;
use telsage_core::{ObservabilityAdapter, Preferences, TelsageError};
use tracing::{info, warn};

use crate::providers::build_providers;

/// Options shared by `ask` and `batch`.
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    pub provider: Option<String>,
    pub max_tokens: Option<u32>,
    pub no_cache: bool,
    pub json: bool,
}

impl AskOptions {
    pub fn preferences(&self) -> Preferences {
        Preferences {
            provider: self.provider.clone(),
            max_tokens: self.max_tokens,
            bypass_cache: self.no_cache,
        }
    }
}

/// Build the assistant with a tracing observer plus any `extra` observers.
pub fn build_assistant(
    config: &TelsageConfig,
    extra: Vec<Arc<dyn ObservabilityAdapter>>,
) -> Result<Assistant, TelsageError> {
    let providers = build_providers(config)?;
    let mut observers: Vec<Arc<dyn ObservabilityAdapter>> = vec![Arc::new(TracingObserver)];
    observers.extend(extra);
    Assistant::from_config(config, &providers, observers)
}

/// Answer a single query and print the response.
pub async fn run_ask(
    config: &TelsageConfig,
    query: &str,
    options: &AskOptions,
) -> Result<(), TelsageError> {
    let assistant = build_assistant(config, Vec::new())?;
    let result = assistant.process(query, &options.preferences()).await;
    assistant.shutdown().await;

    let response = result?;
    if options.json {
        println!("{}", to_json(&response)?);
    } else {
        println!("{}", response.text);
        eprintln!("{}", summary_line(&response));
    }
    Ok(())
}

/// One line of batch output.
#[derive(Debug, Serialize)]
pub struct BatchLine<'a> {
    pub index: usize,
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<&'a AssistantResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Answer every query in `file` and print one result per query.
///
/// Returns the number of failed queries. Interrupted by SIGINT/SIGTERM.
pub async fn run_batch(
    config: &TelsageConfig,
    file: &Path,
    options: &AskOptions,
    metrics: bool,
) -> Result<usize, TelsageError> {
    let queries = read_queries(file)?;
    if queries.is_empty() {
        warn!(file = %file.display(), "batch file contains no queries");
        return Ok(0);
    }

    let mut extra: Vec<Arc<dyn ObservabilityAdapter>> = Vec::new();
    #[cfg(feature = "prometheus")]
    let prometheus = if metrics {
        let adapter = Arc::new(telsage_prometheus::PrometheusAdapter::new()?);
        extra.push(adapter.clone());
        Some(adapter)
    } else {
        None
    };
    #[cfg(not(feature = "prometheus"))]
    {
        if metrics {
            warn!("--metrics requested but this build has no prometheus support");
        }
    }

    let assistant = build_assistant(config, extra)?;
    let cancel = install_signal_handler();
    let prefs = options.preferences();

    let results = tokio::select! {
        results = assistant.process_batch(&queries, &prefs) => results,
        () = cancel.cancelled() => {
            assistant.shutdown().await;
            return Err(TelsageError::Internal("batch interrupted by signal".to_string()));
        }
    };

    let mut failures = 0;
    for (index, (query, result)) in queries.iter().zip(&results).enumerate() {
        let line = BatchLine {
            index,
            query,
            response: result.as_ref().ok(),
            error: result.as_ref().err().map(TelsageError::user_message),
        };
        if line.error.is_some() {
            failures += 1;
        }
        if options.json {
            println!("{}", to_json(&line)?);
        } else {
            print_plain(&line);
        }
    }

    if let Some(stats) = assistant.cache_stats() {
        info!(hits = stats.hits, misses = stats.misses, "cache statistics");
    }
    assistant.shutdown().await;

    #[cfg(feature = "prometheus")]
    {
        if let Some(prometheus) = prometheus {
            print!("{}", prometheus.render());
        }
    }

    Ok(failures)
}

/// Read one query per line, skipping blank lines and `#` comments.
pub fn read_queries(file: &Path) -> Result<Vec<String>, TelsageError> {
    let content = std::fs::read_to_string(file).map_err(|e| {
        TelsageError::Config(format!("cannot read batch file `{}`: {e}", file.display()))
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn print_plain(line: &BatchLine<'_>) {
    match (line.response, &line.error) {
        (Some(response), _) => {
            println!("[{}] {}", line.index, line.query);
            println!("{}", response.text);
            println!("  ({})", summary_line(response));
        }
        (None, Some(error)) => {
            println!("[{}] {}", line.index, line.query);
            println!("  error: {error}");
        }
        (None, None) => {}
    }
    println!();
}

fn summary_line(response: &AssistantResponse) -> String {
    let source = match (&response.provider, response.cache_hit) {
        (_, true) => "cache".to_string(),
        (Some(provider), false) => provider.clone(),
        (None, false) => "unknown".to_string(),
    };
    format!(
        "{} via {source}, {} tokens, ${:.5}, {}ms",
        response.classification.primary_type(),
        response.usage.total(),
        response.cost_usd,
        response.latency.as_millis()
    )
}

fn to_json<T: Serialize>(value: &T) -> Result<String, TelsageError> {
    serde_json::to_string(value)
        .map_err(|e| TelsageError::Internal(format!("failed to serialize output: {e}")))
}
