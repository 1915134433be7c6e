// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telsage - telecom knowledge assistant.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod ask;
mod doctor;
mod inspect;
mod providers;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use telsage_config::{ConfigError, TelsageConfig};
use telsage_core::TelsageError;
use tracing::error;

use crate::ask::AskOptions;

/// Telsage - telecom knowledge assistant.
#[derive(Parser, Debug)]
#[command(name = "telsage", version, about, long_about = None)]
struct Cli {
    /// Configuration file. Defaults to the standard lookup hierarchy.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a query and print the result as JSON.
    Classify { query: String },
    /// Print the prompt that would be sent for a query.
    Prompt { query: String },
    /// Answer one query.
    Ask {
        query: String,
        #[command(flatten)]
        options: AskArgs,
    },
    /// Answer every query in a file, one per line.
    Batch {
        file: PathBuf,
        #[command(flatten)]
        options: AskArgs,
        /// Print Prometheus metrics after the batch completes.
        #[arg(long)]
        metrics: bool,
    },
    /// Check configuration and provider credentials.
    Doctor,
}

#[derive(Args, Debug)]
struct AskArgs {
    /// Try this provider first.
    #[arg(long)]
    provider: Option<String>,
    /// Cap the completion length.
    #[arg(long)]
    max_tokens: Option<u32>,
    /// Neither read from nor write to the response cache.
    #[arg(long)]
    no_cache: bool,
    /// Emit JSON instead of text.
    #[arg(long)]
    json: bool,
}

impl From<AskArgs> for AskOptions {
    fn from(args: AskArgs) -> Self {
        AskOptions {
            provider: args.provider,
            max_tokens: args.max_tokens,
            no_cache: args.no_cache,
            json: args.json,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            telsage_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.assistant.log_level);

    let code = match run(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("telsage: {}", e.user_message());
            for attempt in e.attempts() {
                eprintln!("  {}: {}", attempt.provider, attempt.error);
            }
            1
        }
    };
    std::process::exit(code);
}

async fn run(command: Commands, config: &TelsageConfig) -> Result<i32, TelsageError> {
    match command {
        Commands::Classify { query } => {
            println!("{}", inspect::classify_json(config, &query)?);
            Ok(0)
        }
        Commands::Prompt { query } => {
            println!("{}", inspect::compose_prompt(config, &query));
            Ok(0)
        }
        Commands::Ask { query, options } => {
            ask::run_ask(config, &query, &options.into()).await?;
            Ok(0)
        }
        Commands::Batch {
            file,
            options,
            metrics,
        } => {
            let failures = ask::run_batch(config, &file, &options.into(), metrics).await?;
            Ok(if failures > 0 { 1 } else { 0 })
        }
        Commands::Doctor => {
            let failures = doctor::run_doctor(config).await;
            Ok(if failures > 0 { 1 } else { 0 })
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<TelsageConfig, Vec<ConfigError>> {
    match path {
        Some(path) => telsage_config::load_and_validate_path(path),
        None => telsage_config::load_and_validate(),
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("telsage={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn ask_flags_parse() {
        let cli = Cli::try_parse_from([
            "telsage",
            "--config",
            "/tmp/t.toml",
            "ask",
            "What is VoLTE?",
            "--provider",
            "claude",
            "--no-cache",
        ])
        .unwrap();

        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/t.toml")));
        let Commands::Ask { query, options } = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(query, "What is VoLTE?");
        let options = AskOptions::from(options);
        assert_eq!(options.provider.as_deref(), Some("claude"));
        assert!(options.no_cache);
        assert!(!options.json);
    }

    #[test]
    fn batch_accepts_metrics_flag() {
        let cli = Cli::try_parse_from(["telsage", "batch", "queries.txt", "--metrics", "--json"])
            .unwrap();
        let Commands::Batch { file, options, metrics } = cli.command else {
            panic!("expected batch");
        };
        assert_eq!(file, PathBuf::from("queries.txt"));
        assert!(metrics);
        assert!(options.json);
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["telsage"]).is_err());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let errors = load_config(Some(Path::new("/nonexistent/telsage.toml"))).unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
