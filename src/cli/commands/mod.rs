//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod ask;
mod config_cmd;
mod status;
mod triage;

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "policydesk")]
#[command(about = "Service-desk assistants for internal HR/IT policies")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    has_verbose_flag(std::env::args_os())
}

/// Arguments may be any OS string (e.g. a non-UTF-8 `--docs` path).
fn has_verbose_flag<I: IntoIterator<Item = OsString>>(args: I) -> bool {
    args.into_iter().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Classify service-desk requests (auto-resolve, ask for info, or open a ticket)
    Triage {
        /// Chat model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Answer policy questions from a directory of PDF documents
    Ask {
        /// Directory containing the policy PDFs (overrides config)
        #[arg(short, long)]
        docs: Option<PathBuf>,
        /// Number of passages retrieved per question
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Minimum similarity a passage must exceed to be used
        #[arg(short, long)]
        threshold: Option<f32>,
        /// Chat model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show model configuration and send a smoke-test prompt
    Status,

    /// Print the effective configuration as TOML
    Config,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
    };
    let (mut settings, config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Triage { model } => {
            if let Some(model) = model {
                settings.llm = settings.llm.with_model(&model);
            }
            triage::cmd_triage(&settings).await
        }
        Commands::Ask {
            docs,
            top_k,
            threshold,
            model,
        } => {
            if let Some(docs) = docs {
                settings.docs_dir = docs;
            }
            if let Some(top_k) = top_k {
                settings.retrieval.top_k = top_k;
            }
            if let Some(threshold) = threshold {
                settings.retrieval.score_threshold = threshold;
            }
            if let Some(model) = model {
                settings.llm = settings.llm.with_model(&model);
            }
            ask::cmd_ask(&settings).await
        }
        Commands::Status => status::cmd_status(&settings).await,
        Commands::Config => config_cmd::cmd_config_show(&settings, &config),
    }
}
