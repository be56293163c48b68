// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// RWAX command line.
//
// Entry point. Initialises logging, loads the pipeline config and dispatches
// to a subcommand. Results go to stdout as JSON, logs to stderr.

mod commands;
mod paths;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rwax_core::{CancelToken, classify_error, error::Result};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "rwax")]
#[command(version, about = "Scanned document to on-ledger identity credential", long_about = None)]
struct Cli {
    /// Pipeline config file (JSON). Defaults to the user config directory.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract, classify and validate a document
    Analyze {
        /// PDF, text file, or image (with the `ocr` feature)
        file: PathBuf,
    },

    /// Build the credential transaction for a holder without signing it
    Preview {
        file: PathBuf,

        /// Ledger account of the credential holder
        #[arg(long)]
        holder: String,
    },

    /// Decode the hex Data slot of a credential transaction
    Decode {
        data: String,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default config
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    match run(cli, &cancel).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                tracing::error!(error = %err, "could not render output");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            let classified = classify_error(&err);
            tracing::error!(kind = ?classified.kind, error = %err, "rwax failed");
            eprintln!("error: {err}\n{}", classified.guidance);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, cancel: &CancelToken) -> Result<Value> {
    let default_path = paths::default_config_path();
    let explicit = cli.config.as_deref();

    match cli.command {
        Command::Analyze { file } => commands::analyze(&file, cancel).await,
        Command::Preview { file, holder } => {
            let config = commands::load_config(explicit, &default_path)?;
            commands::preview(&file, &holder, config, cancel).await
        }
        Command::Decode { data } => {
            let config = commands::load_config(explicit, &default_path)?;
            commands::decode(&data, &config)
        }
        Command::Config { action } => match action {
            ConfigAction::Init { force } => {
                let path = explicit.unwrap_or(default_path.as_path());
                let written = commands::config_init(path, force)?;
                Ok(serde_json::json!({ "written": written }))
            }
            ConfigAction::Show => {
                let config = commands::load_config(explicit, &default_path)?;
                Ok(serde_json::to_value(config)?)
            }
        },
    }
}
