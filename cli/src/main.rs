// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Scriptorium CLI
//!
//! The `scriptorium` binary fronts the text generation gateway.
//!
//! ## Commands
//!
//! - `scriptorium models list|show|health` - Inspect configured models
//! - `scriptorium generate <model> <prompt>` - One-shot generation
//! - `scriptorium scan` - Discover local backends
//! - `scriptorium serve` - Run the models HTTP API
//! - `scriptorium config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use scriptorium::commands::{self, ConfigCommand, GenerateArgs, ModelsCommand, ServeArgs};
use scriptorium::logging::{self, LogFormat};
use scriptorium_core::domain::gateway_config::GatewayConfigManifest;

/// Scriptorium - one API over many text generation backends
#[derive(Parser)]
#[command(name = "scriptorium")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SCRIPTORIUM_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect configured models
    #[command(name = "models")]
    Models {
        #[command(subcommand)]
        command: ModelsCommand,
    },

    /// Generate text with a configured model
    #[command(name = "generate")]
    Generate(GenerateArgs),

    /// Discover local backends (ollama, llama.cpp, text-generation-webui)
    #[command(name = "scan")]
    Scan {
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Run the models HTTP API until Ctrl+C / SIGTERM
    #[command(name = "serve")]
    Serve(ServeArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config logging settings only fill in what the flags leave unset
    let configured = GatewayConfigManifest::load_or_default(cli.config.clone())
        .map(|config| config.spec.observability.logging)
        .unwrap_or_default();
    let level = cli.log_level.clone().unwrap_or(configured.level);
    let format = cli
        .log_format
        .unwrap_or_else(|| LogFormat::from_config(&configured.format));

    logging::init_logging(&level, format).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Models { command } => commands::models::handle_command(command, cli.config).await,
        Commands::Generate(args) => commands::generate::execute(args, cli.config).await,
        Commands::Scan { json } => commands::scan::execute(cli.config, json).await,
        Commands::Serve(args) => commands::serve::execute(args, cli.config).await,
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
    }
}
