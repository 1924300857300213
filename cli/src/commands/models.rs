// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Model inspection commands
//!
//! Commands: list, show, health

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use scriptorium_core::domain::llm::{GenerationStyle, ModelListing};
use scriptorium_core::infrastructure::llm::HealthReport;

use super::load_registry;

#[derive(Subcommand)]
pub enum ModelsCommand {
    /// List configured models
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show capability metadata for one model
    Show {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Probe backend health (all models when no name is given)
    Health {
        #[arg(value_name = "NAME")]
        name: Option<String>,
    },
}

pub async fn handle_command(command: ModelsCommand, config_path: Option<PathBuf>) -> Result<()> {
    let (_, registry) = load_registry(config_path)?;

    match command {
        ModelsCommand::List { json } => {
            let listings = registry.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&listings)?);
            } else if listings.is_empty() {
                println!("{}", "No models configured.".yellow());
            } else {
                print!("{}", render_table(&listings));
            }
        }
        ModelsCommand::Show { name } => {
            let listing = registry
                .describe(&name)
                .ok_or_else(|| anyhow::anyhow!("Model '{}' not found", name))?;
            print!("{}", render_listing(&listing));
        }
        ModelsCommand::Health { name: Some(name) } => {
            if registry.get(&name).is_none() {
                anyhow::bail!("Model '{}' not found", name);
            }
            let healthy = registry.health_check(&name).await;
            println!("{}", health_line(&name, healthy));
        }
        ModelsCommand::Health { name: None } => {
            let report = registry.health_check_all().await;
            print_report(&report);
        }
    }

    Ok(())
}

fn style_label(style: GenerationStyle) -> &'static str {
    match style {
        GenerationStyle::Chat => "chat",
        GenerationStyle::Completion => "completion",
    }
}

pub fn render_table(listings: &[ModelListing]) -> String {
    let width = listings
        .iter()
        .map(|l| l.name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let mut out = format!(
        "{:<width$}  {:<12}  {:<11}  {:<6}  {}\n",
        "NAME",
        "PROVIDER",
        "TYPE",
        "LOCAL",
        "MODEL",
        width = width
    );
    for listing in listings {
        out.push_str(&format!(
            "{:<width$}  {:<12}  {:<11}  {:<6}  {}\n",
            listing.name,
            listing.info.provider.as_str(),
            style_label(listing.info.style),
            if listing.info.local { "yes" } else { "no" },
            listing.info.model,
            width = width
        ));
    }
    out
}

fn render_listing(listing: &ModelListing) -> String {
    let info = &listing.info;
    format!(
        "{}\n  Provider: {}\n  Model: {}\n  Type: {}\n  System prompt: {}\n  Streaming: {}\n  Local: {}\n",
        listing.name.bold(),
        info.provider,
        info.model,
        style_label(info.style),
        info.supports_system_prompt,
        info.supports_streaming,
        info.local
    )
}

fn health_line(name: &str, healthy: bool) -> String {
    if healthy {
        format!("{} {}", "✓".green(), name)
    } else {
        format!("{} {}", "✗".red(), name)
    }
}

fn print_report(report: &HealthReport) {
    if report.is_empty() {
        println!("{}", "No models configured.".yellow());
        return;
    }
    for (name, healthy) in report {
        println!("{}", health_line(name, *healthy));
    }
}
