// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local backend discovery

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use scriptorium_core::infrastructure::llm::{BackendStatus, LocalProviderScanner};

use super::load_config;

pub async fn execute(config_path: Option<PathBuf>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let scanner = LocalProviderScanner::new(
        config.spec.discovery.clone(),
        config.spec.timeouts.effective_health_check(),
    )?;

    let report = scanner.scan().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let endpoints = scanner.endpoints();
    println!("{}", "Local backends:".bold());
    print_status("ollama", &endpoints.ollama, &report.ollama);
    print_status("llamacpp", &endpoints.llamacpp, &report.llamacpp);
    print_status("textgen", &endpoints.textgen, &report.textgen);

    Ok(())
}

fn print_status(backend: &str, url: &str, status: &BackendStatus) {
    if !status.available {
        println!("  {} {} ({})", "✗".red(), backend, url.dimmed());
        return;
    }

    println!("  {} {} ({})", "✓".green(), backend, url.dimmed());
    if let Some(models) = &status.models {
        for model in models {
            println!("      - {}", model);
        }
    }
    if let Some(model) = &status.current_model {
        println!("      loaded: {}", model);
    }
}
