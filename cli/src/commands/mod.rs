// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the scriptorium CLI

use anyhow::{Context, Result};
use std::path::PathBuf;

use scriptorium_core::domain::gateway_config::GatewayConfigManifest;
use scriptorium_core::infrastructure::llm::ModelRegistry;

pub mod config;
pub mod generate;
pub mod models;
pub mod scan;
pub mod serve;

pub use self::config::ConfigCommand;
pub use self::generate::GenerateArgs;
pub use self::models::ModelsCommand;
pub use self::serve::ServeArgs;

/// Load the gateway configuration (explicit path, then discovery, then defaults)
pub fn load_config(config_path: Option<PathBuf>) -> Result<GatewayConfigManifest> {
    let config = GatewayConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;
    Ok(config)
}

/// Load the configuration and register every configured model
pub fn load_registry(config_path: Option<PathBuf>) -> Result<(GatewayConfigManifest, ModelRegistry)> {
    let config = load_config(config_path)?;
    let registry = ModelRegistry::from_config(&config);
    Ok((config, registry))
}
