// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Local backend discovery
//
// Probes the well-known local servers (ollama, llama.cpp, text-generation-webui)
// so an operator can see what is running before registering models.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::endpoint;
use crate::domain::gateway_config::DiscoveryConfig;
use crate::domain::llm::GatewayError;

/// Availability of one local backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub available: bool,

    /// Installed models (ollama only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,

    /// Currently loaded model (textgen only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub ollama: BackendStatus,
    pub llamacpp: BackendStatus,
    pub textgen: BackendStatus,
}

#[derive(Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaTag>,
}

#[derive(Deserialize)]
struct OllamaTag {
    name: String,
}

#[derive(Deserialize)]
struct TextGenModel {
    result: Option<String>,
}

pub struct LocalProviderScanner {
    client: Client,
    endpoints: DiscoveryConfig,
}

impl LocalProviderScanner {
    pub fn new(endpoints: DiscoveryConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            GatewayError::Configuration(format!("Failed to create HTTP client for discovery: {}", e))
        })?;

        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &DiscoveryConfig {
        &self.endpoints
    }

    /// Probe all three backends concurrently. A failed probe only marks
    /// that backend unavailable.
    pub async fn scan(&self) -> DiscoveryReport {
        let (ollama, llamacpp, textgen) =
            tokio::join!(self.scan_ollama(), self.scan_llamacpp(), self.scan_textgen());

        DiscoveryReport {
            ollama,
            llamacpp,
            textgen,
        }
    }

    async fn scan_ollama(&self) -> BackendStatus {
        let url = endpoint(&self.endpoints.ollama, "api/tags");
        match self.fetch::<OllamaTags>(&url).await {
            Ok(tags) => BackendStatus {
                available: true,
                models: Some(tags.models.into_iter().map(|m| m.name).collect()),
                current_model: None,
            },
            Err(e) => unavailable("ollama", e),
        }
    }

    async fn scan_llamacpp(&self) -> BackendStatus {
        let url = endpoint(&self.endpoints.llamacpp, "health");
        match self.client.get(&url).send().await {
            Ok(response) => BackendStatus {
                available: response.status().is_success(),
                ..Default::default()
            },
            Err(e) => unavailable("llamacpp", e.to_string()),
        }
    }

    async fn scan_textgen(&self) -> BackendStatus {
        let url = endpoint(&self.endpoints.textgen, "api/v1/model");
        match self.fetch::<TextGenModel>(&url).await {
            Ok(model) => BackendStatus {
                available: true,
                models: None,
                current_model: Some(model.result.unwrap_or_else(|| "unknown".to_string())),
            },
            Err(e) => unavailable("textgen", e),
        }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, String> {
        let response = self.client.get(url).send().await.map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }
        response.json::<T>().await.map_err(|e| e.to_string())
    }
}

fn unavailable(backend: &str, reason: String) -> BackendStatus {
    debug!(backend, reason = %reason, "Local backend not available");
    BackendStatus::default()
}
