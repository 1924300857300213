// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Llm
//!
//! Generation contract shared by every backend adapter.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Normalized request/response/config shapes and the provider interface

// LLM Provider Domain Interface (Anti-Corruption Layer)
//
// Every backend speaks a different wire protocol. Adapters in
// infrastructure/llm/ translate between these types and the backend's own
// payloads, so nothing outside an adapter ever sees a vendor schema.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Open mapping used for `custom_params`, `usage` and `metadata`.
pub type ParamMap = Map<String, Value>;

/// Upper bound for a single health probe.
pub const MAX_HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound for a single generation call.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Domain interface for LLM providers
/// Anti-Corruption Layer that isolates callers from vendor APIs
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the backend.
    ///
    /// Applies the merge rule, issues exactly one non-streaming call bounded by
    /// the generation timeout and either returns a full response or fails with
    /// [`GatewayError::Generation`].
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GatewayError>;

    /// Check if the backend is reachable. Never fails: any error is `false`.
    async fn health_check(&self) -> bool;

    /// Static capability flags for this adapter.
    fn describe(&self) -> ModelInfo;

    /// The configuration this adapter was built from.
    fn config(&self) -> &ModelConfig;
}

/// Closed set of backend wire protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    Ollama,
    LlamaCpp,
    TextGen,
    HuggingFace,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::OpenAI,
        ProviderKind::Anthropic,
        ProviderKind::Ollama,
        ProviderKind::LlamaCpp,
        ProviderKind::TextGen,
        ProviderKind::HuggingFace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Ollama => "ollama",
            ProviderKind::LlamaCpp => "llamacpp",
            ProviderKind::TextGen => "textgen",
            ProviderKind::HuggingFace => "huggingface",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| GatewayError::Configuration(format!("Unknown provider: {}", s)))
    }
}

/// Identity and defaults for one registered backend instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Registry key, chosen by the caller
    pub name: String,

    /// Provider kind tag (e.g. "ollama"). Kept as a raw string so an unknown
    /// tag can be represented and rejected by the adapter factory.
    #[serde(alias = "type")]
    pub provider: String,

    /// Backend-specific model identifier
    pub model_id: String,

    /// Credential (supports "env:VAR_NAME" for environment variables)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Endpoint override; each adapter has its own default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_top_p")]
    pub top_p: f64,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Backend-specific settings applied to every call; callers cannot override these
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom_params: ParamMap,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f64 {
    0.9
}

fn default_top_p() -> f64 {
    0.9
}

fn default_top_k() -> u32 {
    40
}

impl ModelConfig {
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            model_id: model_id.into(),
            api_key: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            custom_params: Map::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_custom_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom_params.insert(key.into(), value.into());
        self
    }

    /// Parse the provider tag against the closed set of kinds.
    pub fn provider_kind(&self) -> Result<ProviderKind, GatewayError> {
        self.provider.parse()
    }

    /// Merge rule: request values win when present, config values otherwise;
    /// `custom_params` always come from the config.
    pub fn merge(&self, request: &GenerationRequest) -> GenerationParams {
        GenerationParams {
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            temperature: request.temperature.unwrap_or(self.temperature),
            top_p: request.top_p.unwrap_or(self.top_p),
            top_k: request.top_k.unwrap_or(self.top_k),
            custom_params: self.custom_params.clone(),
        }
    }
}

/// Parameters for one call after the merge rule has been applied
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub custom_params: ParamMap,
}

/// One generation call. Absent fields fall back to the model's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Sequences that stop generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_stop_sequences(mut self, stop: Vec<String>) -> Self {
        self.stop_sequences = Some(stop);
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Stop sequences, if any were given. An empty list counts as none.
    pub fn stop(&self) -> Option<&[String]> {
        self.stop_sequences
            .as_deref()
            .filter(|stop| !stop.is_empty())
    }

    /// System prompt, if a non-empty one was given.
    pub fn system(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .filter(|system| !system.is_empty())
    }
}

/// Normalized result of a generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Generated text
    pub text: String,

    /// Model id echoed from the config (e.g., "gpt-4o", "llama3.2")
    pub model: String,

    pub provider: ProviderKind,

    /// Backend-reported counters; keys differ per backend
    #[serde(default)]
    pub usage: ParamMap,

    /// Backend-specific extras
    #[serde(default)]
    pub metadata: ParamMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStyle {
    Chat,
    Completion,
}

/// Capability metadata returned by [`LLMProvider::describe`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub provider: ProviderKind,
    pub model: String,
    #[serde(rename = "type")]
    pub style: GenerationStyle,
    pub supports_system_prompt: bool,
    /// Always false: the gateway never streams, even where the backend could
    pub supports_streaming: bool,
    /// Local network service (true) or hosted cloud API (false)
    pub local: bool,
}

/// A [`ModelInfo`] tagged with its registry name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelListing {
    pub name: String,
    #[serde(flatten)]
    pub info: ModelInfo,
}

/// Network bounds stamped on every adapter at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    #[serde(with = "humantime_serde", default = "default_generation_timeout")]
    pub generation: Duration,

    #[serde(with = "humantime_serde", default = "default_health_check_timeout")]
    pub health_check: Duration,
}

fn default_generation_timeout() -> Duration {
    DEFAULT_GENERATION_TIMEOUT
}

fn default_health_check_timeout() -> Duration {
    MAX_HEALTH_CHECK_TIMEOUT
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            generation: DEFAULT_GENERATION_TIMEOUT,
            health_check: MAX_HEALTH_CHECK_TIMEOUT,
        }
    }
}

impl Timeouts {
    /// Health probes never wait longer than [`MAX_HEALTH_CHECK_TIMEOUT`].
    pub fn effective_health_check(&self) -> Duration {
        self.health_check.min(MAX_HEALTH_CHECK_TIMEOUT)
    }
}

/// Underlying cause of a failed backend call
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    Request(String),
}

/// Errors surfaced to callers of the gateway
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("{provider} generation failed: {source}")]
    Generation {
        provider: ProviderKind,
        source: ProviderError,
    },
}

impl GatewayError {
    pub fn generation(provider: ProviderKind, source: ProviderError) -> Self {
        Self::Generation { provider, source }
    }
}
