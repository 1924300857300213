// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Ollama LLM Provider Adapter
//
// Anti-Corruption Layer for Ollama local models
// Supports air-gapped deployments with local LLMs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::instrument;

use super::http::{endpoint, BackendClient};
use crate::domain::llm::{
    GatewayError, GenerationRequest, GenerationResponse, GenerationStyle, LLMProvider, ModelConfig,
    ModelInfo, ProviderKind, Timeouts,
};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

pub struct OllamaAdapter {
    http: BackendClient,
    config: ModelConfig,
    endpoint: String,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: OllamaOptions<'a>,
}

#[derive(Serialize)]
struct OllamaOptions<'a> {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
    #[serde(default)]
    eval_duration: u64,
    #[serde(default)]
    load_duration: u64,
    #[serde(default)]
    total_duration: u64,
}

impl OllamaAdapter {
    pub fn new(config: ModelConfig, timeouts: Timeouts) -> Result<Self, GatewayError> {
        let endpoint = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Ok(Self {
            http: BackendClient::new(ProviderKind::Ollama, timeouts)?,
            config,
            endpoint,
        })
    }

    pub(crate) fn build_payload(&self, request: &GenerationRequest) -> Result<Value, GatewayError> {
        let params = self.config.merge(request);

        let prompt = match request.system() {
            Some(system) => format!("System: {}\n\nUser: {}", system, request.prompt),
            None => request.prompt.clone(),
        };

        let body = OllamaRequest {
            model: &self.config.model_id,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: params.temperature,
                top_p: params.top_p,
                top_k: params.top_k,
                num_predict: params.max_tokens,
                stop: request.stop(),
            },
        };
        self.http.payload(&body, &params.custom_params, Some("options"))
    }
}

#[async_trait]
impl LLMProvider for OllamaAdapter {
    #[instrument(skip_all, fields(provider = "ollama", model = %self.config.model_id))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GatewayError> {
        let payload = self.build_payload(request)?;

        let url = endpoint(&self.endpoint, "api/generate");
        let response: OllamaResponse = self
            .http
            .send_json(self.http.post(&url).json(&payload))
            .await?;

        let mut usage = Map::new();
        usage.insert("prompt_eval_count".into(), json!(response.prompt_eval_count));
        usage.insert("eval_count".into(), json!(response.eval_count));

        // Durations are nanoseconds, as reported by the server
        let mut metadata = Map::new();
        metadata.insert("eval_duration".into(), json!(response.eval_duration));
        metadata.insert("load_duration".into(), json!(response.load_duration));
        metadata.insert("total_duration".into(), json!(response.total_duration));

        Ok(GenerationResponse {
            text: response.response,
            model: self.config.model_id.clone(),
            provider: ProviderKind::Ollama,
            usage,
            metadata,
        })
    }

    async fn health_check(&self) -> bool {
        // Check if Ollama server is running by listing models
        let url = endpoint(&self.endpoint, "api/tags");
        let outcome = self.http.probe(self.http.probe_get(&url)).await;
        self.http.healthy(outcome, |status| status.is_success())
    }

    fn describe(&self) -> ModelInfo {
        ModelInfo {
            provider: ProviderKind::Ollama,
            model: self.config.model_id.clone(),
            style: GenerationStyle::Completion,
            supports_system_prompt: true,
            supports_streaming: false,
            local: true,
        }
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }
}
