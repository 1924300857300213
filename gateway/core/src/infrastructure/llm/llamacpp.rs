// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// llama.cpp server adapter
//
// Raw completion against the llama.cpp HTTP server (`/completion`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::instrument;

use super::http::{endpoint, BackendClient};
use crate::domain::llm::{
    GatewayError, GenerationRequest, GenerationResponse, GenerationStyle, LLMProvider, ModelConfig,
    ModelInfo, ProviderKind, Timeouts,
};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";

pub struct LlamaCppAdapter {
    http: BackendClient,
    config: ModelConfig,
    endpoint: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    prompt: String,
    n_predict: u32,
    temperature: f64,
    top_p: f64,
    top_k: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    content: String,
    #[serde(default)]
    tokens_evaluated: u64,
    #[serde(default)]
    tokens_predicted: u64,
    timings: Option<Value>,
    stopped_eos: Option<bool>,
}

fn chat_template(system: &str, prompt: &str) -> String {
    format!(
        "<|system|>\n{}\n<|user|>\n{}\n<|assistant|>\n",
        system, prompt
    )
}

impl LlamaCppAdapter {
    pub fn new(config: ModelConfig, timeouts: Timeouts) -> Result<Self, GatewayError> {
        let endpoint = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Ok(Self {
            http: BackendClient::new(ProviderKind::LlamaCpp, timeouts)?,
            config,
            endpoint,
        })
    }

    pub(crate) fn build_payload(&self, request: &GenerationRequest) -> Result<Value, GatewayError> {
        let params = self.config.merge(request);

        let prompt = match request.system() {
            Some(system) => chat_template(system, &request.prompt),
            None => request.prompt.clone(),
        };

        let body = CompletionRequest {
            prompt,
            n_predict: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            stream: false,
            stop: request.stop(),
        };
        self.http.payload(&body, &params.custom_params, None)
    }
}

#[async_trait]
impl LLMProvider for LlamaCppAdapter {
    #[instrument(skip_all, fields(provider = "llamacpp", model = %self.config.model_id))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GatewayError> {
        let payload = self.build_payload(request)?;

        let url = endpoint(&self.endpoint, "completion");
        let response: CompletionResponse = self
            .http
            .send_json(self.http.post(&url).json(&payload))
            .await?;

        let mut usage = Map::new();
        usage.insert("prompt_tokens".into(), json!(response.tokens_evaluated));
        usage.insert("completion_tokens".into(), json!(response.tokens_predicted));

        let mut metadata = Map::new();
        if let Some(timings) = response.timings {
            metadata.insert("timings".into(), timings);
        }
        if let Some(stopped_eos) = response.stopped_eos {
            metadata.insert("stopped_eos".into(), json!(stopped_eos));
        }

        Ok(GenerationResponse {
            text: response.content,
            model: self.config.model_id.clone(),
            provider: ProviderKind::LlamaCpp,
            usage,
            metadata,
        })
    }

    async fn health_check(&self) -> bool {
        let url = endpoint(&self.endpoint, "health");
        let outcome = self.http.probe(self.http.probe_get(&url)).await;
        self.http.healthy(outcome, |status| status.is_success())
    }

    fn describe(&self) -> ModelInfo {
        ModelInfo {
            provider: ProviderKind::LlamaCpp,
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
