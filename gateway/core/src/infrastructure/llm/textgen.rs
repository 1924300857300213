// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Text Generation WebUI adapter
//
// Legacy blocking API (`/api/v1/generate`). The server may echo the prompt
// and reports no token counters, so usage is approximated by word counts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::instrument;

use super::http::{endpoint, BackendClient};
use super::prompt::{assistant_prompt, strip_echoed_prompt, word_count};
use crate::domain::llm::{
    GatewayError, GenerationRequest, GenerationResponse, GenerationStyle, LLMProvider, ModelConfig,
    ModelInfo, ProviderError, ProviderKind, Timeouts,
};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000";

pub struct TextGenAdapter {
    http: BackendClient,
    config: ModelConfig,
    endpoint: String,
}

#[derive(Serialize)]
struct TextGenRequest<'a> {
    prompt: &'a str,
    max_new_tokens: u32,
    temperature: f64,
    top_p: f64,
    top_k: u32,
    do_sample: bool,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stopping_strings: Option<&'a [String]>,
}

#[derive(Deserialize)]
struct TextGenResponse {
    results: Vec<TextGenResult>,
}

#[derive(Deserialize)]
struct TextGenResult {
    text: String,
}

impl TextGenAdapter {
    pub fn new(config: ModelConfig, timeouts: Timeouts) -> Result<Self, GatewayError> {
        let endpoint = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Ok(Self {
            http: BackendClient::new(ProviderKind::TextGen, timeouts)?,
            config,
            endpoint,
        })
    }

    pub(crate) fn build_payload(
        &self,
        request: &GenerationRequest,
        prompt: &str,
    ) -> Result<Value, GatewayError> {
        let params = self.config.merge(request);

        let body = TextGenRequest {
            prompt,
            max_new_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            do_sample: true,
            stream: false,
            stopping_strings: request.stop(),
        };
        self.http.payload(&body, &params.custom_params, None)
    }
}

#[async_trait]
impl LLMProvider for TextGenAdapter {
    #[instrument(skip_all, fields(provider = "textgen", model = %self.config.model_id))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GatewayError> {
        let prompt = assistant_prompt(request);
        let payload = self.build_payload(request, &prompt)?;

        let url = endpoint(&self.endpoint, "api/v1/generate");
        let response: TextGenResponse = self
            .http
            .send_json(self.http.post(&url).json(&payload))
            .await?;

        let raw = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| self.http.fail(ProviderError::Decode("Empty results list".into())))?
            .text;
        let text = strip_echoed_prompt(&raw, &prompt);

        let mut usage = Map::new();
        usage.insert("prompt_tokens".into(), json!(word_count(&prompt)));
        usage.insert("completion_tokens".into(), json!(word_count(&text)));

        Ok(GenerationResponse {
            text,
            model: self.config.model_id.clone(),
            provider: ProviderKind::TextGen,
            usage,
            metadata: Map::new(),
        })
    }

    async fn health_check(&self) -> bool {
        let url = endpoint(&self.endpoint, "api/v1/model");
        let outcome = self.http.probe(self.http.probe_get(&url)).await;
        self.http.healthy(outcome, |status| status.is_success())
    }

    fn describe(&self) -> ModelInfo {
        ModelInfo {
            provider: ProviderKind::TextGen,
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
