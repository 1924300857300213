// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Anthropic LLM Provider Adapter
//
// Anti-Corruption Layer for the Anthropic Messages API.
// The system prompt is a top-level field, not a message role.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::instrument;

use super::http::{endpoint, BackendClient};
use crate::domain::llm::{
    GatewayError, GenerationRequest, GenerationResponse, GenerationStyle, LLMProvider, ModelConfig,
    ModelInfo, ProviderKind, Timeouts,
};

pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicAdapter {
    http: BackendClient,
    config: ModelConfig,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<&'a [String]>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    id: Option<String>,
    content: Vec<AnthropicContent>,
    usage: AnthropicUsage,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

impl AnthropicAdapter {
    pub fn new(
        config: ModelConfig,
        api_key: Option<String>,
        timeouts: Timeouts,
    ) -> Result<Self, GatewayError> {
        let endpoint = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Ok(Self {
            http: BackendClient::new(ProviderKind::Anthropic, timeouts)?,
            config,
            endpoint,
            api_key,
        })
    }

    pub(crate) fn build_payload(&self, request: &GenerationRequest) -> Result<Value, GatewayError> {
        let params = self.config.merge(request);

        let body = AnthropicRequest {
            model: &self.config.model_id,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            system: request.system(),
            messages: vec![AnthropicMessage {
                role: "user",
                content: &request.prompt,
            }],
            stop_sequences: request.stop(),
        };
        self.http.payload(&body, &params.custom_params, None)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("anthropic-version", API_VERSION);
        match &self.api_key {
            Some(key) => request.header("x-api-key", key),
            None => request,
        }
    }
}

#[async_trait]
impl LLMProvider for AnthropicAdapter {
    #[instrument(skip_all, fields(provider = "anthropic", model = %self.config.model_id))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GatewayError> {
        let payload = self.build_payload(request)?;

        let url = endpoint(&self.endpoint, "v1/messages");
        let response: AnthropicResponse = self
            .http
            .send_json(self.authorize(self.http.post(&url)).json(&payload))
            .await?;

        // Only the first content block is surfaced
        let text = response
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .unwrap_or_default();

        let mut usage = Map::new();
        usage.insert("input_tokens".into(), json!(response.usage.input_tokens));
        usage.insert("output_tokens".into(), json!(response.usage.output_tokens));

        let mut metadata = Map::new();
        if let Some(reason) = response.stop_reason {
            metadata.insert("stop_reason".into(), json!(reason));
        }
        if let Some(id) = response.id {
            metadata.insert("id".into(), json!(id));
        }

        Ok(GenerationResponse {
            text,
            model: self.config.model_id.clone(),
            provider: ProviderKind::Anthropic,
            usage,
            metadata,
        })
    }

    async fn health_check(&self) -> bool {
        // Model listing is authenticated and costs no tokens
        let url = endpoint(&self.endpoint, "v1/models");
        let outcome = self.http.probe(self.authorize(self.http.probe_get(&url))).await;
        self.http.healthy(outcome, |status| status.is_success())
    }

    fn describe(&self) -> ModelInfo {
        ModelInfo {
            provider: ProviderKind::Anthropic,
            model: self.config.model_id.clone(),
            style: GenerationStyle::Chat,
            supports_system_prompt: true,
            supports_streaming: false,
            local: false,
        }
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }
}
