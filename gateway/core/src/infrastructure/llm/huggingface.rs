// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Hugging Face Inference API adapter
//
// Hosted text-generation pipeline at `{base}/models/{model_id}`.

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

pub const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co";

pub struct HuggingFaceAdapter {
    http: BackendClient,
    config: ModelConfig,
    url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters<'a>,
}

#[derive(Serialize)]
struct InferenceParameters<'a> {
    max_new_tokens: u32,
    temperature: f64,
    top_p: f64,
    top_k: u32,
    do_sample: bool,
    return_full_text: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<&'a [String]>,
}

/// The pipeline answers with either a list of generations or a single one
#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batch(Vec<Generated>),
    Single(Generated),
}

#[derive(Deserialize)]
struct Generated {
    generated_text: String,
}

impl InferenceResponse {
    fn into_text(self) -> Option<String> {
        match self {
            InferenceResponse::Batch(items) => items.into_iter().next().map(|g| g.generated_text),
            InferenceResponse::Single(g) => Some(g.generated_text),
        }
    }
}

impl HuggingFaceAdapter {
    pub fn new(
        config: ModelConfig,
        api_key: Option<String>,
        timeouts: Timeouts,
    ) -> Result<Self, GatewayError> {
        let base = config.base_url.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let url = endpoint(base, &format!("models/{}", config.model_id));

        Ok(Self {
            http: BackendClient::new(ProviderKind::HuggingFace, timeouts)?,
            config,
            url,
            api_key,
        })
    }

    pub(crate) fn build_payload(
        &self,
        request: &GenerationRequest,
        prompt: &str,
    ) -> Result<Value, GatewayError> {
        let params = self.config.merge(request);

        let body = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                max_new_tokens: params.max_tokens,
                temperature: params.temperature,
                top_p: params.top_p,
                top_k: params.top_k,
                do_sample: true,
                return_full_text: false,
                stop_sequences: request.stop(),
            },
        };
        self.http
            .payload(&body, &params.custom_params, Some("parameters"))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl LLMProvider for HuggingFaceAdapter {
    #[instrument(skip_all, fields(provider = "huggingface", model = %self.config.model_id))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GatewayError> {
        let prompt = assistant_prompt(request);
        let payload = self.build_payload(request, &prompt)?;

        let response: InferenceResponse = self
            .http
            .send_json(self.authorize(self.http.post(&self.url)).json(&payload))
            .await?;

        let generated = response.into_text().ok_or_else(|| {
            self.http
                .fail(ProviderError::Decode("empty generation list".to_string()))
        })?;
        let text = strip_echoed_prompt(&generated, &prompt);

        let mut usage = Map::new();
        usage.insert("prompt_tokens".into(), json!(word_count(&prompt)));
        usage.insert("completion_tokens".into(), json!(word_count(&text)));

        Ok(GenerationResponse {
            text,
            model: self.config.model_id.clone(),
            provider: ProviderKind::HuggingFace,
            usage,
            metadata: Map::new(),
        })
    }

    async fn health_check(&self) -> bool {
        // 503 means the model is still loading on the hosted side
        let probe = self
            .authorize(self.http.probe_post(&self.url))
            .json(&json!({"inputs": "test"}));
        let outcome = self.http.probe(probe).await;
        self.http
            .healthy(outcome, |status| status.as_u16() == 200 || status.as_u16() == 503)
    }

    fn describe(&self) -> ModelInfo {
        ModelInfo {
            provider: ProviderKind::HuggingFace,
            model: self.config.model_id.clone(),
            style: GenerationStyle::Completion,
            supports_system_prompt: true,
            supports_streaming: false,
            local: false,
        }
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }
}
