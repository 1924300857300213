// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// OpenAI LLM Provider Adapter
//
// Anti-Corruption Layer for the OpenAI chat completions API.
// Also works with OpenAI-compatible APIs (LM Studio, vLLM, etc.) via base_url.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::instrument;

use super::http::{endpoint, BackendClient};
use crate::domain::llm::{
    GatewayError, GenerationRequest, GenerationResponse, GenerationStyle, LLMProvider, ModelConfig,
    ModelInfo, ProviderError, ProviderKind, Timeouts,
};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

pub struct OpenAIAdapter {
    http: BackendClient,
    config: ModelConfig,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Serialize)]
struct OpenAIMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    id: Option<String>,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

impl OpenAIAdapter {
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
            http: BackendClient::new(ProviderKind::OpenAI, timeouts)?,
            config,
            endpoint,
            api_key,
        })
    }

    pub(crate) fn build_payload(&self, request: &GenerationRequest) -> Result<Value, GatewayError> {
        let params = self.config.merge(request);

        // System prompt travels as its own role entry
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system() {
            messages.push(OpenAIMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(OpenAIMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = OpenAIRequest {
            model: &self.config.model_id,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            stop: request.stop(),
        };
        self.http.payload(&body, &params.custom_params, None)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAIAdapter {
    #[instrument(skip_all, fields(provider = "openai", model = %self.config.model_id))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GatewayError> {
        let payload = self.build_payload(request)?;

        let url = endpoint(&self.endpoint, "chat/completions");
        let response: OpenAIResponse = self
            .http
            .send_json(self.authorize(self.http.post(&url)).json(&payload))
            .await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| self.http.fail(ProviderError::Decode("No response from model".into())))?;

        let mut usage = Map::new();
        if let Some(counts) = response.usage {
            usage.insert("prompt_tokens".into(), json!(counts.prompt_tokens));
            usage.insert("completion_tokens".into(), json!(counts.completion_tokens));
            usage.insert("total_tokens".into(), json!(counts.total_tokens));
        }

        let mut metadata = Map::new();
        if let Some(reason) = choice.finish_reason {
            metadata.insert("finish_reason".into(), json!(reason));
        }
        if let Some(id) = response.id {
            metadata.insert("id".into(), json!(id));
        }

        Ok(GenerationResponse {
            text: choice.message.content.unwrap_or_default(),
            model: self.config.model_id.clone(),
            provider: ProviderKind::OpenAI,
            usage,
            metadata,
        })
    }

    async fn health_check(&self) -> bool {
        // Listing models proves both reachability and a valid key
        let url = endpoint(&self.endpoint, "models");
        let outcome = self.http.probe(self.authorize(self.http.probe_get(&url))).await;
        self.http.healthy(outcome, |status| status.is_success())
    }

    fn describe(&self) -> ModelInfo {
        ModelInfo {
            provider: ProviderKind::OpenAI,
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

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn adapter(url: &str) -> OpenAIAdapter {
        let config = ModelConfig::new("gpt", "openai", "gpt-4o").with_base_url(url);
        OpenAIAdapter::new(config, Some("sk-test".to_string()), Timeouts::default()).unwrap()
    }

    fn completion_body() -> String {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello world"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 2, "total_tokens": 11}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_generate_sends_exact_chat_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::Json(json!({
                "model": "gpt-4o",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hello"}
                ],
                "max_tokens": 4096,
                "temperature": 0.2,
                "top_p": 0.9,
                "stop": ["\n\n"]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body())
            .create_async()
            .await;

        let request = GenerationRequest::new("hello")
            .with_system_prompt("be brief")
            .with_temperature(0.2)
            .with_stop_sequences(vec!["\n\n".to_string()]);
        let response = adapter(&server.url()).generate(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.text, "Hello world");
        assert_eq!(response.model, "gpt-4o");
        assert_eq!(response.provider, ProviderKind::OpenAI);
        assert_eq!(response.usage["prompt_tokens"], json!(9));
        assert_eq!(response.usage["completion_tokens"], json!(2));
        assert_eq!(response.usage["total_tokens"], json!(11));
        assert_eq!(response.metadata["finish_reason"], json!("stop"));
    }

    #[tokio::test]
    async fn test_generate_without_system_sends_only_user_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(json!({
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .with_status(200)
            .with_body(completion_body())
            .create_async()
            .await;

        adapter(&server.url())
            .generate(&GenerationRequest::new("hello"))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_maps_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let err = adapter(&server.url())
            .generate(&GenerationRequest::new("hello"))
            .await
            .unwrap_err();

        match err {
            GatewayError::Generation {
                provider,
                source: ProviderError::Http { status, body },
            } => {
                assert_eq!(provider, ProviderKind::OpenAI);
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(json!({"choices": []}).to_string())
            .create_async()
            .await;

        let err = adapter(&server.url())
            .generate(&GenerationRequest::new("hello"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Generation {
                source: ProviderError::Decode(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_health_check_lists_models() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/models")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_body(r#"{"data": []}"#)
            .create_async()
            .await;

        assert!(adapter(&server.url()).health_check().await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_health_check_false_on_bad_key() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/models")
            .with_status(401)
            .create_async()
            .await;

        assert!(!adapter(&server.url()).health_check().await);
    }

    #[test]
    fn test_payload_has_no_top_k_and_custom_params_win() {
        let config = ModelConfig::new("gpt", "openai", "gpt-4o")
            .with_custom_param("max_tokens", 256)
            .with_custom_param("presence_penalty", 0.5);
        let adapter = OpenAIAdapter::new(config, None, Timeouts::default()).unwrap();

        let payload = adapter
            .build_payload(&GenerationRequest::new("hi").with_max_tokens(10).with_top_k(5))
            .unwrap();

        assert!(payload.get("top_k").is_none());
        assert!(payload.get("stop").is_none());
        assert_eq!(payload["max_tokens"], json!(256));
        assert_eq!(payload["presence_penalty"], json!(0.5));
    }

    #[test]
    fn test_describe() {
        let info = adapter("http://localhost:1").describe();
        assert_eq!(info.style, GenerationStyle::Chat);
        assert!(info.supports_system_prompt);
        assert!(!info.supports_streaming);
        assert!(!info.local);
    }
}
