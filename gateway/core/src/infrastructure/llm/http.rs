// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared HTTP plumbing for backend adapters
//!
//! Owns the per-adapter `reqwest::Client`, stamps the generation / health
//! timeouts on each request and maps transport and status failures onto
//! [`ProviderError`].

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::llm::{GatewayError, ParamMap, ProviderError, ProviderKind, Timeouts};

/// HTTP client bound to one adapter instance
#[derive(Debug, Clone)]
pub(crate) struct BackendClient {
    client: Client,
    provider: ProviderKind,
    timeouts: Timeouts,
}

impl BackendClient {
    pub(crate) fn new(provider: ProviderKind, timeouts: Timeouts) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeouts.generation)
            .build()
            .map_err(|e| {
                GatewayError::Configuration(format!(
                    "Failed to create HTTP client for {}: {}",
                    provider, e
                ))
            })?;

        Ok(Self {
            client,
            provider,
            timeouts,
        })
    }

    /// POST for a generation call (generation timeout)
    pub(crate) fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url).timeout(self.timeouts.generation)
    }

    /// GET for a health probe (health timeout)
    pub(crate) fn probe_get(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .timeout(self.timeouts.effective_health_check())
    }

    /// POST for a health probe (health timeout)
    pub(crate) fn probe_post(&self, url: &str) -> RequestBuilder {
        self.client
            .post(url)
            .timeout(self.timeouts.effective_health_check())
    }

    /// Send a generation request and decode the success body.
    ///
    /// A transport error, a non-success status or an undecodable body all
    /// become [`GatewayError::Generation`] tagged with this adapter's kind.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let request = request
            .build()
            .map_err(|e| self.fail(ProviderError::Request(e.to_string())))?;
        debug!(provider = %self.provider, url = %request.url(), "Sending generation request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| self.fail(network_error(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.fail(ProviderError::Http {
                status: status.as_u16(),
                body,
            }));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| self.fail(ProviderError::Decode(e.to_string())))
    }

    /// Send a health probe and report its status code.
    pub(crate) async fn probe(&self, request: RequestBuilder) -> Result<StatusCode, ProviderError> {
        let response = request.send().await.map_err(network_error)?;
        Ok(response.status())
    }

    /// Collapse a probe outcome to a boolean, logging the reason for `false`.
    pub(crate) fn healthy(
        &self,
        outcome: Result<StatusCode, ProviderError>,
        accept: impl Fn(StatusCode) -> bool,
    ) -> bool {
        match outcome {
            Ok(status) if accept(status) => true,
            Ok(status) => {
                debug!(provider = %self.provider, %status, "Health probe returned unhealthy status");
                false
            }
            Err(e) => {
                debug!(provider = %self.provider, error = %e, "Health probe failed");
                false
            }
        }
    }

    pub(crate) fn fail(&self, source: ProviderError) -> GatewayError {
        GatewayError::generation(self.provider, source)
    }

    /// Serialize a typed payload and overlay operator `custom_params` on it.
    ///
    /// With `nested` set, the params land in that child object instead of the
    /// top level (e.g. ollama `options`, huggingface `parameters`).
    pub(crate) fn payload<T: Serialize>(
        &self,
        body: &T,
        custom_params: &ParamMap,
        nested: Option<&str>,
    ) -> Result<Value, GatewayError> {
        let mut payload =
            serde_json::to_value(body).map_err(|e| self.fail(ProviderError::Request(e.to_string())))?;

        let target = match nested {
            Some(key) => payload.get_mut(key),
            None => Some(&mut payload),
        };

        match target.and_then(Value::as_object_mut) {
            Some(object) => {
                for (key, value) in custom_params {
                    object.insert(key.clone(), value.clone());
                }
                Ok(payload)
            }
            None if custom_params.is_empty() => Ok(payload),
            None => Err(self.fail(ProviderError::Request(
                "custom_params target is not a JSON object".to_string(),
            ))),
        }
    }
}

fn network_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Network(format!("request timed out: {}", e))
    } else {
        ProviderError::Network(e.to_string())
    }
}

/// Join a base URL and a path without doubling the slash.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Body {
        prompt: String,
        options: Value,
    }

    fn client() -> BackendClient {
        BackendClient::new(ProviderKind::Ollama, Timeouts::default()).unwrap()
    }

    #[test]
    fn test_endpoint_join() {
        assert_eq!(endpoint("http://h:1/", "/api/tags"), "http://h:1/api/tags");
        assert_eq!(endpoint("http://h:1", "completion"), "http://h:1/completion");
    }

    #[test]
    fn test_payload_overlays_top_level() {
        let body = Body {
            prompt: "hi".to_string(),
            options: json!({}),
        };
        let mut params = ParamMap::new();
        params.insert("prompt".to_string(), json!("operator"));
        params.insert("seed".to_string(), json!(7));

        let payload = client().payload(&body, &params, None).unwrap();
        assert_eq!(payload["prompt"], json!("operator"));
        assert_eq!(payload["seed"], json!(7));
    }

    #[test]
    fn test_payload_overlays_nested_object() {
        let body = Body {
            prompt: "hi".to_string(),
            options: json!({"temperature": 0.2}),
        };
        let mut params = ParamMap::new();
        params.insert("repeat_penalty".to_string(), json!(1.1));

        let payload = client().payload(&body, &params, Some("options")).unwrap();
        assert_eq!(payload["options"]["temperature"], json!(0.2));
        assert_eq!(payload["options"]["repeat_penalty"], json!(1.1));
        assert!(payload.get("repeat_penalty").is_none());
    }

    #[test]
    fn test_payload_rejects_missing_nested_target() {
        let body = Body {
            prompt: "hi".to_string(),
            options: json!(null),
        };
        let mut params = ParamMap::new();
        params.insert("seed".to_string(), json!(1));

        let err = client().payload(&body, &params, Some("options")).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Generation {
                provider: ProviderKind::Ollama,
                source: ProviderError::Request(_)
            }
        ));
    }
}
