// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Adapter Factory
//
// Closed mapping from provider kind to adapter constructor. An unknown kind
// is a Configuration error; there is no fallback adapter.

use std::sync::Arc;

use crate::domain::llm::{GatewayError, LLMProvider, ModelConfig, ProviderKind, Timeouts};

use super::anthropic::AnthropicAdapter;
use super::huggingface::HuggingFaceAdapter;
use super::llamacpp::LlamaCppAdapter;
use super::ollama::OllamaAdapter;
use super::openai::OpenAIAdapter;
use super::textgen::TextGenAdapter;

/// Builds adapters, stamping the configured timeouts on each one
#[derive(Debug, Clone, Copy, Default)]
pub struct AdapterFactory {
    timeouts: Timeouts,
}

impl AdapterFactory {
    pub fn new(timeouts: Timeouts) -> Self {
        Self { timeouts }
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Create a provider instance from configuration
    pub fn build(&self, config: &ModelConfig) -> Result<Arc<dyn LLMProvider>, GatewayError> {
        let kind = config.provider_kind()?;
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let config = config.clone();
        let timeouts = self.timeouts;

        let provider: Arc<dyn LLMProvider> = match kind {
            ProviderKind::OpenAI => Arc::new(OpenAIAdapter::new(config, api_key, timeouts)?),
            ProviderKind::Anthropic => Arc::new(AnthropicAdapter::new(config, api_key, timeouts)?),
            ProviderKind::Ollama => Arc::new(OllamaAdapter::new(config, timeouts)?),
            ProviderKind::LlamaCpp => Arc::new(LlamaCppAdapter::new(config, timeouts)?),
            ProviderKind::TextGen => Arc::new(TextGenAdapter::new(config, timeouts)?),
            ProviderKind::HuggingFace => {
                Arc::new(HuggingFaceAdapter::new(config, api_key, timeouts)?)
            }
        };

        Ok(provider)
    }
}

/// Resolve API key from config (supports "env:VAR_NAME" syntax)
fn resolve_api_key(key: Option<&str>) -> Result<Option<String>, GatewayError> {
    match key {
        Some(k) => match k.strip_prefix("env:") {
            Some(var_name) => std::env::var(var_name).map(Some).map_err(|_| {
                GatewayError::Configuration(format!(
                    "Environment variable not set: {}",
                    var_name
                ))
            }),
            None if k.is_empty() => Ok(None),
            None => Ok(Some(k.to_string())),
        },
        // Local providers without auth
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::GenerationStyle;

    #[test]
    fn test_build_every_kind() {
        let factory = AdapterFactory::default();

        for kind in ProviderKind::ALL {
            let config = ModelConfig::new("m", kind.as_str(), "some-model");
            let adapter = factory.build(&config).unwrap();
            let info = adapter.describe();

            assert_eq!(info.provider, kind);
            assert_eq!(info.model, "some-model");
            assert!(!info.supports_streaming);
            assert_eq!(adapter.config().name, "m");
        }
    }

    #[test]
    fn test_describe_flags_by_kind() {
        let factory = AdapterFactory::default();
        let describe = |kind: &str| {
            factory
                .build(&ModelConfig::new("m", kind, "x"))
                .unwrap()
                .describe()
        };

        assert_eq!(describe("openai").style, GenerationStyle::Chat);
        assert_eq!(describe("anthropic").style, GenerationStyle::Chat);
        assert_eq!(describe("textgen").style, GenerationStyle::Completion);
        assert!(describe("ollama").local);
        assert!(describe("llamacpp").local);
        assert!(!describe("huggingface").local);
    }

    #[test]
    fn test_unknown_kind_is_configuration_error() {
        let err = AdapterFactory::default()
            .build(&ModelConfig::new("m", "cohere", "command"))
            .err()
            .unwrap();

        assert!(matches!(err, GatewayError::Configuration(msg) if msg.contains("cohere")));
    }

    #[test]
    fn test_resolve_api_key() {
        std::env::set_var("SCRIPTORIUM_FACTORY_TEST_KEY", "sk-from-env");

        assert_eq!(
            resolve_api_key(Some("env:SCRIPTORIUM_FACTORY_TEST_KEY")).unwrap(),
            Some("sk-from-env".to_string())
        );
        assert_eq!(
            resolve_api_key(Some("sk-literal")).unwrap(),
            Some("sk-literal".to_string())
        );
        assert_eq!(resolve_api_key(Some("")).unwrap(), None);
        assert_eq!(resolve_api_key(None).unwrap(), None);
        assert!(resolve_api_key(Some("env:SCRIPTORIUM_FACTORY_TEST_UNSET")).is_err());
    }

    #[test]
    fn test_missing_env_credential_rejects_build() {
        let config = ModelConfig::new("gpt", "openai", "gpt-4")
            .with_api_key("env:SCRIPTORIUM_FACTORY_TEST_MISSING");

        let err = AdapterFactory::default().build(&config).err().unwrap();
        assert!(
            matches!(err, GatewayError::Configuration(msg) if msg.contains("SCRIPTORIUM_FACTORY_TEST_MISSING"))
        );
    }
}
