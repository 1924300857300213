// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Gateway Configuration Types
//
// Defines the configuration schema for a scriptorium gateway, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Models registered at startup
// - Network timeouts stamped on every adapter
// - Local backend discovery endpoints
// - Server and observability settings

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::llm::{ModelConfig, ProviderKind, Timeouts, MAX_HEALTH_CHECK_TIMEOUT};

pub const API_VERSION: &str = "scriptorium.dev/v1";
pub const KIND: &str = "GatewayConfig";
pub const CONFIG_PATH_ENV: &str = "SCRIPTORIUM_CONFIG_PATH";

/// Top-level Kubernetes-style gateway configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfigManifest {
    /// API version (must be "scriptorium.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "GatewayConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: GatewayConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable gateway name
    pub name: String,

    /// Optional: Configuration version for tracking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Gateway configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfigSpec {
    /// Models registered at startup, in order
    #[serde(default)]
    pub models: Vec<ModelConfig>,

    #[serde(default)]
    pub timeouts: Timeouts,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Where the local backend scanner looks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_ollama_url")]
    pub ollama: String,

    #[serde(default = "default_llamacpp_url")]
    pub llamacpp: String,

    #[serde(default = "default_textgen_url")]
    pub textgen: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_llamacpp_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_textgen_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            ollama: default_ollama_url(),
            llamacpp: default_llamacpp_url(),
            textgen: default_textgen_url(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for GatewayConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "scriptorium".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
            },
            spec: GatewayConfigSpec::default(),
        }
    }
}

impl GatewayConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. SCRIPTORIUM_CONFIG_PATH environment variable
    /// 2. ./scriptorium-config.yaml (working directory)
    /// 3. ~/.scriptorium/config.yaml (user home)
    /// 4. /etc/scriptorium/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./scriptorium-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".scriptorium").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/scriptorium/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing/invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(&config_path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", config_path, e)
            })?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Some(timeout) = timeout_override("SCRIPTORIUM_GENERATION_TIMEOUT_SECS") {
            self.spec.timeouts.generation = timeout;
        }

        if let Some(timeout) = timeout_override("SCRIPTORIUM_HEALTH_TIMEOUT_SECS") {
            self.spec.timeouts.health_check = timeout;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let mut seen = HashSet::new();
        for model in &self.spec.models {
            if model.name.is_empty() {
                anyhow::bail!("Model name cannot be empty");
            }

            if model.model_id.is_empty() {
                anyhow::bail!("Model identifier cannot be empty for: {}", model.name);
            }

            if model.provider.parse::<ProviderKind>().is_err() {
                anyhow::bail!(
                    "Unknown provider '{}' for model: {}",
                    model.provider,
                    model.name
                );
            }

            if !seen.insert(model.name.as_str()) {
                anyhow::bail!("Duplicate model name: {}", model.name);
            }

            if let Some(base_url) = &model.base_url {
                validate_http_url(base_url)
                    .map_err(|e| anyhow::anyhow!("Invalid base_url for {}: {}", model.name, e))?;
            }
        }

        let discovery = &self.spec.discovery;
        for (backend, url) in [
            ("ollama", &discovery.ollama),
            ("llamacpp", &discovery.llamacpp),
            ("textgen", &discovery.textgen),
        ] {
            validate_http_url(url)
                .map_err(|e| anyhow::anyhow!("Invalid discovery URL for {}: {}", backend, e))?;
        }

        let timeouts = &self.spec.timeouts;
        if timeouts.generation.is_zero() {
            anyhow::bail!("spec.timeouts.generation must be greater than zero");
        }

        if timeouts.health_check.is_zero() || timeouts.health_check > MAX_HEALTH_CHECK_TIMEOUT {
            anyhow::bail!(
                "spec.timeouts.health_check must be between 1s and {}s",
                MAX_HEALTH_CHECK_TIMEOUT.as_secs()
            );
        }

        Ok(())
    }
}

fn timeout_override(var: &str) -> Option<Duration> {
    let val = std::env::var(var).ok()?;
    match val.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => {
            tracing::info!("Environment override: {}={}", var, secs);
            Some(Duration::from_secs(secs))
        }
        _ => {
            tracing::warn!(
                "Invalid value for {}: '{}'. Expected a positive number of seconds. Ignoring.",
                var,
                val
            );
            None
        }
    }
}

fn validate_http_url(raw: &str) -> anyhow::Result<()> {
    let url = url::Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => anyhow::bail!("unsupported scheme '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
apiVersion: scriptorium.dev/v1
kind: GatewayConfig
metadata:
  name: writers-room
spec:
  models:
    - name: gpt-4
      provider: openai
      model_id: gpt-4
      api_key: env:OPENAI_API_KEY
      temperature: 0.7
    - name: llama2-local
      type: ollama
      model_id: llama2
      base_url: http://localhost:11434
  timeouts:
    generation: 2m
    health_check: 10s
  server:
    port: 9000
"#;

    #[test]
    fn test_default_manifest() {
        let manifest = GatewayConfigManifest::default();
        assert_eq!(manifest.api_version, API_VERSION);
        assert_eq!(manifest.kind, KIND);
        assert!(!manifest.metadata.name.is_empty());
        assert!(manifest.spec.models.is_empty());
        assert_eq!(manifest.spec.server.bind_address, "127.0.0.1");
        assert_eq!(manifest.spec.server.port, 8000);
        assert_eq!(manifest.spec.observability.logging.format, "text");
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_parse_sample() {
        let manifest = GatewayConfigManifest::from_yaml_str(SAMPLE).unwrap();

        assert_eq!(manifest.metadata.name, "writers-room");
        assert_eq!(manifest.spec.models.len(), 2);
        assert_eq!(manifest.spec.models[0].temperature, 0.7);
        assert_eq!(manifest.spec.models[1].provider, "ollama");
        assert_eq!(manifest.spec.timeouts.generation, Duration::from_secs(120));
        assert_eq!(manifest.spec.timeouts.health_check, Duration::from_secs(10));
        assert_eq!(manifest.spec.server.port, 9000);
        assert_eq!(manifest.spec.server.bind_address, "127.0.0.1");
        assert_eq!(manifest.spec.discovery, DiscoveryConfig::default());
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let manifest = GatewayConfigManifest::from_yaml_str(SAMPLE).unwrap();
        manifest.to_yaml_file(&path).unwrap();
        let parsed = GatewayConfigManifest::from_yaml_file(&path).unwrap();

        assert_eq!(parsed.metadata.name, "writers-room");
        assert_eq!(parsed.spec.models, manifest.spec.models);
        assert_eq!(parsed.spec.timeouts, manifest.spec.timeouts);
    }

    #[test]
    fn test_load_explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(GatewayConfigManifest::load_or_default(Some(missing)).is_err());
    }

    #[test]
    fn test_validation() {
        let mut manifest = GatewayConfigManifest::from_yaml_str(SAMPLE).unwrap();
        assert!(manifest.validate().is_ok());

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "Wrong".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.metadata.name = "".to_string();
        assert!(manifest.validate().is_err());
        manifest.metadata.name = "writers-room".to_string();

        manifest.spec.timeouts.health_check = Duration::from_secs(31);
        assert!(manifest.validate().is_err());
        manifest.spec.timeouts.health_check = Duration::from_secs(30);
        assert!(manifest.validate().is_ok());

        manifest.spec.timeouts.generation = Duration::ZERO;
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_models() {
        let base = GatewayConfigManifest::from_yaml_str(SAMPLE).unwrap();

        let mut manifest = base.clone();
        manifest.spec.models[1].provider = "cohere".to_string();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("cohere"));

        let mut manifest = base.clone();
        manifest.spec.models[1].name = "gpt-4".to_string();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate"));

        let mut manifest = base.clone();
        manifest.spec.models[0].model_id = "".to_string();
        assert!(manifest.validate().is_err());

        let mut manifest = base.clone();
        manifest.spec.models[1].base_url = Some("localhost:11434".to_string());
        assert!(manifest.validate().is_err());

        let mut manifest = base;
        manifest.spec.discovery.textgen = "ftp://localhost:5000".to_string();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_timeout_override_parsing() {
        std::env::set_var("SCRIPTORIUM_TEST_TIMEOUT_OK", "45");
        std::env::set_var("SCRIPTORIUM_TEST_TIMEOUT_BAD", "soon");
        std::env::set_var("SCRIPTORIUM_TEST_TIMEOUT_ZERO", "0");

        assert_eq!(
            timeout_override("SCRIPTORIUM_TEST_TIMEOUT_OK"),
            Some(Duration::from_secs(45))
        );
        assert_eq!(timeout_override("SCRIPTORIUM_TEST_TIMEOUT_BAD"), None);
        assert_eq!(timeout_override("SCRIPTORIUM_TEST_TIMEOUT_ZERO"), None);
        assert_eq!(timeout_override("SCRIPTORIUM_TEST_TIMEOUT_UNSET"), None);
    }
}
