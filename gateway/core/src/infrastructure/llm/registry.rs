// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Model Registry - Named adapters and generation dispatch
//
// Maps caller-chosen model names to adapters built by the factory.
// The map is the only shared mutable state; the lock is released before
// any adapter I/O starts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use parking_lot::RwLock;
use tracing::{info, warn};

use super::factory::AdapterFactory;
use super::health::{HealthAggregator, HealthReport};
use crate::domain::gateway_config::GatewayConfigManifest;
use crate::domain::llm::{
    GatewayError, GenerationRequest, GenerationResponse, LLMProvider, ModelConfig, ModelListing,
};

/// Registry for managing named model adapters
pub struct ModelRegistry {
    factory: AdapterFactory,
    health: HealthAggregator,
    models: RwLock<HashMap<String, Arc<dyn LLMProvider>>>,
}

impl ModelRegistry {
    pub fn new(factory: AdapterFactory) -> Self {
        Self {
            health: HealthAggregator::new(factory.timeouts().effective_health_check()),
            factory,
            models: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry and register every model in the manifest.
    ///
    /// Rejected entries are logged and skipped; the rest still register.
    pub fn from_config(config: &GatewayConfigManifest) -> Self {
        let registry = Self::new(AdapterFactory::new(config.spec.timeouts));

        info!("Initializing model registry");
        for model in &config.spec.models {
            registry.add(model.clone());
        }

        if registry.is_empty() {
            warn!("No models configured - generation will not be available");
        }

        registry
    }

    /// Build an adapter and store it under `config.name`.
    ///
    /// An existing entry with the same name is replaced. Returns `false`
    /// (and registers nothing) when the factory rejects the config.
    pub fn add(&self, config: ModelConfig) -> bool {
        match self.factory.build(&config) {
            Ok(provider) => {
                self.insert(config.name.clone(), provider);
                true
            }
            Err(e) => {
                warn!("Failed to register model '{}': {}", config.name, e);
                false
            }
        }
    }

    /// Register a prebuilt adapter, bypassing the factory.
    pub fn register_provider(&self, name: impl Into<String>, provider: Arc<dyn LLMProvider>) {
        self.insert(name.into(), provider);
    }

    fn insert(&self, name: String, provider: Arc<dyn LLMProvider>) {
        let info = provider.describe();
        let count = {
            let mut models = self.models.write();
            if models.insert(name.clone(), provider).is_some() {
                info!("Replaced model '{}' -> {} ({})", name, info.model, info.provider);
            } else {
                info!("Registered model '{}' -> {} ({})", name, info.model, info.provider);
            }
            models.len()
        };
        gauge!("scriptorium_registry_models").set(count as f64);
    }

    /// Remove an entry; `true` if one existed.
    pub fn remove(&self, name: &str) -> bool {
        let (removed, count) = {
            let mut models = self.models.write();
            let removed = models.remove(name).is_some();
            (removed, models.len())
        };

        if removed {
            info!("Removed model '{}'", name);
            gauge!("scriptorium_registry_models").set(count as f64);
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn LLMProvider>> {
        self.models.read().get(name).cloned()
    }

    /// Capability metadata for every entry, sorted by name.
    pub fn list(&self) -> Vec<ModelListing> {
        let mut listings: Vec<ModelListing> = self
            .snapshot()
            .into_iter()
            .map(|(name, provider)| ModelListing {
                name,
                info: provider.describe(),
            })
            .collect();
        listings.sort_by(|a, b| a.name.cmp(&b.name));
        listings
    }

    /// Capability metadata for one entry.
    pub fn describe(&self, name: &str) -> Option<ModelListing> {
        self.get(name).map(|provider| ModelListing {
            name: name.to_string(),
            info: provider.describe(),
        })
    }

    /// Generate text with a named model. No retries: a failed call fails once.
    pub async fn generate(
        &self,
        name: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GatewayError> {
        let provider = self
            .get(name)
            .ok_or_else(|| GatewayError::NotFound(name.to_string()))?;
        let kind = provider.describe().provider;

        let started = Instant::now();
        let result = provider.generate(request).await;
        histogram!("scriptorium_generation_duration_seconds", "provider" => kind.as_str())
            .record(started.elapsed().as_secs_f64());

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => {
                warn!(model = %name, "Generation failed: {}", e);
                "error"
            }
        };
        counter!(
            "scriptorium_generation_requests_total",
            "provider" => kind.as_str(),
            "outcome" => outcome
        )
        .increment(1);

        result
    }

    /// `false` if the name is absent, otherwise the adapter's probe.
    pub async fn health_check(&self, name: &str) -> bool {
        match self.get(name) {
            Some(provider) => self.health.check(name, provider).await,
            None => false,
        }
    }

    /// Probe every entry concurrently with per-entry isolation.
    pub async fn health_check_all(&self) -> HealthReport {
        self.health.check_all(self.snapshot()).await
    }

    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }

    fn snapshot(&self) -> Vec<(String, Arc<dyn LLMProvider>)> {
        self.models
            .read()
            .iter()
            .map(|(name, provider)| (name.clone(), Arc::clone(provider)))
            .collect()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(AdapterFactory::default())
    }
}
