// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Health Aggregator
//!
//! Fans a health check out to every registered adapter at once. Each check
//! runs in its own task under its own timeout, so a hung, failing or
//! panicking adapter only ever costs its own entry.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use metrics::counter;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

use crate::domain::llm::LLMProvider;

/// Model name -> healthy
pub type HealthReport = BTreeMap<String, bool>;

#[derive(Debug, Clone, Copy)]
pub struct HealthAggregator {
    timeout: Duration,
}

impl HealthAggregator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Check one adapter in its own task. A panic or timeout reads as `false`.
    pub async fn check(&self, name: &str, provider: Arc<dyn LLMProvider>) -> bool {
        let healthy = settle(name, self.spawn_check(name.to_string(), provider).await);
        debug!(model = %name, healthy, "Health check complete");
        healthy
    }

    /// Check every entry concurrently. Completes once each check has
    /// returned or hit its own timeout.
    pub async fn check_all(&self, entries: Vec<(String, Arc<dyn LLMProvider>)>) -> HealthReport {
        let names: Vec<String> = entries.iter().map(|(name, _)| name.clone()).collect();

        let handles = entries
            .into_iter()
            .map(|(name, provider)| self.spawn_check(name, provider));

        let results = join_all(handles).await;

        names
            .into_iter()
            .zip(results)
            .map(|(name, result)| {
                let healthy = settle(&name, result);
                debug!(model = %name, healthy, "Health check complete");
                (name, healthy)
            })
            .collect()
    }

    fn spawn_check(&self, name: String, provider: Arc<dyn LLMProvider>) -> JoinHandle<bool> {
        let aggregator = *self;
        tokio::spawn(async move { aggregator.run_check(&name, provider).await })
    }

    async fn run_check(&self, name: &str, provider: Arc<dyn LLMProvider>) -> bool {
        let kind = provider.describe().provider;
        let healthy = match tokio::time::timeout(self.timeout, provider.health_check()).await {
            Ok(healthy) => healthy,
            Err(_) => {
                warn!(model = %name, "Health check timed out after {:?}", self.timeout);
                false
            }
        };

        counter!(
            "scriptorium_health_checks_total",
            "provider" => kind.as_str(),
            "healthy" => if healthy { "true" } else { "false" }
        )
        .increment(1);

        healthy
    }
}

fn settle(name: &str, result: Result<bool, JoinError>) -> bool {
    match result {
        Ok(healthy) => healthy,
        Err(e) => {
            warn!(model = %name, error = %e, "Health check task failed");
            false
        }
    }
}
