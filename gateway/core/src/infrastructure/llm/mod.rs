// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each provider adapter translates between our domain interface and one
// backend's wire protocol. The factory, registry and health aggregator sit
// on top of the adapters.

pub mod anthropic;
pub mod discovery;
pub mod factory;
pub mod health;
pub mod huggingface;
pub mod llamacpp;
pub mod ollama;
pub mod openai;
pub mod registry;
pub mod textgen;

mod http;
mod prompt;

pub use discovery::{BackendStatus, DiscoveryReport, LocalProviderScanner};
pub use factory::AdapterFactory;
pub use health::{HealthAggregator, HealthReport};
pub use registry::ModelRegistry;
