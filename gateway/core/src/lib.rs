// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Scriptorium core
//!
//! One normalized generation contract over six text-generation backends.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Adapters, adapter factory, model registry, health fan-out and the models API

pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
