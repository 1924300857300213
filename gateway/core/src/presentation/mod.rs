// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`scriptorium-core`)
//!
//! HTTP surface that translates external requests into registry calls.
//! No generation logic lives here.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Models CRUD, generation, health and local discovery |

pub mod api;

pub use api::router;
