// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Presgen - AI Gift Idea Generation Core
//!
//! Builds gift-suggestion prompts from a recipient profile, parses the model's
//! answer, and keeps saved gifts, saved recipients and the current session in
//! a local key/value store. A small proxy service forwards chat completions
//! upstream so that credentials never leave the server.
//!
//! ## Modules
//!
//! - `api` - Proxy HTTP handlers (Axum)
//! - `models` - Recipient, suggestion and saved-gift types
//! - `prompt` - Prompt construction and completion parsing
//! - `providers` - Suggestion providers (proxy client, upstream client)
//! - `session` - Generation workflow state machine
//! - `storage` - Key/value persistence and registries (redb)

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod pricing;
pub mod prompt;
pub mod providers;
pub mod session;
pub mod state;
pub mod storage;
