// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! External chat-completion providers.
//!
//! - [`proxy`] - client-side access to the same-origin generation proxy
//! - [`openrouter`] - upstream client used by the proxy itself

use async_trait::async_trait;
use serde_json::Value;

use crate::prompt::{ChatRequest, GenerationError};

pub mod openrouter;
pub mod proxy;

pub use openrouter::{OpenRouterClient, UpstreamError};
pub use proxy::ProxyClient;

/// Source of chat completions for the generation session.
///
/// Returns the raw completion body; validation belongs to
/// [`crate::prompt::parse_completion`].
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<Value, GenerationError>;
}
