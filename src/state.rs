// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::{GenerationConfig, ProxyConfig};
use crate::providers::{OpenRouterClient, UpstreamError};

/// Shared state of the proxy service.
#[derive(Clone)]
pub struct AppState {
    pub generation: Arc<GenerationConfig>,
    /// `None` when no API key is configured.
    pub upstream: Option<Arc<OpenRouterClient>>,
}

impl AppState {
    pub fn new(generation: GenerationConfig, upstream: Option<OpenRouterClient>) -> Self {
        Self {
            generation: Arc::new(generation),
            upstream: upstream.map(Arc::new),
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Result<Self, UpstreamError> {
        let upstream = config
            .api_key
            .as_deref()
            .map(|key| OpenRouterClient::new(&config.generation, key))
            .transpose()?;
        Ok(Self::new(config.generation.clone(), upstream))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(GenerationConfig::default(), None)
    }
}
