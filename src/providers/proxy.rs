// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client for the same-origin generation proxy.
//!
//! No timeout is configured here; the HTTP client defaults apply.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::SuggestionProvider;
use crate::config::GENERATE_PATH;
use crate::prompt::{ChatRequest, GenerationError};

#[derive(Debug, Clone)]
pub struct ProxyClient {
    endpoint: Url,
    http: Client,
}

impl ProxyClient {
    pub fn new(endpoint: Url, http: Client) -> Self {
        Self { endpoint, http }
    }

    /// Client for the proxy served at `base_url` (e.g. `http://127.0.0.1:3000`).
    pub fn for_base_url(base_url: &str) -> Result<Self, url::ParseError> {
        let endpoint = Url::parse(base_url)?.join(GENERATE_PATH)?;
        Ok(Self::new(endpoint, Client::new()))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SuggestionProvider for ProxyClient {
    async fn complete(&self, request: &ChatRequest) -> Result<Value, GenerationError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), &body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|_| GenerationError::InvalidFormat)
    }
}

/// Relayed `{"error": "..."}` message, or the bare status.
fn error_from_body(status: u16, body: &str) -> GenerationError {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .filter(|message| !message.trim().is_empty())
        .map(GenerationError::Upstream)
        .unwrap_or(GenerationError::Http { status })
}
