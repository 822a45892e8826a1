// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Upstream chat-completion client (OpenRouter-compatible).
//!
//! Used by the proxy only; it is the sole holder of the API key.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::config::GenerationConfig;
use crate::prompt::ChatMessage;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream configuration invalid: {0}")]
    Config(String),

    #[error("{0}")]
    Request(String),

    /// Non-2xx answer with the message extracted from its body.
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("upstream response was invalid: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Serialize)]
struct UpstreamRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    base_url: String,
    model: String,
    api_key: String,
    http: Client,
}

impl OpenRouterClient {
    pub fn new(config: &GenerationConfig, api_key: impl Into<String>) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| UpstreamError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: api_key.into(),
            http,
        })
    }

    /// Forward a completion request and return the upstream JSON as-is.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Value, UpstreamError> {
        let payload = UpstreamRequest {
            model: &self.model,
            messages,
            temperature,
            max_tokens,
        };

        info!(
            model = %self.model,
            messages = messages.len(),
            temperature,
            max_tokens,
            "Forwarding chat completion upstream"
        );

        let response = self
            .http
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: extract_error_message(status.as_u16(), &body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
    }
}

/// Best human-readable message from an upstream error body.
///
/// Prefers `error.message`, then a string `error`, then the raw text.
pub fn extract_error_message(status: u16, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(message) = json.pointer("/error/message").and_then(Value::as_str) {
            return message.to_string();
        }
        if let Some(message) = json.get("error").and_then(Value::as_str) {
            return message.to_string();
        }
    }

    if body.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        body.to_string()
    }
}
