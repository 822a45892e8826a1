// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Generation proxy endpoint.
//!
//! Forwards a chat-completion request to the upstream provider, adding the
//! model and credentials, and relays the answer or a descriptive error.

use axum::{body::Bytes, extract::State, Json};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use utoipa::ToSchema;

use crate::{
    config::API_KEY_ENV,
    error::{ApiError, ErrorBody},
    prompt::ChatMessage,
    providers::UpstreamError,
    state::AppState,
};

/// Body accepted by the proxy; sampling parameters fall back to defaults.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

#[utoipa::path(
    post,
    path = "/api/generate-gifts",
    request_body = GenerateRequest,
    tag = "Generation",
    responses(
        (status = 200, description = "Upstream chat completion, relayed as-is"),
        (status = 400, description = "Malformed request body", body = ErrorBody),
        (status = 401, description = "Upstream rejected the API key", body = ErrorBody),
        (status = 500, description = "Proxy misconfigured or upstream unreachable", body = ErrorBody)
    )
)]
pub async fn generate_gifts(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let Some(upstream) = state.upstream.as_ref() else {
        return Err(ApiError::internal("OpenRouter API key is not configured"));
    };

    let request: GenerateRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))?;

    let temperature = request
        .temperature
        .unwrap_or(state.generation.default_temperature);
    let max_tokens = request.max_tokens.unwrap_or(state.generation.max_tokens);

    match upstream
        .complete(&request.messages, temperature, max_tokens)
        .await
    {
        Ok(completion) => Ok(Json(completion)),
        Err(UpstreamError::Status { status: 401, message }) => {
            warn!("Upstream rejected API key");
            Err(ApiError::unauthorized(format!(
                "Invalid API key. Please check your {API_KEY_ENV} environment variable."
            ))
            .with_details(message))
        }
        Err(UpstreamError::Status { status, message }) => {
            warn!(status, message = %message, "Upstream returned an error");
            Err(ApiError::relayed(
                status,
                format!("OpenRouter API error: {message}"),
            ))
        }
        Err(e) => {
            warn!(error = %e, "Error calling upstream API");
            Err(ApiError::internal(e.to_string()))
        }
    }
}
