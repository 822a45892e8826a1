// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::GENERATE_PATH,
    error::ErrorBody,
    models::GiftSuggestion,
    prompt::{ChatMessage, Role},
    state::AppState,
};

pub mod generate;
pub mod health;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route(GENERATE_PATH, post(generate::generate_gifts))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        generate::generate_gifts,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            generate::GenerateRequest,
            ChatMessage,
            Role,
            GiftSuggestion,
            ErrorBody,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Generation", description = "Gift suggestion generation proxy"),
        (name = "Health", description = "Service health probes")
    )
)]
struct ApiDoc;
