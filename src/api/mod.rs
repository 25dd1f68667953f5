// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        AuthorizationResponse, AuthorizationStatus, WhitelistAction, WhitelistMembers,
        WhitelistMembersResponse, WhitelistMutationResponse, WhitelistRequest,
    },
    state::AppState,
};

pub mod health;
pub mod whitelist;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/whitelist", post(whitelist::update_whitelist))
        .route("/whitelist/{id}", get(whitelist::list_whitelist))
        .route("/whitelist/{id}/{address}", get(whitelist::check_whitelist))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        whitelist::update_whitelist,
        whitelist::list_whitelist,
        whitelist::check_whitelist
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            WhitelistAction,
            WhitelistRequest,
            WhitelistMutationResponse,
            WhitelistMembers,
            WhitelistMembersResponse,
            AuthorizationStatus,
            AuthorizationResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Whitelist", description = "Allowlist membership and administration")
    )
)]
pub struct ApiDoc;
