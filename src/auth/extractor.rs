// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for admin requests.
//!
//! ```rust,ignore
//! async fn my_handler(_admin: AdminAuth) -> impl IntoResponse {
//!     // only reached with a valid admin token
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::AuthError;
use crate::state::AppState;

/// Extractor that requires the admin bearer token.
///
/// ## Authentication Modes
///
/// - **Production mode** (`PROXY_ADMIN_TOKEN` set): the bearer token must match
/// - **Development mode** (no token): every request passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminAuth {
    /// True when no admin token is configured
    pub development: bool,
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_ref() else {
            tracing::warn!("PROXY_ADMIN_TOKEN not set, accepting unauthenticated mutation");
            return Ok(AdminAuth { development: true });
        };

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        if !expected.matches(token.trim()) {
            return Err(AuthError::InvalidToken);
        }

        Ok(AdminAuth { development: false })
    }
}
