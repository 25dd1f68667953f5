// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Whitelist façade over the on-chain allowlist.
//!
//! Reads go straight to the full node. Mutations are signed by the server's
//! admin key, so they are gated by [`AdminAuth`].

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::AdminAuth,
    error::{ApiError, Error},
    models::{
        AuthorizationResponse, AuthorizationStatus, WhitelistAction, WhitelistMembers,
        WhitelistMembersResponse, WhitelistMutationResponse, WhitelistRequest,
    },
    state::AppState,
    sui::{AccountId, Caller, ObjectId},
};

fn parse_policy(raw: &str) -> Result<ObjectId, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::bad_request(format!("Invalid encryption id: {e}")))
}

fn parse_account(raw: &str) -> Result<AccountId, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::bad_request(format!("Invalid wallet address: {e}")))
}

#[utoipa::path(
    post,
    path = "/whitelist",
    request_body = WhitelistRequest,
    tag = "Whitelist",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Transaction executed", body = WhitelistMutationResponse),
        (status = 400, description = "Malformed id or address"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Wrong bearer token"),
        (status = 502, description = "Transaction failed"),
        (status = 503, description = "Mutations disabled on this server")
    )
)]
pub async fn update_whitelist(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Json(request): Json<WhitelistRequest>,
) -> Result<Json<WhitelistMutationResponse>, ApiError> {
    let policy = parse_policy(&request.encryption_id)?;
    let account = parse_account(&request.wallet_address)?;

    if policy != state.config.policy_object_id {
        return Err(ApiError::bad_request(format!(
            "Encryption id {policy} is not managed by this server"
        )));
    }

    let signer = state.signer.as_deref().ok_or_else(|| {
        ApiError::unavailable("Allowlist mutations are disabled: no signer configured")
    })?;
    let admin_cap = state.config.admin_cap_id.ok_or_else(|| {
        ApiError::unavailable("Allowlist mutations are disabled: no admin capability configured")
    })?;

    tracing::info!(
        policy = %policy,
        account = %account,
        action = %request.action,
        "Whitelist update requested"
    );

    let result = match request.action {
        WhitelistAction::Add => {
            state
                .allowlist
                .add_address(signer, &policy, &admin_cap, &account)
                .await
        }
        WhitelistAction::Remove => {
            state
                .allowlist
                .remove_address(signer, &policy, &admin_cap, &account)
                .await
        }
    };
    let digest = result.map_err(Error::from)?;

    Ok(Json(WhitelistMutationResponse {
        success: true,
        tx_digest: Some(digest.to_string()),
        error: None,
    }))
}

#[utoipa::path(
    get,
    path = "/whitelist/{id}",
    params(
        ("id" = String, Path, description = "Policy Object id")
    ),
    tag = "Whitelist",
    responses(
        (status = 200, body = WhitelistMembersResponse),
        (status = 400, description = "Malformed id"),
        (status = 502, description = "Object missing or unreadable")
    )
)]
pub async fn list_whitelist(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WhitelistMembersResponse>, ApiError> {
    let policy = parse_policy(&id)?;
    let members = state.allowlist.members(&policy).await.map_err(Error::from)?;

    Ok(Json(WhitelistMembersResponse {
        success: true,
        data: Some(WhitelistMembers {
            whitelist: members.iter().map(AccountId::to_hex).collect(),
        }),
        error: None,
    }))
}

#[utoipa::path(
    get,
    path = "/whitelist/{id}/{address}",
    params(
        ("id" = String, Path, description = "Policy Object id"),
        ("address" = String, Path, description = "Account to check")
    ),
    tag = "Whitelist",
    responses(
        (status = 200, body = AuthorizationResponse),
        (status = 400, description = "Malformed id or address"),
        (status = 502, description = "Membership could not be determined")
    )
)]
pub async fn check_whitelist(
    Path((id, address)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<AuthorizationResponse>, ApiError> {
    let policy = parse_policy(&id)?;
    let caller = Caller::new(parse_account(&address)?);
    let authorized = state
        .allowlist
        .check_membership(&policy, &caller)
        .await
        .map_err(Error::from)?;

    Ok(Json(AuthorizationResponse {
        success: true,
        data: Some(AuthorizationStatus { authorized }),
        error: None,
    }))
}
