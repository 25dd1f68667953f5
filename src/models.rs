// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the whitelist proxy. They are shared by
//! the server ([`crate::api`]) and the client ([`crate::proxy`]), so both
//! sides agree on the wire format by construction.
//!
//! Every response carries a `success` flag; failures add an `error` string.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Requested allowlist change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WhitelistAction {
    Add,
    Remove,
}

impl std::fmt::Display for WhitelistAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WhitelistAction::Add => f.write_str("add"),
            WhitelistAction::Remove => f.write_str("remove"),
        }
    }
}

/// Body of `POST /whitelist`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct WhitelistRequest {
    /// Policy Object id the change applies to
    pub encryption_id: String,
    /// Account to add or remove
    pub wallet_address: String,
    pub action: WhitelistAction,
}

/// Response of `POST /whitelist`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct WhitelistMutationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Member list of a Policy Object.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct WhitelistMembers {
    pub whitelist: Vec<String>,
}

/// Response of `GET /whitelist/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct WhitelistMembersResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<WhitelistMembers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AuthorizationStatus {
    pub authorized: bool,
}

/// Response of `GET /whitelist/{id}/{address}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AuthorizationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
