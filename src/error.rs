// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error types.
//!
//! [`Error`] is the crate-level taxonomy returned by the document workflow;
//! [`ApiError`] is what HTTP handlers render.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::allowlist::AllowlistError;
use crate::config::ConfigError;
use crate::envelope::{CipherError, EnvelopeError};
use crate::nft::NftError;
use crate::policy::PolicyIdError;
use crate::storage::{EndpointError, FetchError, StoreError};
use crate::sui::{AccountId, ObjectId, SignerError, SuiClientError};

/// Every failure a document operation can surface.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No healthy endpoint in a pool.
    #[error("No storage endpoint available: {0}")]
    EndpointUnavailable(#[from] EndpointError),

    /// Publish rejected after the retry.
    #[error("Upload failed: {0}")]
    Store(#[from] StoreError),

    #[error("Download failed: {0}")]
    Fetch(#[from] FetchError),

    /// Caller is not on the allowlist. Never retried.
    #[error("Account {account} is not authorized to decrypt under policy {policy_object}")]
    Authorization {
        account: AccountId,
        policy_object: ObjectId,
    },

    #[error("Encryption failed: {0}")]
    Encryption(#[source] CipherError),

    /// Key servers rejected the approval or returned too few shares.
    #[error("Decryption failed: {0}")]
    Decryption(#[source] CipherError),

    /// Wallet rejected or failed to submit a transaction.
    #[error("Transaction failed: {0}")]
    Transaction(#[from] SignerError),

    #[error("Invalid policy id: {0}")]
    PolicyId(#[from] PolicyIdError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sui RPC error: {0}")]
    Rpc(#[from] SuiClientError),

    #[error("Allowlist error: {0}")]
    Allowlist(#[source] AllowlistError),

    #[error("Document NFT error: {0}")]
    Nft(#[source] NftError),
}

impl From<EnvelopeError> for Error {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Unauthorized {
                account,
                policy_object,
            } => Error::Authorization {
                account,
                policy_object,
            },
            EnvelopeError::Approval(e) => Error::from(e),
            EnvelopeError::Encryption(e) => Error::Encryption(e),
            EnvelopeError::Decryption(e) => Error::Decryption(e),
        }
    }
}

impl From<AllowlistError> for Error {
    fn from(err: AllowlistError) -> Self {
        match err {
            AllowlistError::Rpc(e) => Error::Rpc(e),
            AllowlistError::Transaction(e) => Error::Transaction(e),
            other => Error::Allowlist(other),
        }
    }
}

impl From<NftError> for Error {
    fn from(err: NftError) -> Self {
        match err {
            NftError::Rpc(e) => Error::Rpc(e),
            NftError::Transaction(e) => Error::Transaction(e),
            other => Error::Nft(other),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Authorization { .. } => StatusCode::FORBIDDEN,
            Error::PolicyId(_) => StatusCode::BAD_REQUEST,
            Error::Fetch(FetchError::InvalidBlobId(_)) => StatusCode::BAD_REQUEST,
            Error::Fetch(FetchError::Rejected { status: 404, .. }) => StatusCode::NOT_FOUND,
            Error::EndpointUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Decryption(_) | Error::Encryption(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Store(_)
            | Error::Fetch(_)
            | Error::Transaction(_)
            | Error::Rpc(_)
            | Error::Allowlist(_)
            | Error::Nft(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            success: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
