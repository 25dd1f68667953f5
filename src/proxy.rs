// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client for the whitelist proxy.
//!
//! Used when the caller cannot sign transactions itself: the proxy holds the
//! admin key and applies changes on its behalf. Membership answers from the
//! proxy are fail-closed like the direct check.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::models::{
    AuthorizationResponse, WhitelistAction, WhitelistMembersResponse, WhitelistMutationResponse,
    WhitelistRequest,
};
use crate::storage::endpoints::base;
use crate::sui::{AccountId, Caller, ObjectId, TxDigest};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Proxy request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx answer or `success: false`.
    #[error("Proxy rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected proxy response: {0}")]
    InvalidResponse(String),
}

/// HTTP client of the proxy's `/whitelist` routes.
#[derive(Debug, Clone)]
pub struct WhitelistProxyClient {
    base: Url,
    http: reqwest::Client,
    token: Option<String>,
}

impl WhitelistProxyClient {
    pub fn new(base: Url, token: Option<String>) -> Result<Self, ProxyError> {
        let http = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self::with_http(base, http, token))
    }

    pub fn with_http(base: Url, http: reqwest::Client, token: Option<String>) -> Self {
        Self { base, http, token }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", base(&self.base), path)
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProxyError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or(body);
            return Err(ProxyError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_str(&body).map_err(|e| ProxyError::InvalidResponse(e.to_string()))
    }

    /// Apply `action` for `account` on `policy_object`.
    pub async fn update(
        &self,
        policy_object: &ObjectId,
        account: &AccountId,
        action: WhitelistAction,
    ) -> Result<TxDigest, ProxyError> {
        let body = WhitelistRequest {
            encryption_id: policy_object.to_hex(),
            wallet_address: account.to_hex(),
            action,
        };
        let mut request = self.http.post(self.url("/whitelist")).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response: WhitelistMutationResponse = Self::read(request.send().await?).await?;
        match response {
            WhitelistMutationResponse {
                success: true,
                tx_digest: Some(digest),
                ..
            } => {
                tracing::info!(
                    policy = %policy_object,
                    account = %account,
                    %action,
                    digest = %digest,
                    "Proxy applied whitelist change"
                );
                Ok(TxDigest(digest))
            }
            WhitelistMutationResponse { error, .. } => Err(ProxyError::Rejected {
                status: 200,
                message: error.unwrap_or_else(|| "no transaction digest returned".to_string()),
            }),
        }
    }

    pub async fn members(&self, policy_object: &ObjectId) -> Result<Vec<AccountId>, ProxyError> {
        let url = self.url(&format!("/whitelist/{}", policy_object.to_hex()));
        let response: WhitelistMembersResponse =
            Self::read(self.http.get(url).send().await?).await?;
        let data = match response {
            WhitelistMembersResponse {
                success: true,
                data: Some(data),
                ..
            } => data,
            WhitelistMembersResponse { error, .. } => {
                return Err(ProxyError::Rejected {
                    status: 200,
                    message: error.unwrap_or_default(),
                })
            }
        };
        data.whitelist
            .iter()
            .map(|a| a.parse().map_err(|e| ProxyError::InvalidResponse(format!("{a}: {e}"))))
            .collect()
    }

    /// Fail-closed membership check through the proxy.
    pub async fn is_authorized(&self, policy_object: &ObjectId, caller: &Caller) -> bool {
        let url = self.url(&format!(
            "/whitelist/{}/{}",
            policy_object.to_hex(),
            caller.account().to_hex()
        ));
        let response = match self.http.get(url).send().await {
            Ok(response) => Self::read::<AuthorizationResponse>(response).await,
            Err(e) => Err(e.into()),
        };
        match response {
            Ok(AuthorizationResponse {
                success: true,
                data: Some(status),
                ..
            }) => status.authorized,
            Ok(_) => {
                tracing::warn!(
                    policy = %policy_object,
                    "Proxy returned no membership answer, denying"
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    policy = %policy_object,
                    "Proxy membership check failed, denying"
                );
                false
            }
        }
    }
}
