// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sui full-node JSON-RPC client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use url::Url;

use super::transaction::{MoveCall, ObjectArg, TransactionBuildError, TransactionKind};
use super::types::{AccountId, ObjectId, TxDigest};

/// Default timeout for a single JSON-RPC request.
const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Sui JSON-RPC client.
pub struct SuiClient {
    /// Full-node endpoint
    rpc_url: Url,
    /// HTTP client
    http: reqwest::Client,
    /// JSON-RPC request id counter
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    #[serde(default = "Option::default")]
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Object as returned by `sui_getObject`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiObjectData {
    pub object_id: ObjectId,
    pub version: Value,
    #[serde(default)]
    pub digest: Option<String>,
    /// Move type, present when `showType` was requested
    #[serde(default, rename = "type")]
    pub object_type: Option<String>,
    #[serde(default)]
    pub owner: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
}

impl SuiObjectData {
    /// Initial shared version when the object is shared.
    pub fn initial_shared_version(&self) -> Option<u64> {
        self.owner
            .as_ref()?
            .pointer("/Shared/initial_shared_version")
            .and_then(value_as_u64)
    }

    /// Move struct fields when content was requested.
    pub fn fields(&self) -> Option<&Value> {
        self.content.as_ref()?.get("fields")
    }
}

#[derive(Deserialize)]
struct SuiObjectResponse {
    #[serde(default)]
    data: Option<SuiObjectData>,
    #[serde(default)]
    error: Option<Value>,
}

/// One page of `suix_getOwnedObjects`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnedObjectsPage {
    #[serde(default)]
    data: Vec<SuiObjectResponse>,
    #[serde(default)]
    next_cursor: Option<Value>,
    #[serde(default)]
    has_next_page: bool,
}

/// Result of `sui_devInspectTransactionBlock`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevInspectResults {
    #[serde(default)]
    pub results: Option<Vec<SuiExecutionResult>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Per-command outcome of a dev-inspect call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiExecutionResult {
    /// `(bcs bytes, type tag)` for each returned value
    #[serde(default)]
    pub return_values: Vec<(Vec<u8>, String)>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionBlockBytes {
    tx_bytes: String,
}

/// Result of `sui_executeTransactionBlock`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionResponse {
    pub digest: TxDigest,
    #[serde(default)]
    pub effects: Option<Value>,
}

impl ExecutionResponse {
    /// Effect status; `Ok` on success, the abort message otherwise.
    pub fn status(&self) -> Result<(), String> {
        let status = self
            .effects
            .as_ref()
            .and_then(|e| e.pointer("/status/status"))
            .and_then(Value::as_str);
        match status {
            Some("success") => Ok(()),
            Some(_) => Err(self
                .effects
                .as_ref()
                .and_then(|e| e.pointer("/status/error"))
                .and_then(Value::as_str)
                .unwrap_or("transaction failed")
                .to_string()),
            None => Err("transaction effects missing".to_string()),
        }
    }
}

pub(crate) fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

impl SuiClient {
    /// Create a client for the given full-node endpoint.
    pub fn new(rpc_url: Url) -> Result<Self, SuiClientError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_RPC_TIMEOUT)
            .build()
            .map_err(|e| SuiClientError::Http(e.to_string()))?;
        Ok(Self::with_http(rpc_url, http))
    }

    /// Create a client sharing an existing HTTP client.
    pub fn with_http(rpc_url: Url, http: reqwest::Client) -> Self {
        Self {
            rpc_url,
            http,
            next_id: AtomicU64::new(1),
        }
    }

    /// Get the RPC endpoint.
    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, SuiClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!(method, id, "Sui RPC request");

        let response = self
            .http
            .post(self.rpc_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| SuiClientError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SuiClientError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                self.rpc_url
            )));
        }

        let envelope: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| SuiClientError::InvalidResponse(e.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(SuiClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        envelope
            .result
            .ok_or_else(|| SuiClientError::InvalidResponse(format!("{method}: missing result")))
    }

    /// Read an object, optionally with its owner and Move content.
    pub async fn get_object(
        &self,
        id: &ObjectId,
        show_owner: bool,
        show_content: bool,
    ) -> Result<SuiObjectData, SuiClientError> {
        let response: SuiObjectResponse = self
            .call(
                "sui_getObject",
                json!([
                    id.to_hex(),
                    {
                        "showOwner": show_owner,
                        "showContent": show_content,
                        "showType": show_content
                    }
                ]),
            )
            .await?;

        match (response.data, response.error) {
            (Some(data), _) => Ok(data),
            (None, Some(error)) => Err(SuiClientError::ObjectNotFound(format!("{id}: {error}"))),
            (None, None) => Err(SuiClientError::ObjectNotFound(id.to_string())),
        }
    }

    /// Objects of `struct_type` owned by `owner`, with type and content.
    /// Follows the cursor until the last page.
    pub async fn get_owned_objects(
        &self,
        owner: &AccountId,
        struct_type: &str,
    ) -> Result<Vec<SuiObjectData>, SuiClientError> {
        let query = json!({
            "filter": { "StructType": struct_type },
            "options": { "showContent": true, "showType": true, "showDisplay": true }
        });
        let mut objects = Vec::new();
        let mut cursor = Value::Null;
        loop {
            let page: OwnedObjectsPage = self
                .call(
                    "suix_getOwnedObjects",
                    json!([owner.to_hex(), query, cursor, Value::Null]),
                )
                .await?;
            objects.extend(page.data.into_iter().filter_map(|entry| entry.data));
            match page.next_cursor {
                Some(next) if page.has_next_page && !next.is_null() => cursor = next,
                _ => break,
            }
        }
        Ok(objects)
    }

    /// Resolve a shared object into a transaction input.
    pub async fn shared_object_arg(
        &self,
        id: &ObjectId,
        mutable: bool,
    ) -> Result<ObjectArg, SuiClientError> {
        let data = self.get_object(id, true, false).await?;
        let initial_shared_version = data.initial_shared_version().ok_or_else(|| {
            SuiClientError::UnsupportedObject(format!("{id} is not a shared object"))
        })?;
        Ok(ObjectArg::SharedObject {
            id: *id,
            initial_shared_version,
            mutable,
        })
    }

    /// Run a transaction kind without committing it.
    pub async fn dev_inspect(
        &self,
        sender: &AccountId,
        kind: &TransactionKind,
    ) -> Result<DevInspectResults, SuiClientError> {
        let tx_bytes = BASE64.encode(kind.to_bytes()?);
        self.call(
            "sui_devInspectTransactionBlock",
            json!([sender.to_hex(), tx_bytes, Value::Null, Value::Null]),
        )
        .await
    }

    /// Have the full node build an unsigned transaction for a single Move
    /// call. Returns the base64 `TransactionData` bytes.
    pub async fn unsafe_move_call(
        &self,
        signer: &AccountId,
        call: &MoveCall,
        gas_budget: u64,
    ) -> Result<String, SuiClientError> {
        let built: TransactionBlockBytes = self
            .call(
                "unsafe_moveCall",
                json!([
                    signer.to_hex(),
                    call.package.to_hex(),
                    call.module,
                    call.function,
                    [],
                    call.json_arguments(),
                    Value::Null,
                    gas_budget.to_string(),
                ]),
            )
            .await?;
        Ok(built.tx_bytes)
    }

    /// Submit a signed transaction and wait for local execution.
    pub async fn execute_transaction(
        &self,
        tx_bytes: &str,
        signature: &str,
    ) -> Result<ExecutionResponse, SuiClientError> {
        self.call(
            "sui_executeTransactionBlock",
            json!([
                tx_bytes,
                [signature],
                { "showEffects": true },
                "WaitForLocalExecution"
            ]),
        )
        .await
    }

    /// Get the latest checkpoint sequence number.
    pub async fn latest_checkpoint(&self) -> Result<u64, SuiClientError> {
        let value: Value = self
            .call("sui_getLatestCheckpointSequenceNumber", json!([]))
            .await?;
        value_as_u64(&value)
            .ok_or_else(|| SuiClientError::InvalidResponse(format!("bad checkpoint: {value}")))
    }
}

/// Errors that can occur while talking to a Sui full node.
#[derive(Debug, thiserror::Error)]
pub enum SuiClientError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Unsupported object: {0}")]
    UnsupportedObject(String),

    #[error("Transaction encoding failed: {0}")]
    Build(#[from] TransactionBuildError),
}
