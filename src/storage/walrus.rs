// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Walrus content store client.
//!
//! - `publish`: `PUT {publisher}/v1/blobs?epochs=N`. A failed attempt
//!   triggers an endpoint search and exactly one retry on the result.
//! - `fetch`: `GET {aggregator}/v1/blobs/{blob_id}`, failing over across the
//!   aggregator pool starting at the selected one.
//!
//! Both return the pool they ended up using so callers can thread it into
//! the next call.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use super::endpoints::{
    base, find_working_endpoint, EndpointPool, Probe, PublisherProbe, DEFAULT_PROBE_TIMEOUT,
};
use crate::sui::{ObjectId, TxDigest};

/// Smallest storage duration accepted by publishers.
pub const MIN_EPOCHS: u32 = 1;

/// Longest storage duration accepted by publishers.
pub const MAX_EPOCHS: u32 = 53;

pub const DEFAULT_EPOCHS: u32 = 5;

/// Response body text kept in errors is truncated to this many bytes.
const MAX_ERROR_BODY: usize = 512;

/// Tunables for [`ContentStore`].
#[derive(Debug, Clone, Copy)]
pub struct StoreSettings {
    pub epochs: u32,
    pub probe_timeout: Duration,
    pub publish_timeout: Duration,
    pub fetch_timeout: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            publish_timeout: Duration::from_secs(120),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

/// Errors from publishing a blob.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Publisher {endpoint} rejected the blob with HTTP {status}: {body}")]
    Rejected { endpoint: String, status: u16, body: String },

    #[error("Publisher {endpoint} unreachable: {message}")]
    Transport { endpoint: String, message: String },

    #[error("Publisher {endpoint} returned an unrecognized response: {message}")]
    InvalidResponse { endpoint: String, message: String },
}

impl StoreError {
    /// Whether switching publisher might help.
    fn is_retryable(&self) -> bool {
        !matches!(self, StoreError::InvalidResponse { .. })
    }
}

/// Errors from fetching a blob.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid blob id: {0:?}")]
    InvalidBlobId(String),

    #[error("Aggregator {endpoint} returned HTTP {status} for blob {blob_id}: {body}")]
    Rejected {
        endpoint: String,
        blob_id: String,
        status: u16,
        body: String,
    },

    #[error("Aggregator {endpoint} unreachable: {message}")]
    Transport { endpoint: String, message: String },
}

/// Publisher response: `{"newlyCreated": {...}}` or `{"alreadyCertified": {...}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StoreResponse {
    NewlyCreated {
        blob_object: BlobObject,
        #[serde(default)]
        cost: Option<u64>,
    },
    AlreadyCertified {
        blob_id: String,
        #[serde(default)]
        event: Option<EventRef>,
        #[serde(default)]
        end_epoch: Option<u64>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobObject {
    pub id: ObjectId,
    pub blob_id: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRef {
    pub tx_digest: TxDigest,
}

/// How the storage network confirmed the blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// A new blob object was registered on Sui.
    NewlyCreated { blob_object: ObjectId, cost: Option<u64> },
    /// The content was already stored and certified.
    AlreadyCertified { tx_digest: Option<TxDigest>, end_epoch: Option<u64> },
}

impl Confirmation {
    /// Sui reference: blob object id or certification tx digest.
    pub fn sui_ref(&self) -> Option<String> {
        match self {
            Confirmation::NewlyCreated { blob_object, .. } => Some(blob_object.to_hex()),
            Confirmation::AlreadyCertified { tx_digest, .. } => {
                tx_digest.as_ref().map(|d| d.0.clone())
            }
        }
    }
}

/// A successfully published blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub blob_id: String,
    /// Uploaded length in bytes
    pub size: u64,
    pub confirmation: Confirmation,
}

impl StoredBlob {
    fn from_response(response: StoreResponse, size: u64) -> Self {
        match response {
            StoreResponse::NewlyCreated { blob_object, cost } => Self {
                blob_id: blob_object.blob_id,
                size,
                confirmation: Confirmation::NewlyCreated {
                    blob_object: blob_object.id,
                    cost,
                },
            },
            StoreResponse::AlreadyCertified {
                blob_id,
                event,
                end_epoch,
            } => Self {
                blob_id,
                size,
                confirmation: Confirmation::AlreadyCertified {
                    tx_digest: event.map(|e| e.tx_digest),
                    end_epoch,
                },
            },
        }
    }
}

/// Result of [`ContentStore::publish`].
#[derive(Debug, Clone)]
pub struct Published {
    pub blob: StoredBlob,
    /// Publisher pool after the call; its selection is the publisher used
    pub publishers: EndpointPool,
}

/// Result of [`ContentStore::fetch`].
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    /// Aggregator pool after the call; its selection is the aggregator used
    pub aggregators: EndpointPool,
}

/// HTTP client for Walrus publishers and aggregators.
pub struct ContentStore {
    http: reqwest::Client,
    probe: Arc<dyn Probe>,
    settings: StoreSettings,
}

impl ContentStore {
    pub fn new(http: reqwest::Client, settings: StoreSettings) -> Self {
        let probe = Arc::new(PublisherProbe::new(http.clone(), settings.probe_timeout));
        Self { http, probe, settings }
    }

    /// Replace the publisher probe.
    pub fn with_probe(mut self, probe: Arc<dyn Probe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Store `data` for `epochs` (the configured default when `None`).
    ///
    /// Epochs are clamped to `MIN_EPOCHS..=MAX_EPOCHS`.
    pub async fn publish(
        &self,
        publishers: &EndpointPool,
        data: &[u8],
        epochs: Option<u32>,
    ) -> Result<Published, StoreError> {
        let epochs = epochs.unwrap_or(self.settings.epochs).clamp(MIN_EPOCHS, MAX_EPOCHS);

        let first = match self.put_blob(publishers.selected(), data, epochs).await {
            Ok(blob) => {
                return Ok(Published {
                    blob,
                    publishers: publishers.clone(),
                })
            }
            Err(e) if e.is_retryable() => e,
            Err(e) => return Err(e),
        };

        tracing::warn!(
            error = %first,
            endpoint = %publishers.selected(),
            "Publish failed, searching for a working publisher"
        );

        let resolution = find_working_endpoint(publishers, self.probe.as_ref()).await;
        let blob = self
            .put_blob(resolution.pool.selected(), data, epochs)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    endpoint = %resolution.pool.selected(),
                    attempt = 2,
                    "Publish failed"
                );
            })?;

        Ok(Published {
            blob,
            publishers: resolution.pool,
        })
    }

    async fn put_blob(
        &self,
        publisher: &url::Url,
        data: &[u8],
        epochs: u32,
    ) -> Result<StoredBlob, StoreError> {
        let url = format!("{}/v1/blobs?epochs={}", base(publisher), epochs);
        let endpoint = publisher.to_string();

        tracing::debug!(endpoint = %endpoint, size = data.len(), epochs, "Publishing blob");

        let response = self
            .http
            .put(&url)
            .body(data.to_vec())
            .timeout(self.settings.publish_timeout)
            .send()
            .await
            .map_err(|e| StoreError::Transport {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                endpoint,
                status: status.as_u16(),
                body: truncate(body),
            });
        }

        let parsed: StoreResponse = response.json().await.map_err(|e| StoreError::InvalidResponse {
            endpoint: endpoint.clone(),
            message: e.to_string(),
        })?;
        let blob = StoredBlob::from_response(parsed, data.len() as u64);

        tracing::info!(
            endpoint = %endpoint,
            blob_id = %blob.blob_id,
            size = blob.size,
            "Blob published"
        );
        Ok(blob)
    }

    /// Download `blob_id`, trying each aggregator once starting at the
    /// selected one. Returns the last error when all fail.
    pub async fn fetch(
        &self,
        aggregators: &EndpointPool,
        blob_id: &str,
    ) -> Result<Fetched, FetchError> {
        validate_blob_id(blob_id)?;

        let mut last_error = None;
        for index in aggregators.failover_order() {
            let aggregator = &aggregators.candidates()[index];
            match self.get_blob(aggregator, blob_id).await {
                Ok(bytes) => {
                    return Ok(Fetched {
                        bytes,
                        aggregators: aggregators.select(index),
                    })
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        endpoint = %aggregator,
                        blob_id,
                        "Fetch failed, trying next aggregator"
                    );
                    last_error = Some(e);
                }
            }
        }

        // Pools are never empty, so at least one attempt was made
        Err(last_error.unwrap_or_else(|| FetchError::InvalidBlobId(blob_id.to_string())))
    }

    async fn get_blob(&self, aggregator: &url::Url, blob_id: &str) -> Result<Vec<u8>, FetchError> {
        let url = format!("{}/v1/blobs/{}", base(aggregator), blob_id);
        let endpoint = aggregator.to_string();

        let response = self
            .http
            .get(&url)
            .timeout(self.settings.fetch_timeout)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Rejected {
                endpoint,
                blob_id: blob_id.to_string(),
                status: status.as_u16(),
                body: truncate(body),
            });
        }

        let bytes = response.bytes().await.map_err(|e| FetchError::Transport {
            endpoint: endpoint.clone(),
            message: e.to_string(),
        })?;

        tracing::debug!(endpoint = %endpoint, blob_id, size = bytes.len(), "Blob fetched");
        Ok(bytes.to_vec())
    }

    /// Direct download link on the selected aggregator.
    pub fn blob_url(&self, aggregators: &EndpointPool, blob_id: &str) -> String {
        format!("{}/v1/blobs/{}", base(aggregators.selected()), blob_id)
    }
}

/// Blob ids are URL-safe base64 without padding.
fn validate_blob_id(blob_id: &str) -> Result<(), FetchError> {
    let valid = !blob_id.is_empty()
        && blob_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(FetchError::InvalidBlobId(blob_id.to_string()))
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}
