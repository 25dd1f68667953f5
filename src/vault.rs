// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Document Vault
//!
//! End-to-end document workflow tying the pieces together:
//!
//! - **protect**: derive a fresh policy id, encrypt, publish
//! - **retrieve**: check the allowlist, fetch, decrypt
//!
//! The receipt keeps the document's name and content type so a
//! [`DocumentNft`](crate::nft::DocumentNft) can be minted for it afterwards.
//!
//! Retrieval always checks authorization before touching storage, so a
//! denied caller causes no fetch and no key-share request.
//!
//! Endpoint pools are passed in and handed back inside the results; the
//! vault itself holds no endpoint selection.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::allowlist::AccessPolicy;
use crate::config::Config;
use crate::envelope::{Envelope, ThresholdCipher};
use crate::error::Error;
use crate::policy::PolicyId;
use crate::storage::{ContentStore, EndpointPool};
use crate::sui::{Caller, ObjectId};

/// How a document is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protection {
    /// Encrypted under a fresh policy id.
    #[default]
    Encrypted,
    /// Stored as-is. Retrieval is still allowlist-gated, but anyone holding
    /// the blob id can read it straight from an aggregator.
    Plain,
}

/// A document handed to [`DocumentVault::protect`].
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    /// File name, e.g. `report.pdf`
    pub name: &'a str,
    /// MIME type, e.g. `application/pdf`
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

impl<'a> Document<'a> {
    pub fn new(name: &'a str, content_type: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            name,
            content_type,
            bytes,
        }
    }
}

/// Receipt returned by [`DocumentVault::protect`].
///
/// Everything needed to retrieve the document later; keep it next to
/// whatever references the document.
#[derive(Debug, Clone)]
pub struct ProtectedDocument {
    pub blob_id: String,
    pub name: String,
    pub content_type: String,
    /// Plaintext size in bytes
    pub document_size: u64,
    /// Present for encrypted documents only
    pub policy_id: Option<PolicyId>,
    pub policy_object: ObjectId,
    pub package: ObjectId,
    /// Blob object id, or certification digest for already stored content
    pub sui_ref: Option<String>,
    /// Stored size in bytes (ciphertext size when encrypted)
    pub size: u64,
    pub created_at: DateTime<Utc>,
    /// Publisher pool after the upload
    pub publishers: EndpointPool,
}

impl ProtectedDocument {
    pub fn protection(&self) -> Protection {
        if self.policy_id.is_some() {
            Protection::Encrypted
        } else {
            Protection::Plain
        }
    }
}

/// Plaintext returned by [`DocumentVault::retrieve`].
#[derive(Debug, Clone)]
pub struct Retrieved {
    pub bytes: Vec<u8>,
    /// Aggregator pool after the download
    pub aggregators: EndpointPool,
}

pub struct DocumentVault {
    store: ContentStore,
    envelope: Envelope,
    policy: Arc<dyn AccessPolicy>,
    policy_object: ObjectId,
}

impl DocumentVault {
    pub fn new(
        store: ContentStore,
        policy: Arc<dyn AccessPolicy>,
        cipher: Arc<dyn ThresholdCipher>,
        package: ObjectId,
        policy_object: ObjectId,
        threshold: u8,
    ) -> Self {
        let envelope = Envelope::new(policy.clone(), cipher, package, threshold);
        Self {
            store,
            envelope,
            policy,
            policy_object,
        }
    }

    /// Build from configuration, sharing `http` for all storage calls.
    pub fn from_config(
        config: &Config,
        http: reqwest::Client,
        policy: Arc<dyn AccessPolicy>,
        cipher: Arc<dyn ThresholdCipher>,
    ) -> Self {
        Self::new(
            ContentStore::new(http, config.store_settings()),
            policy,
            cipher,
            config.package_id,
            config.policy_object_id,
            config.threshold,
        )
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn policy_object(&self) -> &ObjectId {
        &self.policy_object
    }

    /// Store `document` under this vault's Policy Object.
    pub async fn protect(
        &self,
        publishers: &EndpointPool,
        document: Document<'_>,
        protection: Protection,
    ) -> Result<ProtectedDocument, Error> {
        let (payload, policy_id) = match protection {
            Protection::Encrypted => {
                let policy_id = PolicyId::generate(&self.policy_object)?;
                let encrypted = self.envelope.encrypt(document.bytes, &policy_id).await?;
                (encrypted.ciphertext, Some(policy_id))
            }
            Protection::Plain => (document.bytes.to_vec(), None),
        };

        let published = self.store.publish(publishers, &payload, None).await?;

        tracing::info!(
            blob_id = %published.blob.blob_id,
            name = document.name,
            policy = %self.policy_object,
            encrypted = policy_id.is_some(),
            size = published.blob.size,
            "Document protected"
        );

        Ok(ProtectedDocument {
            blob_id: published.blob.blob_id.clone(),
            name: document.name.to_string(),
            content_type: document.content_type.to_string(),
            document_size: document.bytes.len() as u64,
            policy_id,
            policy_object: self.policy_object,
            package: *self.envelope.package(),
            sui_ref: published.blob.confirmation.sui_ref(),
            size: published.blob.size,
            created_at: Utc::now(),
            publishers: published.publishers,
        })
    }

    /// Fetch and, when encrypted, decrypt a document for `caller`.
    pub async fn retrieve(
        &self,
        aggregators: &EndpointPool,
        receipt: &ProtectedDocument,
        caller: &Caller,
    ) -> Result<Retrieved, Error> {
        match &receipt.policy_id {
            Some(policy_id) => {
                let authorization = self.envelope.authorize(policy_id, caller).await?;
                let fetched = self.store.fetch(aggregators, &receipt.blob_id).await?;
                let bytes = self
                    .envelope
                    .decrypt_authorized(&fetched.bytes, &authorization)
                    .await?;
                tracing::info!(
                    blob_id = %receipt.blob_id,
                    account = %caller.account(),
                    "Document decrypted"
                );
                Ok(Retrieved {
                    bytes,
                    aggregators: fetched.aggregators,
                })
            }
            None => {
                if !self.policy.is_authorized(&receipt.policy_object, caller).await {
                    tracing::info!(
                        account = %caller.account(),
                        policy = %receipt.policy_object,
                        "Retrieval denied"
                    );
                    return Err(Error::Authorization {
                        account: *caller.account(),
                        policy_object: receipt.policy_object,
                    });
                }
                let fetched = self.store.fetch(aggregators, &receipt.blob_id).await?;
                Ok(Retrieved {
                    bytes: fetched.bytes,
                    aggregators: fetched.aggregators,
                })
            }
        }
    }

    /// Direct aggregator link for the stored blob.
    pub fn blob_url(&self, aggregators: &EndpointPool, receipt: &ProtectedDocument) -> String {
        self.store.blob_url(aggregators, &receipt.blob_id)
    }
}
