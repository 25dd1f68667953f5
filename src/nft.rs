// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Document NFTs
//!
//! After a document is stored, a `DocumentNFT` can be minted to its owner
//! as proof of ownership. The NFT records the blob id, the file's name,
//! type and size, and the on-chain clock at mint time.
//!
//! Minting goes through a [`TransactionSigner`], like allowlist mutations.
//! Owned NFTs are listed with `suix_getOwnedObjects` filtered on the
//! `DocumentNFT` struct type.

use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;
use crate::sui::client::value_as_u64;
use crate::sui::{
    AccountId, CallArgument, MoveCall, ObjectId, SignerError, SuiClient, SuiClientError,
    SuiObjectData, TransactionSigner, TxDigest,
};
use crate::vault::ProtectedDocument;

/// Testnet deployment of the document NFT package.
pub const DEFAULT_NFT_PACKAGE: &str =
    "0x8e7ff481c57b84777c58f9003a7aabb90205f5329f547e8bd564adc52f91a387";
pub const NFT_MODULE: &str = "document_nft";
pub const NFT_STRUCT: &str = "DocumentNFT";
const MINT_AND_TRANSFER: &str = "mint_and_transfer_nft";

/// The shared `0x6` clock object.
pub const CLOCK_OBJECT_ID: ObjectId = ObjectId::new({
    let mut bytes = [0u8; 32];
    bytes[31] = 0x06;
    bytes
});

#[derive(Debug, thiserror::Error)]
pub enum NftError {
    #[error("Sui RPC failed: {0}")]
    Rpc(#[from] SuiClientError),

    #[error("Mint transaction failed: {0}")]
    Transaction(#[from] SignerError),

    #[error("Object {id} is not a document NFT: {reason}")]
    NotADocumentNft { id: ObjectId, reason: String },
}

/// What gets minted, and for whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    /// Receives the NFT
    pub owner: AccountId,
    /// SuiNS name shown instead of the owner's address
    pub display_name: Option<String>,
    pub blob_id: String,
    pub file_name: String,
    pub content_type: String,
    /// Plaintext size in bytes
    pub size: u64,
}

impl MintRequest {
    /// Request for the document behind `receipt`, minted to `owner`.
    pub fn for_document(receipt: &ProtectedDocument, owner: AccountId) -> Self {
        Self {
            owner,
            display_name: None,
            blob_id: receipt.blob_id.clone(),
            file_name: receipt.name.clone(),
            content_type: receipt.content_type.clone(),
            size: receipt.document_size,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// SuiNS name when known, the owner's address otherwise.
    pub fn display_address(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| self.owner.to_hex())
    }

    pub fn nft_name(&self) -> String {
        format!("Document: {}", self.file_name)
    }

    pub fn nft_description(&self) -> String {
        format!(
            "Verified document uploaded to Walrus storage by {}. \
             This NFT serves as proof of ownership and verification timestamp.",
            self.display_address()
        )
    }
}

/// A `DocumentNFT` read back from chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNftRecord {
    pub id: ObjectId,
    /// Address or SuiNS name recorded at mint time
    pub wallet_address: String,
    pub blob_id: String,
    pub name: String,
    pub description: String,
    pub doc_type: String,
    pub doc_size: u64,
    /// Clock milliseconds at mint time
    pub timestamp: Option<u64>,
}

impl DocumentNftRecord {
    pub fn from_object(object: &SuiObjectData) -> Result<Self, NftError> {
        let id = object.object_id;
        let invalid = |reason: &str| NftError::NotADocumentNft {
            id,
            reason: reason.to_string(),
        };
        if let Some(object_type) = &object.object_type {
            if !object_type.ends_with(&format!("::{NFT_MODULE}::{NFT_STRUCT}")) {
                return Err(invalid(object_type));
            }
        }
        let fields = object.fields().ok_or_else(|| invalid("no content"))?;
        let text = |name: &str| -> Result<String, NftError> {
            fields
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| invalid(&format!("missing field {name}")))
        };

        Ok(Self {
            id,
            wallet_address: text("wallet_address")?,
            blob_id: text("blob_id")?,
            name: text("name")?,
            description: text("description")?,
            doc_type: text("doc_type")?,
            doc_size: fields
                .get("doc_size")
                .and_then(value_as_u64)
                .ok_or_else(|| invalid("missing field doc_size"))?,
            timestamp: fields.get("timestamp").and_then(value_as_u64),
        })
    }
}

/// Client of the `document_nft` Move module.
pub struct DocumentNft {
    sui: Arc<SuiClient>,
    package: ObjectId,
    module: String,
}

impl DocumentNft {
    pub fn new(sui: Arc<SuiClient>, package: ObjectId) -> Self {
        Self {
            sui,
            package,
            module: NFT_MODULE.to_string(),
        }
    }

    pub fn from_config(config: &Config, sui: Arc<SuiClient>) -> Self {
        Self::new(sui, config.nft_package_id)
    }

    pub fn package(&self) -> &ObjectId {
        &self.package
    }

    /// Fully qualified `DocumentNFT` type used to filter owned objects.
    pub fn struct_type(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, NFT_STRUCT)
    }

    /// `mint_and_transfer_nft(wallet_address, blob_id, clock, name,
    /// description, doc_type, doc_size, recipient)`
    pub fn mint_call(&self, request: &MintRequest) -> MoveCall {
        MoveCall::new(self.package, self.module.as_str(), MINT_AND_TRANSFER)
            .arg(CallArgument::String(request.display_address()))
            .arg(CallArgument::String(request.blob_id.clone()))
            .arg(CallArgument::Object(CLOCK_OBJECT_ID))
            .arg(CallArgument::String(request.nft_name()))
            .arg(CallArgument::String(request.nft_description()))
            .arg(CallArgument::String(request.content_type.clone()))
            .arg(CallArgument::U64(request.size))
            .arg(CallArgument::Address(request.owner))
    }

    /// Mint an NFT for `request` and transfer it to the owner.
    pub async fn mint(
        &self,
        signer: &dyn TransactionSigner,
        request: &MintRequest,
    ) -> Result<TxDigest, NftError> {
        let call = self.mint_call(request);
        let digest = signer.sign_and_execute(&call).await.inspect_err(|e| {
            tracing::error!(error = %e, blob_id = %request.blob_id, "Failed to mint document NFT");
        })?;
        tracing::info!(
            blob_id = %request.blob_id,
            owner = %request.owner,
            digest = %digest,
            "Document NFT minted"
        );
        Ok(digest)
    }

    /// Every document NFT held by `owner`. Objects that do not decode as
    /// document NFTs are skipped.
    pub async fn owned_by(&self, owner: &AccountId) -> Result<Vec<DocumentNftRecord>, NftError> {
        let objects = self
            .sui
            .get_owned_objects(owner, &self.struct_type())
            .await?;
        Ok(objects
            .iter()
            .filter_map(|object| match DocumentNftRecord::from_object(object) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(error = %e, owner = %owner, "Skipping owned object");
                    None
                }
            })
            .collect())
    }

    pub async fn details(&self, id: &ObjectId) -> Result<DocumentNftRecord, NftError> {
        let object = self.sui.get_object(id, false, true).await?;
        DocumentNftRecord::from_object(&object)
    }
}
