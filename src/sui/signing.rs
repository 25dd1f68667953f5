// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction signing.
//!
//! [`TransactionSigner`] is the wallet seam: anything that can sign and
//! submit a Move call on behalf of an address. Browser wallets implement it
//! on the front-end side; [`KeypairSigner`] implements it for the whitelist
//! proxy server, which holds an admin key.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use blake2::{digest::consts::U32, Blake2b, Digest};
use ed25519_dalek::{Signer, SigningKey};

use super::client::{SuiClient, SuiClientError};
use super::transaction::MoveCall;
use super::types::{AccountId, TxDigest};

type Blake2b256 = Blake2b<U32>;

/// Signature scheme flag for Ed25519.
const ED25519_FLAG: u8 = 0x00;

/// Intent prefix for transaction data: scope, version, app id.
const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

/// Signs and submits Move calls for one address.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Address the signer acts as.
    fn address(&self) -> AccountId;

    /// Sign, submit and wait for the transaction. Failures are returned
    /// verbatim; nothing is retried.
    async fn sign_and_execute(&self, call: &MoveCall) -> Result<TxDigest, SignerError>;
}

/// Errors from signing or submitting a transaction.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Transaction {digest} failed: {message}")]
    Failed { digest: TxDigest, message: String },

    #[error(transparent)]
    Rpc(#[from] SuiClientError),
}

/// Ed25519 keypair signer talking to a full node.
pub struct KeypairSigner {
    key: SigningKey,
    address: AccountId,
    client: Arc<SuiClient>,
    gas_budget: u64,
}

impl KeypairSigner {
    pub fn new(key: SigningKey, client: Arc<SuiClient>, gas_budget: u64) -> Self {
        let address = derive_address(&key);
        Self {
            key,
            address,
            client,
            gas_budget,
        }
    }

    /// Parse a key in Sui keystore form (base64 of `flag || 32 bytes`) or as
    /// 32 raw bytes in hex.
    pub fn from_encoded(
        encoded: &str,
        client: Arc<SuiClient>,
        gas_budget: u64,
    ) -> Result<Self, SignerError> {
        Ok(Self::new(parse_signing_key(encoded)?, client, gas_budget))
    }

    /// Serialized signature over transaction bytes: base64 of
    /// `flag || signature || public key`.
    pub fn sign_transaction(&self, tx_bytes: &[u8]) -> String {
        let mut hasher = Blake2b256::new();
        hasher.update(TRANSACTION_INTENT);
        hasher.update(tx_bytes);
        let digest = hasher.finalize();

        let signature = self.key.sign(&digest);

        let mut serialized = Vec::with_capacity(1 + 64 + 32);
        serialized.push(ED25519_FLAG);
        serialized.extend_from_slice(&signature.to_bytes());
        serialized.extend_from_slice(self.key.verifying_key().as_bytes());
        BASE64.encode(serialized)
    }
}

#[async_trait]
impl TransactionSigner for KeypairSigner {
    fn address(&self) -> AccountId {
        self.address
    }

    async fn sign_and_execute(&self, call: &MoveCall) -> Result<TxDigest, SignerError> {
        let tx_bytes = self
            .client
            .unsafe_move_call(&self.address, call, self.gas_budget)
            .await
            .map_err(|e| match e {
                SuiClientError::Rpc { message, .. } => SignerError::Rejected(message),
                other => SignerError::Rpc(other),
            })?;

        let raw = BASE64
            .decode(&tx_bytes)
            .map_err(|e| {
                SignerError::Rejected(format!("full node returned invalid tx bytes: {e}"))
            })?;
        let signature = self.sign_transaction(&raw);

        let response = self
            .client
            .execute_transaction(&tx_bytes, &signature)
            .await
            .map_err(|e| match e {
                SuiClientError::Rpc { message, .. } => SignerError::Rejected(message),
                other => SignerError::Rpc(other),
            })?;

        match response.status() {
            Ok(()) => {
                tracing::info!(
                    digest = %response.digest,
                    target = %call.target(),
                    "Transaction executed"
                );
                Ok(response.digest)
            }
            Err(message) => Err(SignerError::Failed {
                digest: response.digest,
                message,
            }),
        }
    }
}

/// Sui address of an Ed25519 key: `blake2b256(flag || public key)`.
pub fn derive_address(key: &SigningKey) -> AccountId {
    let mut hasher = Blake2b256::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(key.verifying_key().as_bytes());
    AccountId::new(hasher.finalize().into())
}

fn parse_signing_key(encoded: &str) -> Result<SigningKey, SignerError> {
    let trimmed = encoded.trim();
    let hex_digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    let secret: [u8; 32] = if hex_digits.len() == 64 {
        let mut out = [0u8; 32];
        hex::decode_to_slice(hex_digits, &mut out)
            .map_err(|e| SignerError::InvalidKey(format!("Invalid hex: {e}")))?;
        out
    } else {
        let raw = BASE64
            .decode(trimmed)
            .map_err(|e| SignerError::InvalidKey(format!("Invalid base64: {e}")))?;
        match raw.split_first() {
            Some((&ED25519_FLAG, rest)) if rest.len() == 32 => {
                <[u8; 32]>::try_from(rest)
                    .map_err(|_| SignerError::InvalidKey("bad length".into()))?
            }
            Some((flag, _)) if raw.len() == 33 => {
                return Err(SignerError::InvalidKey(format!(
                    "Unsupported signature scheme flag {flag:#04x}"
                )))
            }
            _ => {
                return Err(SignerError::InvalidKey(format!(
                    "Expected 33 bytes (flag || key), got {}",
                    raw.len()
                )))
            }
        }
    };

    Ok(SigningKey::from_bytes(&secret))
}
