// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access policy identifiers.
//!
//! A policy id binds one encrypted payload to the Policy Object that governs
//! its decryption: `policy object id (32 bytes) || nonce (5 bytes)`, hex
//! encoded without a `0x` prefix. The prefix is always recoverable, so the
//! authorization check can locate the Policy Object from the id alone.

use std::fmt;
use std::str::FromStr;

use ring::rand::{SecureRandom, SystemRandom};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::sui::{ObjectId, ID_LENGTH};

/// Length of the per-payload nonce.
pub const NONCE_LENGTH: usize = 5;

/// Errors produced when building or parsing a policy id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyIdError {
    #[error("Policy id must be at least {min} bytes, got {got}")]
    TooShort { min: usize, got: usize },

    #[error("Policy id is not valid hex: {0}")]
    InvalidHex(String),

    #[error("Random source failure")]
    Randomness,
}

/// Identifier tying an encrypted payload to its Policy Object.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PolicyId {
    bytes: Vec<u8>,
}

impl PolicyId {
    /// Generate a fresh id under `policy_object` using the system CSPRNG.
    pub fn generate(policy_object: &ObjectId) -> Result<Self, PolicyIdError> {
        Self::generate_with(policy_object, &SystemRandom::new())
    }

    pub fn generate_with(
        policy_object: &ObjectId,
        rng: &dyn SecureRandom,
    ) -> Result<Self, PolicyIdError> {
        let mut nonce = [0u8; NONCE_LENGTH];
        rng.fill(&mut nonce).map_err(|_| PolicyIdError::Randomness)?;
        Ok(derive_policy_id(policy_object, &nonce))
    }

    /// Parse from raw bytes. Anything at least as long as an object id is
    /// accepted so ids minted with a different nonce length still resolve.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PolicyIdError> {
        if bytes.len() < ID_LENGTH {
            return Err(PolicyIdError::TooShort {
                min: ID_LENGTH,
                got: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }

    pub fn from_hex(raw: &str) -> Result<Self, PolicyIdError> {
        let digits = raw.trim();
        let digits = digits.strip_prefix("0x").unwrap_or(digits);
        let bytes = hex::decode(digits).map_err(|e| PolicyIdError::InvalidHex(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex without `0x`.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// The governing Policy Object.
    pub fn policy_object(&self) -> ObjectId {
        let mut prefix = [0u8; ID_LENGTH];
        prefix.copy_from_slice(&self.bytes[..ID_LENGTH]);
        ObjectId::new(prefix)
    }

    pub fn nonce(&self) -> &[u8] {
        &self.bytes[ID_LENGTH..]
    }

    pub fn is_governed_by(&self, policy_object: &ObjectId) -> bool {
        self.bytes.starts_with(policy_object.as_bytes())
    }
}

/// Concatenate the Policy Object id with nonce bytes.
pub fn derive_policy_id(policy_object: &ObjectId, nonce: &[u8]) -> PolicyId {
    let mut bytes = Vec::with_capacity(ID_LENGTH + nonce.len());
    bytes.extend_from_slice(policy_object.as_bytes());
    bytes.extend_from_slice(nonce);
    PolicyId { bytes }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PolicyId({})", self.to_hex())
    }
}

impl FromStr for PolicyId {
    type Err = PolicyIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for PolicyId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PolicyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(de::Error::custom)
    }
}
