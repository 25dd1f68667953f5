// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sui identifiers, caller identity and network constants.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Length in bytes of Sui object ids and account addresses.
pub const ID_LENGTH: usize = 32;

/// Errors produced when parsing a hex identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier has {0} hex digits, at most 64 are allowed")]
    TooLong(usize),

    #[error("identifier is not valid hex: {0}")]
    InvalidHex(String),
}

/// Parse a hex identifier, accepting an optional `0x` prefix and left-padding
/// short forms such as `0x2` the way Sui addresses are normalised.
fn parse_id(raw: &str) -> Result<[u8; ID_LENGTH], IdParseError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(IdParseError::Empty);
    }
    if digits.len() > ID_LENGTH * 2 {
        return Err(IdParseError::TooLong(digits.len()));
    }

    let padded = format!("{:0>width$}", digits, width = ID_LENGTH * 2);
    let mut out = [0u8; ID_LENGTH];
    hex::decode_to_slice(&padded, &mut out)
        .map_err(|e| IdParseError::InvalidHex(e.to_string()))?;
    Ok(out)
}

/// Defines a 32-byte Sui identifier.
///
/// Human-readable formats (JSON) see a `0x`-prefixed hex string; binary
/// formats (BCS) see the raw 32 bytes with no length prefix.
macro_rules! sui_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; ID_LENGTH]);

        impl $name {
            pub const fn new(bytes: [u8; ID_LENGTH]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
                &self.0
            }

            /// Build from a slice that must be exactly 32 bytes long.
            pub fn from_slice(bytes: &[u8]) -> Option<Self> {
                <[u8; ID_LENGTH]>::try_from(bytes).ok().map(Self)
            }

            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_id(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&self.to_hex())
                } else {
                    self.0.serialize(serializer)
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                if deserializer.is_human_readable() {
                    let raw = String::deserialize(deserializer)?;
                    raw.parse().map_err(de::Error::custom)
                } else {
                    <[u8; ID_LENGTH]>::deserialize(deserializer).map(Self)
                }
            }
        }
    };
}

sui_id!(
    /// On-chain object id (package, Policy Object, admin capability).
    ObjectId
);

sui_id!(
    /// Wallet address. Used both as the caller identity for allowlist checks
    /// and as the subject added to or removed from a Policy Object.
    AccountId
);

/// Transaction digest returned after a transaction is executed (base58).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxDigest(pub String);

impl fmt::Display for TxDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of whoever is asking for access.
///
/// Passed explicitly into every operation that needs a caller identity so
/// that checks can run against any simulated account without a live wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    account: AccountId,
}

impl Caller {
    pub fn new(account: AccountId) -> Self {
        Self { account }
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }
}

/// Sui network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Full-node JSON-RPC endpoint
    pub rpc_url: &'static str,
    /// Block explorer base URL
    pub explorer_url: &'static str,
}

/// Sui mainnet configuration.
pub const SUI_MAINNET: NetworkConfig = NetworkConfig {
    name: "Sui Mainnet",
    rpc_url: "https://fullnode.mainnet.sui.io:443",
    explorer_url: "https://suiscan.xyz/mainnet",
};

/// Sui testnet configuration.
pub const SUI_TESTNET: NetworkConfig = NetworkConfig {
    name: "Sui Testnet",
    rpc_url: "https://fullnode.testnet.sui.io:443",
    explorer_url: "https://suiscan.xyz/testnet",
};

impl NetworkConfig {
    /// Explorer link for an object.
    pub fn object_url(&self, id: &ObjectId) -> String {
        format!("{}/object/{}", self.explorer_url, id)
    }

    /// Explorer link for a transaction.
    pub fn tx_url(&self, digest: &TxDigest) -> String {
        format!("{}/tx/{}", self.explorer_url, digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = "0x1549b2b36e25f8b157b70571586bd3f7013111e8495adb3e0f4a70a0255d4e48";

    #[test]
    fn parses_full_and_short_ids() {
        let full: ObjectId = POLICY.parse().unwrap();
        assert_eq!(full.to_string(), POLICY);

        let no_prefix: ObjectId = POLICY.trim_start_matches("0x").parse().unwrap();
        assert_eq!(full, no_prefix);

        let short: AccountId = "0x2".parse().unwrap();
        assert_eq!(short.as_bytes()[31], 2);
        assert!(short.as_bytes()[..31].iter().all(|b| *b == 0));
    }

    #[test]
    fn rejects_bad_ids() {
        assert_eq!("0x".parse::<ObjectId>(), Err(IdParseError::Empty));
        assert!(matches!(
            format!("{POLICY}00").parse::<ObjectId>(),
            Err(IdParseError::TooLong(66))
        ));
        assert!(matches!(
            "0xzz".parse::<ObjectId>(),
            Err(IdParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn json_uses_hex_and_bcs_uses_raw_bytes() {
        let id: ObjectId = POLICY.parse().unwrap();

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{POLICY}\""));
        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let raw = bcs::to_bytes(&id).unwrap();
        assert_eq!(raw.len(), ID_LENGTH);
        assert_eq!(&raw[..], id.as_bytes());
    }

    #[test]
    fn explorer_links() {
        let id: ObjectId = POLICY.parse().unwrap();
        assert_eq!(
            SUI_TESTNET.object_url(&id),
            format!("https://suiscan.xyz/testnet/object/{POLICY}")
        );
        assert_eq!(
            SUI_TESTNET.tx_url(&TxDigest("abc".into())),
            "https://suiscan.xyz/testnet/tx/abc"
        );
    }
}
