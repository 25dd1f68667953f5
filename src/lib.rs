// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Document Vault - allowlist-gated document protection on Sui and Walrus
//!
//! Documents are encrypted under a policy id bound to an on-chain allowlist
//! object, published to Walrus with publisher failover, and decrypted only
//! after the caller passes the allowlist check. The binary serves a
//! whitelist proxy for clients that cannot sign transactions themselves.
//!
//! ## Modules
//!
//! - `allowlist` - Membership checks, mutations and approval transactions
//! - `api` - Whitelist proxy HTTP handlers (Axum)
//! - `auth` - Admin bearer token for proxy mutations
//! - `envelope` - Encryption/decryption envelope over a threshold cipher
//! - `nft` - Document ownership NFTs
//! - `policy` - Access policy identifiers
//! - `proxy` - Client of the whitelist proxy
//! - `storage` - Walrus publishers, aggregators and endpoint failover
//! - `sui` - Sui JSON-RPC client, BCS transactions and signing
//! - `vault` - Protect and retrieve documents end to end

pub mod allowlist;
pub mod api;
pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod models;
pub mod nft;
pub mod policy;
pub mod proxy;
pub mod state;
pub mod storage;
pub mod sui;
pub mod vault;

// Lets the shared test fakes name this crate the same way from both sides.
#[cfg(test)]
extern crate self as document_vault;

#[cfg(test)]
mod testing;

pub use error::Error;
