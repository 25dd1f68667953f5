// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sui integration.
//!
//! This module provides functionality for:
//! - Object and account identifiers
//! - Encoding single Move calls as programmable transactions
//! - Read-only dev-inspect calls and transaction submission over JSON-RPC
//! - The wallet seam used for state-changing calls

pub mod client;
pub mod signing;
pub mod transaction;
pub mod types;

pub use client::{DevInspectResults, SuiClient, SuiClientError, SuiObjectData};
pub use signing::{KeypairSigner, SignerError, TransactionSigner};
pub use transaction::{CallArgument, MoveCall, ObjectArg, TransactionKind};
pub use types::*;
