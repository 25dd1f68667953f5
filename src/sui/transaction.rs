// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Move call description and programmable-transaction encoding.
//!
//! A [`MoveCall`] is the network-agnostic description of a single contract
//! call. It is turned into either:
//!
//! - BCS `TransactionKind` bytes for read-only dev-inspect calls and for the
//!   approval transaction handed to the key servers, or
//! - JSON arguments for `unsafe_moveCall`, which lets the full node fill in
//!   gas and object references for state-changing calls.
//!
//! The serde types below mirror the Sui binary layout; enum variant order is
//! significant because BCS encodes the variant index.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::types::{AccountId, ObjectId};

/// One argument of a Move call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArgument {
    /// An on-chain object passed by reference.
    Object(ObjectId),
    /// A pure `address` value.
    Address(AccountId),
    /// A pure `vector<u8>` value.
    Bytes(Vec<u8>),
    /// A pure `0x1::string::String` value.
    String(String),
    /// A pure `u64` value.
    U64(u64),
}

/// A single Move function call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub arguments: Vec<CallArgument>,
}

impl MoveCall {
    pub fn new(package: ObjectId, module: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            package,
            module: module.into(),
            function: function.into(),
            arguments: Vec::new(),
        }
    }

    pub fn arg(mut self, argument: CallArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Fully qualified target, e.g. `0x..::simple_whitelist::is_whitelisted`.
    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }

    /// Object ids referenced by this call, in argument order.
    pub fn object_ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.arguments.iter().filter_map(|arg| match arg {
            CallArgument::Object(id) => Some(id),
            _ => None,
        })
    }

    /// Arguments in the JSON form accepted by `unsafe_moveCall`.
    pub fn json_arguments(&self) -> Vec<Value> {
        self.arguments
            .iter()
            .map(|arg| match arg {
                CallArgument::Object(id) => json!(id.to_hex()),
                CallArgument::Address(addr) => json!(addr.to_hex()),
                CallArgument::Bytes(bytes) => json!(bytes),
                CallArgument::String(value) => json!(value),
                // u64 travels as a decimal string in Sui JSON
                CallArgument::U64(value) => json!(value.to_string()),
            })
            .collect()
    }

    /// Encode as a one-command programmable transaction.
    ///
    /// `resolve` supplies the input form of every object argument (for shared
    /// objects this carries the initial shared version).
    pub fn to_transaction_kind<F>(
        &self,
        mut resolve: F,
    ) -> Result<TransactionKind, TransactionBuildError>
    where
        F: FnMut(&ObjectId) -> Option<ObjectArg>,
    {
        let mut inputs = Vec::with_capacity(self.arguments.len());
        let mut arguments = Vec::with_capacity(self.arguments.len());

        for (index, argument) in self.arguments.iter().enumerate() {
            let input = match argument {
                CallArgument::Object(id) => CallArg::Object(
                    resolve(id).ok_or(TransactionBuildError::UnresolvedObject(*id))?,
                ),
                CallArgument::Address(addr) => CallArg::Pure(encode_pure(addr)?),
                CallArgument::Bytes(bytes) => CallArg::Pure(encode_pure(bytes)?),
                CallArgument::String(value) => CallArg::Pure(encode_pure(value)?),
                CallArgument::U64(value) => CallArg::Pure(encode_pure(value)?),
            };
            inputs.push(input);
            let index =
                u16::try_from(index).map_err(|_| TransactionBuildError::TooManyArguments)?;
            arguments.push(Argument::Input(index));
        }

        Ok(TransactionKind::ProgrammableTransaction(ProgrammableTransaction {
            inputs,
            commands: vec![Command::MoveCall(Box::new(ProgrammableMoveCall {
                package: self.package,
                module: self.module.clone(),
                function: self.function.clone(),
                type_arguments: Vec::new(),
                arguments,
            }))],
        }))
    }
}

fn encode_pure<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, TransactionBuildError> {
    bcs::to_bytes(value).map_err(|e| TransactionBuildError::Encoding(e.to_string()))
}

/// Errors raised while encoding a transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionBuildError {
    #[error("Object {0} could not be resolved to a transaction input")]
    UnresolvedObject(ObjectId),

    #[error("Too many call arguments")]
    TooManyArguments,

    #[error("BCS encoding failed: {0}")]
    Encoding(String),
}

/// Transaction kind; only programmable transactions are produced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    ProgrammableTransaction(ProgrammableTransaction),
}

impl TransactionKind {
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransactionBuildError> {
        bcs::to_bytes(self).map_err(|e| TransactionBuildError::Encoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionBuildError> {
        bcs::from_bytes(bytes).map_err(|e| TransactionBuildError::Encoding(e.to_string()))
    }

    pub fn programmable(&self) -> &ProgrammableTransaction {
        match self {
            TransactionKind::ProgrammableTransaction(pt) => pt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammableTransaction {
    pub inputs: Vec<CallArg>,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallArg {
    Pure(Vec<u8>),
    Object(ObjectArg),
}

/// `(id, version, digest)`
pub type ObjectRef = (ObjectId, u64, Vec<u8>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectArg {
    ImmOrOwnedObject(ObjectRef),
    SharedObject {
        id: ObjectId,
        initial_shared_version: u64,
        mutable: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    MoveCall(Box<ProgrammableMoveCall>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammableMoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<TypeTag>,
    pub arguments: Vec<Argument>,
}

/// Primitive type tags. The allowlist entry points are not generic, so this
/// never carries struct or vector tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Argument {
    GasCoin,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}
