// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Allowlist authorization.
//!
//! Membership is checked with a read-only dev-inspect call to
//! `<module>::is_whitelisted(&Whitelist, address)` executed with the caller as
//! sender. The boolean return value is decoded strictly by
//! [`decode_bool_return`]; only [`AllowlistClient::is_authorized`] collapses
//! decode or network failures into `false`.
//!
//! Mutations (`add_to_whitelist` / `remove_from_whitelist`) need the admin
//! capability and are signed by a [`TransactionSigner`]. They are never
//! retried here.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::policy::PolicyId;
use crate::sui::{
    AccountId, CallArgument, Caller, DevInspectResults, MoveCall, ObjectArg, ObjectId, SignerError,
    SuiClient, SuiClientError, TransactionKind, TransactionSigner, TxDigest,
};

const IS_WHITELISTED: &str = "is_whitelisted";
const ADD_TO_WHITELIST: &str = "add_to_whitelist";
const REMOVE_FROM_WHITELIST: &str = "remove_from_whitelist";
const SEAL_APPROVE: &str = "seal_approve";

/// Errors that can occur while decoding a dev-inspect boolean.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Simulated call failed: {0}")]
    ExecutionFailed(String),

    #[error("Simulated call returned no results")]
    NoResults,

    #[error("Simulated call returned no value")]
    NoReturnValue,

    #[error("Expected a bool return value, got {0}")]
    UnexpectedType(String),

    #[error("Expected a 1-byte bool, got {0} bytes")]
    InvalidLength(usize),
}

/// Errors from allowlist reads and mutations.
#[derive(Debug, thiserror::Error)]
pub enum AllowlistError {
    #[error(transparent)]
    Rpc(#[from] SuiClientError),

    #[error("Could not decode membership result: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Transaction(#[from] SignerError),

    #[error("Policy object {0} has no readable member list")]
    UnreadableMembers(ObjectId),
}

/// Decode the first return value of the first command as a Move `bool`.
///
/// Any non-zero byte is `true`.
pub fn decode_bool_return(results: &DevInspectResults) -> Result<bool, DecodeError> {
    if let Some(error) = &results.error {
        return Err(DecodeError::ExecutionFailed(error.clone()));
    }

    let first = results
        .results
        .as_ref()
        .and_then(|r| r.first())
        .ok_or(DecodeError::NoResults)?;
    let (bytes, type_tag) = first.return_values.first().ok_or(DecodeError::NoReturnValue)?;

    if type_tag != "bool" {
        return Err(DecodeError::UnexpectedType(type_tag.clone()));
    }

    match bytes.as_slice() {
        [flag] => Ok(*flag != 0),
        other => Err(DecodeError::InvalidLength(other.len())),
    }
}

/// The `seal_approve` call presented to the key servers as proof of access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalTransaction {
    pub call: MoveCall,
    /// BCS `TransactionKind` bytes (no gas data, no sender)
    pub kind_bytes: Vec<u8>,
}

impl ApprovalTransaction {
    /// Build `seal_approve(id, &Whitelist)` for `policy_id`. `whitelist` is
    /// the resolved input of the governing Policy Object.
    pub fn build(
        package: ObjectId,
        module: &str,
        policy_id: &PolicyId,
        whitelist: ObjectArg,
    ) -> Result<Self, SuiClientError> {
        let call = MoveCall::new(package, module, SEAL_APPROVE)
            .arg(CallArgument::Bytes(policy_id.as_bytes().to_vec()))
            .arg(CallArgument::Object(policy_id.policy_object()));
        let kind_bytes = call.to_transaction_kind(|_| Some(whitelist.clone()))?.to_bytes()?;
        Ok(Self { call, kind_bytes })
    }
}

/// An authority that decides who may decrypt under a Policy Object.
#[async_trait]
pub trait AccessPolicy: Send + Sync {
    /// Fail-closed membership check.
    async fn is_authorized(&self, policy_object: &ObjectId, caller: &Caller) -> bool;

    /// Approval transaction for the key servers.
    async fn approval_transaction(
        &self,
        policy_id: &PolicyId,
    ) -> Result<ApprovalTransaction, AllowlistError>;
}

/// On-chain allowlist client.
pub struct AllowlistClient {
    sui: Arc<SuiClient>,
    package: ObjectId,
    module: String,
    /// Initial shared versions never change, so they are cached forever
    shared_versions: RwLock<HashMap<ObjectId, u64>>,
}

impl AllowlistClient {
    pub fn new(sui: Arc<SuiClient>, package: ObjectId, module: impl Into<String>) -> Self {
        Self {
            sui,
            package,
            module: module.into(),
            shared_versions: RwLock::new(HashMap::new()),
        }
    }

    pub fn package(&self) -> &ObjectId {
        &self.package
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    async fn shared_object(
        &self,
        id: &ObjectId,
        mutable: bool,
    ) -> Result<ObjectArg, SuiClientError> {
        if let Some(version) = self.shared_versions.read().await.get(id).copied() {
            return Ok(ObjectArg::SharedObject {
                id: *id,
                initial_shared_version: version,
                mutable,
            });
        }

        let arg = self.sui.shared_object_arg(id, mutable).await?;
        if let ObjectArg::SharedObject {
            initial_shared_version,
            ..
        } = &arg
        {
            self.shared_versions
                .write()
                .await
                .insert(*id, *initial_shared_version);
        }
        Ok(arg)
    }

    /// Membership check with errors preserved.
    pub async fn check_membership(
        &self,
        policy_object: &ObjectId,
        caller: &Caller,
    ) -> Result<bool, AllowlistError> {
        let call = MoveCall::new(self.package, self.module.as_str(), IS_WHITELISTED)
            .arg(CallArgument::Object(*policy_object))
            .arg(CallArgument::Address(*caller.account()));

        let whitelist = self.shared_object(policy_object, false).await?;
        let kind: TransactionKind = call
            .to_transaction_kind(|_| Some(whitelist.clone()))
            .map_err(SuiClientError::from)?;

        let results = self.sui.dev_inspect(caller.account(), &kind).await?;
        Ok(decode_bool_return(&results)?)
    }

    /// Whether `caller` may decrypt under `policy_object`. Never fails: any
    /// network or decode error is logged and treated as not authorized.
    pub async fn is_authorized(&self, policy_object: &ObjectId, caller: &Caller) -> bool {
        match self.check_membership(policy_object, caller).await {
            Ok(authorized) => {
                tracing::debug!(
                    policy = %policy_object,
                    account = %caller.account(),
                    authorized,
                    "Allowlist check"
                );
                authorized
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    policy = %policy_object,
                    account = %caller.account(),
                    "Allowlist check failed, denying access"
                );
                false
            }
        }
    }

    fn mutation(
        &self,
        function: &str,
        policy_object: &ObjectId,
        admin_cap: &ObjectId,
        account: &AccountId,
    ) -> MoveCall {
        MoveCall::new(self.package, self.module.as_str(), function)
            .arg(CallArgument::Object(*policy_object))
            .arg(CallArgument::Object(*admin_cap))
            .arg(CallArgument::Address(*account))
    }

    /// Add `account` to the Policy Object. The signer must own `admin_cap`.
    pub async fn add_address(
        &self,
        signer: &dyn TransactionSigner,
        policy_object: &ObjectId,
        admin_cap: &ObjectId,
        account: &AccountId,
    ) -> Result<TxDigest, AllowlistError> {
        let call = self.mutation(ADD_TO_WHITELIST, policy_object, admin_cap, account);
        let digest = signer.sign_and_execute(&call).await.inspect_err(|e| {
            tracing::error!(
                error = %e,
                policy = %policy_object,
                account = %account,
                "Failed to add address"
            );
        })?;
        tracing::info!(
            policy = %policy_object,
            account = %account,
            digest = %digest,
            "Address added to allowlist"
        );
        Ok(digest)
    }

    /// Remove `account` from the Policy Object. The signer must own `admin_cap`.
    pub async fn remove_address(
        &self,
        signer: &dyn TransactionSigner,
        policy_object: &ObjectId,
        admin_cap: &ObjectId,
        account: &AccountId,
    ) -> Result<TxDigest, AllowlistError> {
        let call = self.mutation(REMOVE_FROM_WHITELIST, policy_object, admin_cap, account);
        let digest = signer.sign_and_execute(&call).await.inspect_err(|e| {
            tracing::error!(
                error = %e,
                policy = %policy_object,
                account = %account,
                "Failed to remove address"
            );
        })?;
        tracing::info!(
            policy = %policy_object,
            account = %account,
            digest = %digest,
            "Address removed from allowlist"
        );
        Ok(digest)
    }

    /// Current members, read from the object's `whitelisted` field.
    pub async fn members(
        &self,
        policy_object: &ObjectId,
    ) -> Result<Vec<AccountId>, AllowlistError> {
        let data = self.sui.get_object(policy_object, false, true).await?;
        let whitelisted = data
            .fields()
            .and_then(|f| f.get("whitelisted"))
            .ok_or(AllowlistError::UnreadableMembers(*policy_object))?;
        parse_members(whitelisted).ok_or(AllowlistError::UnreadableMembers(*policy_object))
    }

    /// Build the approval transaction for `policy_id`.
    pub async fn approval_transaction(
        &self,
        policy_id: &PolicyId,
    ) -> Result<ApprovalTransaction, AllowlistError> {
        let whitelist = self.shared_object(&policy_id.policy_object(), false).await?;
        Ok(ApprovalTransaction::build(
            self.package,
            &self.module,
            policy_id,
            whitelist,
        )?)
    }
}

/// Accepts `vector<address>` (`["0x..", ..]`) and `VecSet<address>`
/// (`{"fields": {"contents": [..]}}`).
fn parse_members(value: &Value) -> Option<Vec<AccountId>> {
    let list = match value {
        Value::Array(items) => items,
        Value::Object(_) => value.pointer("/fields/contents")?.as_array()?,
        _ => return None,
    };
    list.iter()
        .map(|item| item.as_str().and_then(|s| s.parse().ok()))
        .collect()
}

#[async_trait]
impl AccessPolicy for AllowlistClient {
    async fn is_authorized(&self, policy_object: &ObjectId, caller: &Caller) -> bool {
        AllowlistClient::is_authorized(self, policy_object, caller).await
    }

    async fn approval_transaction(
        &self,
        policy_id: &PolicyId,
    ) -> Result<ApprovalTransaction, AllowlistError> {
        AllowlistClient::approval_transaction(self, policy_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::derive_policy_id;
    use crate::sui::client::SuiExecutionResult;
    use crate::sui::transaction::CallArg;
    use crate::sui::KeypairSigner;
    use crate::testing::{spawn_fake_sui, FakeChain};
    use ed25519_dalek::SigningKey;
    use serde_json::json;

    fn returns(values: Vec<(Vec<u8>, &str)>) -> DevInspectResults {
        DevInspectResults {
            results: Some(vec![SuiExecutionResult {
                return_values: values.into_iter().map(|(b, t)| (b, t.to_string())).collect(),
            }]),
            error: None,
        }
    }

    #[test]
    fn decodes_bool_flag() {
        assert_eq!(decode_bool_return(&returns(vec![(vec![1], "bool")])), Ok(true));
        assert_eq!(decode_bool_return(&returns(vec![(vec![0], "bool")])), Ok(false));
        assert_eq!(decode_bool_return(&returns(vec![(vec![2], "bool")])), Ok(true));
    }

    #[test]
    fn decode_rejects_ambiguous_results() {
        assert_eq!(
            decode_bool_return(&DevInspectResults::default()),
            Err(DecodeError::NoResults)
        );
        assert_eq!(
            decode_bool_return(&returns(vec![])),
            Err(DecodeError::NoReturnValue)
        );
        assert_eq!(
            decode_bool_return(&returns(vec![(vec![1], "u8")])),
            Err(DecodeError::UnexpectedType("u8".into()))
        );
        assert_eq!(
            decode_bool_return(&returns(vec![(vec![], "bool")])),
            Err(DecodeError::InvalidLength(0))
        );
        assert_eq!(
            decode_bool_return(&returns(vec![(vec![1, 0], "bool")])),
            Err(DecodeError::InvalidLength(2))
        );

        let failed = DevInspectResults {
            results: None,
            error: Some("MoveAbort".into()),
        };
        assert_eq!(
            decode_bool_return(&failed),
            Err(DecodeError::ExecutionFailed("MoveAbort".into()))
        );
    }

    #[test]
    fn parses_member_list_shapes() {
        let a = "0x0000000000000000000000000000000000000000000000000000000000000a11";
        let plain = json!([a]);
        let vec_set = json!({
            "type": "0x2::vec_set::VecSet<address>",
            "fields": { "contents": [a] }
        });

        let expected: AccountId = a.parse().unwrap();
        assert_eq!(parse_members(&plain), Some(vec![expected]));
        assert_eq!(parse_members(&vec_set), Some(vec![expected]));
        assert_eq!(parse_members(&json!({ "fields": { "id": "0x1" } })), None);
        assert_eq!(parse_members(&json!(["not an address"])), None);
    }

    #[test]
    fn approval_transaction_layout() {
        let package = ObjectId::new([1; 32]);
        let policy = ObjectId::new([2; 32]);
        let policy_id = derive_policy_id(&policy, &[9; 5]);
        let whitelist = ObjectArg::SharedObject {
            id: policy,
            initial_shared_version: 3,
            mutable: false,
        };

        let approval =
            ApprovalTransaction::build(package, "simple_whitelist", &policy_id, whitelist.clone())
                .unwrap();
        assert_eq!(approval.call.function, "seal_approve");

        let kind = TransactionKind::from_bytes(&approval.kind_bytes).unwrap();
        let pt = kind.programmable();
        let mut id_arg = vec![37u8];
        id_arg.extend_from_slice(policy_id.as_bytes());
        assert_eq!(pt.inputs[0], CallArg::Pure(id_arg));
        assert_eq!(pt.inputs[1], CallArg::Object(whitelist));
    }

    #[tokio::test]
    async fn add_then_remove_round_trip() {
        let chain = FakeChain::new();
        let url = spawn_fake_sui(chain.clone()).await;
        let sui = Arc::new(SuiClient::new(url).unwrap());
        let client = AllowlistClient::new(sui.clone(), chain.package, "simple_whitelist");
        let admin = KeypairSigner::new(SigningKey::from_bytes(&[3; 32]), sui, 1_000);

        let caller = Caller::new(AccountId::new([0xaa; 32]));
        assert!(!client.is_authorized(&chain.policy, &caller).await);

        client
            .add_address(&admin, &chain.policy, &chain.admin_cap, caller.account())
            .await
            .unwrap();
        assert!(client.is_authorized(&chain.policy, &caller).await);
        assert_eq!(client.members(&chain.policy).await.unwrap(), vec![*caller.account()]);

        client
            .remove_address(&admin, &chain.policy, &chain.admin_cap, caller.account())
            .await
            .unwrap();
        assert!(!client.is_authorized(&chain.policy, &caller).await);
        assert!(client.members(&chain.policy).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mutation_with_wrong_capability_is_surfaced() {
        let chain = FakeChain::new();
        let url = spawn_fake_sui(chain.clone()).await;
        let sui = Arc::new(SuiClient::new(url).unwrap());
        let client = AllowlistClient::new(sui.clone(), chain.package, "simple_whitelist");
        let admin = KeypairSigner::new(SigningKey::from_bytes(&[3; 32]), sui, 1_000);

        let err = client
            .add_address(
                &admin,
                &chain.policy,
                &ObjectId::new([0xee; 32]),
                &AccountId::new([1; 32]),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AllowlistError::Transaction(SignerError::Failed { .. })
        ));
    }

    #[tokio::test]
    async fn network_failure_denies_access() {
        // Nothing listens on the discard port
        let sui = Arc::new(SuiClient::new("http://127.0.0.1:9".parse().unwrap()).unwrap());
        let client = AllowlistClient::new(sui, ObjectId::new([1; 32]), "simple_whitelist");
        let caller = Caller::new(AccountId::new([2; 32]));
        let policy = ObjectId::new([3; 32]);

        assert!(client.check_membership(&policy, &caller).await.is_err());
        assert!(!client.is_authorized(&policy, &caller).await);
    }

    #[tokio::test]
    async fn non_shared_policy_object_denies_access() {
        let chain = FakeChain::new();
        let url = spawn_fake_sui(chain.clone()).await;
        let sui = Arc::new(SuiClient::new(url).unwrap());
        let client = AllowlistClient::new(sui, chain.package, "simple_whitelist");

        let unknown = ObjectId::new([0x77; 32]);
        let caller = Caller::new(AccountId::new([0xaa; 32]));
        assert!(matches!(
            client.check_membership(&unknown, &caller).await,
            Err(AllowlistError::Rpc(SuiClientError::ObjectNotFound(_)))
        ));
        assert!(!client.is_authorized(&unknown, &caller).await);
    }
}
