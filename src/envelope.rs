// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Encryption envelope.
//!
//! Payloads are encrypted by an external threshold-encryption service under
//! a [`PolicyId`]. Decryption is only attempted once the allowlist has
//! authorized the caller; the key-share request carries a `seal_approve`
//! transaction as proof.
//!
//! ```text
//! Plaintext -> Encrypted -> authorize(caller) -> Authorization -> Decrypted
//!                                 \-> Unauthorized
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::allowlist::{AccessPolicy, AllowlistError, ApprovalTransaction};
use crate::policy::PolicyId;
use crate::sui::{AccountId, Caller, ObjectId};

/// Parameters of an encryption request.
#[derive(Debug, Clone, Copy)]
pub struct EncryptRequest<'a> {
    pub threshold: u8,
    pub package: &'a ObjectId,
    pub id: &'a PolicyId,
    pub data: &'a [u8],
}

/// Parameters of a key-share request.
#[derive(Debug, Clone, Copy)]
pub struct KeyShareRequest<'a> {
    pub package: &'a ObjectId,
    pub id: &'a PolicyId,
    pub caller: &'a Caller,
    pub approval: &'a ApprovalTransaction,
}

/// Errors reported by the threshold-encryption service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    #[error("Key servers rejected the approval: {0}")]
    Rejected(String),

    #[error("Insufficient key shares: got {got}, need {needed}")]
    InsufficientShares { got: usize, needed: usize },

    #[error("Malformed ciphertext: {0}")]
    Malformed(String),

    #[error("Encryption service error: {0}")]
    Service(String),
}

/// Threshold-encryption service.
#[async_trait]
pub trait ThresholdCipher: Send + Sync {
    async fn encrypt(&self, request: EncryptRequest<'_>) -> Result<Vec<u8>, CipherError>;

    /// Fetch key shares with the approval and decrypt `ciphertext`.
    async fn decrypt(
        &self,
        ciphertext: &[u8],
        request: KeyShareRequest<'_>,
    ) -> Result<Vec<u8>, CipherError>;
}

/// Errors from the envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Account {account} is not authorized under policy {policy_object}")]
    Unauthorized {
        account: AccountId,
        policy_object: ObjectId,
    },

    #[error("Could not build approval transaction: {0}")]
    Approval(#[source] AllowlistError),

    #[error("Encryption failed: {0}")]
    Encryption(#[source] CipherError),

    #[error("Decryption failed: {0}")]
    Decryption(#[source] CipherError),
}

/// Encrypted bytes together with what is needed to decrypt them later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub ciphertext: Vec<u8>,
    pub policy_id: PolicyId,
    pub package: ObjectId,
}

/// Proof that a caller passed the allowlist check for a policy id.
///
/// Only [`Envelope::authorize`] creates one.
#[derive(Debug, Clone)]
pub struct Authorization {
    policy_id: PolicyId,
    caller: Caller,
    approval: ApprovalTransaction,
}

impl Authorization {
    pub fn policy_id(&self) -> &PolicyId {
        &self.policy_id
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    pub fn approval(&self) -> &ApprovalTransaction {
        &self.approval
    }
}

pub struct Envelope {
    policy: Arc<dyn AccessPolicy>,
    cipher: Arc<dyn ThresholdCipher>,
    package: ObjectId,
    threshold: u8,
}

impl Envelope {
    pub fn new(
        policy: Arc<dyn AccessPolicy>,
        cipher: Arc<dyn ThresholdCipher>,
        package: ObjectId,
        threshold: u8,
    ) -> Self {
        Self {
            policy,
            cipher,
            package,
            threshold,
        }
    }

    pub fn package(&self) -> &ObjectId {
        &self.package
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Encrypt `payload` under `policy_id`.
    pub async fn encrypt(
        &self,
        payload: &[u8],
        policy_id: &PolicyId,
    ) -> Result<EncryptedPayload, EnvelopeError> {
        let ciphertext = self
            .cipher
            .encrypt(EncryptRequest {
                threshold: self.threshold,
                package: &self.package,
                id: policy_id,
                data: payload,
            })
            .await
            .map_err(EnvelopeError::Encryption)?;

        tracing::debug!(
            policy_id = %policy_id,
            plaintext_len = payload.len(),
            ciphertext_len = ciphertext.len(),
            "Payload encrypted"
        );

        Ok(EncryptedPayload {
            ciphertext,
            policy_id: policy_id.clone(),
            package: self.package,
        })
    }

    /// Run the allowlist check for `caller` against the Policy Object that
    /// governs `policy_id`.
    pub async fn authorize(
        &self,
        policy_id: &PolicyId,
        caller: &Caller,
    ) -> Result<Authorization, EnvelopeError> {
        let policy_object = policy_id.policy_object();
        if !self.policy.is_authorized(&policy_object, caller).await {
            tracing::info!(
                account = %caller.account(),
                policy = %policy_object,
                "Decryption denied"
            );
            return Err(EnvelopeError::Unauthorized {
                account: *caller.account(),
                policy_object,
            });
        }

        let approval = self
            .policy
            .approval_transaction(policy_id)
            .await
            .map_err(EnvelopeError::Approval)?;

        Ok(Authorization {
            policy_id: policy_id.clone(),
            caller: *caller,
            approval,
        })
    }

    /// Decrypt with a previously obtained authorization.
    pub async fn decrypt_authorized(
        &self,
        ciphertext: &[u8],
        authorization: &Authorization,
    ) -> Result<Vec<u8>, EnvelopeError> {
        self.cipher
            .decrypt(
                ciphertext,
                KeyShareRequest {
                    package: &self.package,
                    id: &authorization.policy_id,
                    caller: &authorization.caller,
                    approval: &authorization.approval,
                },
            )
            .await
            .map_err(|e| {
                tracing::warn!(
                    error = %e,
                    policy_id = %authorization.policy_id,
                    "Decryption failed"
                );
                EnvelopeError::Decryption(e)
            })
    }

    /// Authorize, then decrypt. The cipher is never contacted on denial.
    pub async fn decrypt(
        &self,
        ciphertext: &[u8],
        policy_id: &PolicyId,
        caller: &Caller,
    ) -> Result<Vec<u8>, EnvelopeError> {
        let authorization = self.authorize(policy_id, caller).await?;
        self.decrypt_authorized(ciphertext, &authorization).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::derive_policy_id;
    use crate::testing::{MemoryPolicy, XorCipher};

    const PACKAGE: ObjectId = ObjectId::new([0x75; 32]);
    const POLICY: ObjectId = ObjectId::new([0x15; 32]);

    fn envelope() -> (Envelope, Arc<MemoryPolicy>, Arc<XorCipher>) {
        let policy = MemoryPolicy::new(PACKAGE);
        let cipher = Arc::new(XorCipher::default());
        (Envelope::new(policy.clone(), cipher.clone(), PACKAGE, 2), policy, cipher)
    }

    #[tokio::test]
    async fn authorized_caller_recovers_payload() {
        let (envelope, policy, _) = envelope();
        let alice = Caller::new(AccountId::new([0xa1; 32]));
        policy.allow(*alice.account());

        let id = derive_policy_id(&POLICY, &[1, 2, 3, 4, 5]);
        let encrypted = envelope.encrypt(b"quarterly report", &id).await.unwrap();
        assert_ne!(encrypted.ciphertext, b"quarterly report");
        assert_eq!(encrypted.package, PACKAGE);
        assert_eq!(encrypted.policy_id, id);

        let plain = envelope.decrypt(&encrypted.ciphertext, &id, &alice).await.unwrap();
        assert_eq!(plain, b"quarterly report");
    }

    #[tokio::test]
    async fn denied_caller_never_reaches_cipher() {
        let (envelope, _, cipher) = envelope();
        let bob = Caller::new(AccountId::new([0xb0; 32]));

        let id = derive_policy_id(&POLICY, &[7; 5]);
        let encrypted = envelope.encrypt(b"secret", &id).await.unwrap();

        let err = envelope.decrypt(&encrypted.ciphertext, &id, &bob).await.unwrap_err();
        match err {
            EnvelopeError::Unauthorized { account, policy_object } => {
                assert_eq!(account, *bob.account());
                assert_eq!(policy_object, POLICY);
            }
            other => panic!("expected Unauthorized, got {other:?}"),
        }
        assert_eq!(cipher.decrypt_calls(), 0);
    }

    #[tokio::test]
    async fn authorization_carries_approval_for_the_policy_id() {
        let (envelope, policy, _) = envelope();
        let alice = Caller::new(AccountId::new([0xa1; 32]));
        policy.allow(*alice.account());

        let id = derive_policy_id(&POLICY, &[9; 5]);
        let authorization = envelope.authorize(&id, &alice).await.unwrap();
        assert_eq!(authorization.policy_id(), &id);
        assert_eq!(authorization.caller(), &alice);
        assert_eq!(
            authorization.approval().call.target(),
            format!("{PACKAGE}::simple_whitelist::seal_approve")
        );
    }

    #[tokio::test]
    async fn cipher_rejection_is_a_decryption_error() {
        let (envelope, policy, cipher) = envelope();
        let alice = Caller::new(AccountId::new([0xa1; 32]));
        policy.allow(*alice.account());

        let id = derive_policy_id(&POLICY, &[1; 5]);
        let other = derive_policy_id(&POLICY, &[2; 5]);
        let encrypted = envelope.encrypt(b"data", &id).await.unwrap();

        let err = envelope.decrypt(&encrypted.ciphertext, &other, &alice).await.unwrap_err();
        assert!(matches!(err, EnvelopeError::Decryption(CipherError::Rejected(_))));
        assert_eq!(cipher.decrypt_calls(), 1);
    }
}
