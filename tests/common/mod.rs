// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process fakes shared by the unit and integration tests.
//!
//! [`spawn_fake_sui`] serves a minimal Sui JSON-RPC node on `127.0.0.1:0`
//! holding a single shared allowlist object and any minted document NFTs.
//! Dev-inspect requests are decoded with the crate's own BCS types, so
//! encoding bugs show up as wrong answers. [`spawn_fake_walrus`] serves a
//! publisher/aggregator backed by a shared content-addressed map.
//!
//! The library mounts this file as `testing::common`, so every path goes
//! through `document_vault::`.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use base64::{
    engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD},
    Engine as _,
};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;
use url::Url;

use document_vault::allowlist::{AccessPolicy, AllowlistError, ApprovalTransaction};
use document_vault::envelope::{CipherError, EncryptRequest, KeyShareRequest, ThresholdCipher};
use document_vault::nft::{CLOCK_OBJECT_ID, NFT_MODULE, NFT_STRUCT};
use document_vault::policy::PolicyId;
use document_vault::sui::transaction::CallArg;
use document_vault::sui::{AccountId, Caller, ObjectArg, ObjectId, TransactionKind};

pub const SHARED_VERSION: u64 = 3;

/// Serve any router on a random local port.
pub async fn serve(router: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}").parse().unwrap()
}

// ---------------------------------------------------------------------------
// Sui full node
// ---------------------------------------------------------------------------

/// A minted `DocumentNFT`.
struct Nft {
    owner: AccountId,
    object: Value,
}

/// On-chain state of the fake node.
pub struct FakeChain {
    pub package: ObjectId,
    pub policy: ObjectId,
    pub admin_cap: ObjectId,
    pub nft_package: ObjectId,
    members: Mutex<BTreeSet<AccountId>>,
    nfts: Mutex<HashMap<ObjectId, Nft>>,
    pending: Mutex<HashMap<String, Value>>,
    next_tx: AtomicU64,
    pub dev_inspects: AtomicU64,
}

impl FakeChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            package: ObjectId::new([0x75; 32]),
            policy: ObjectId::new([0x15; 32]),
            admin_cap: ObjectId::new([0x8c; 32]),
            nft_package: ObjectId::new([0x8e; 32]),
            members: Mutex::new(BTreeSet::new()),
            nfts: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            next_tx: AtomicU64::new(1),
            dev_inspects: AtomicU64::new(0),
        })
    }

    pub fn insert(&self, account: AccountId) {
        self.members.lock().unwrap().insert(account);
    }

    pub fn minted_count(&self) -> usize {
        self.nfts.lock().unwrap().len()
    }

    fn nft_type(&self) -> String {
        format!("{}::{NFT_MODULE}::{NFT_STRUCT}", self.nft_package)
    }

    fn get_object(&self, params: &Value) -> Value {
        let id: ObjectId = match params[0].as_str().and_then(|s| s.parse().ok()) {
            Some(id) => id,
            None => return json!({ "error": { "code": "invalidParams" } }),
        };
        if let Some(nft) = self.nfts.lock().unwrap().get(&id) {
            return json!({ "data": nft.object });
        }
        if id != self.policy {
            return json!({ "error": { "code": "notExists", "object_id": id.to_hex() } });
        }
        let members: Vec<String> =
            self.members.lock().unwrap().iter().map(|a| a.to_hex()).collect();
        json!({
            "data": {
                "objectId": id.to_hex(),
                "version": "12",
                "digest": "fake",
                "owner": { "Shared": { "initial_shared_version": SHARED_VERSION } },
                "content": {
                    "dataType": "moveObject",
                    "fields": {
                        "id": { "id": id.to_hex() },
                        "whitelisted": {
                            "type": "0x2::vec_set::VecSet<address>",
                            "fields": { "contents": members }
                        }
                    }
                }
            }
        })
    }

    fn get_owned_objects(&self, params: &Value) -> Value {
        let owner = params[0].as_str().and_then(|s| s.parse::<AccountId>().ok());
        let wanted = params[1]["filter"]["StructType"].as_str();
        let data: Vec<Value> = self
            .nfts
            .lock()
            .unwrap()
            .values()
            .filter(|nft| Some(nft.owner) == owner && wanted == Some(self.nft_type().as_str()))
            .map(|nft| json!({ "data": nft.object }))
            .collect();
        json!({ "data": data, "nextCursor": null, "hasNextPage": false })
    }

    fn dev_inspect(&self, params: &Value) -> Value {
        self.dev_inspects.fetch_add(1, Ordering::SeqCst);
        let bytes = BASE64.decode(params[1].as_str().unwrap_or_default()).unwrap_or_default();
        let Ok(kind) = TransactionKind::from_bytes(&bytes) else {
            return json!({ "error": "malformed transaction", "results": null });
        };
        let pt = kind.programmable();
        let shared_ok = matches!(
            pt.inputs.first(),
            Some(CallArg::Object(ObjectArg::SharedObject {
                id,
                initial_shared_version: SHARED_VERSION,
                ..
            })) if *id == self.policy
        );
        let account = match pt.inputs.get(1) {
            Some(CallArg::Pure(raw)) => AccountId::from_slice(raw),
            _ => None,
        };
        match (shared_ok, account) {
            (true, Some(account)) => {
                let flag = u8::from(self.members.lock().unwrap().contains(&account));
                json!({
                    "effects": {},
                    "events": [],
                    "results": [{ "returnValues": [[[flag], "bool"]] }]
                })
            }
            _ => json!({
                "effects": {},
                "events": [],
                "error": "VMVerificationOrDeserializationError"
            }),
        }
    }

    fn move_call(&self, params: &Value) -> Value {
        let tx = format!("tx-{}", self.next_tx.fetch_add(1, Ordering::SeqCst));
        self.pending.lock().unwrap().insert(tx.clone(), params.clone());
        json!({ "txBytes": BASE64.encode(tx.as_bytes()), "gas": [], "inputObjects": [] })
    }

    fn update_members(&self, function: &str, args: &Value) -> Result<(), String> {
        let cap = args[1].as_str().and_then(|s| s.parse::<ObjectId>().ok());
        let account = args[2].as_str().and_then(|s| s.parse::<AccountId>().ok());
        match (cap == Some(self.admin_cap), account) {
            (true, Some(account)) => {
                let mut members = self.members.lock().unwrap();
                if function == "add_to_whitelist" {
                    members.insert(account);
                } else {
                    members.remove(&account);
                }
                Ok(())
            }
            _ => Err("MoveAbort(ENotAdmin, 0)".to_string()),
        }
    }

    /// `mint_and_transfer_nft(wallet_address, blob_id, clock, name,
    /// description, doc_type, doc_size, recipient)`
    fn mint(&self, call: &Value, tx: &str) -> Result<(), String> {
        let package = call[1].as_str().and_then(|s| s.parse::<ObjectId>().ok());
        if package != Some(self.nft_package) {
            return Err("PackageObjectNotFound".to_string());
        }
        let args = call[5].as_array().ok_or("missing arguments")?;
        if args.len() != 8 {
            return Err(format!("ArityMismatch: {}", args.len()));
        }
        let clock = args[2].as_str().and_then(|s| s.parse::<ObjectId>().ok());
        if clock != Some(CLOCK_OBJECT_ID) {
            return Err("TypeMismatch: expected 0x2::clock::Clock".to_string());
        }
        let owner = args[7]
            .as_str()
            .and_then(|s| s.parse::<AccountId>().ok())
            .ok_or("invalid recipient")?;

        let mut nfts = self.nfts.lock().unwrap();
        let mut id = [0xd0; 32];
        id[31] = nfts.len() as u8;
        let id = ObjectId::new(id);
        let object = json!({
            "objectId": id.to_hex(),
            "version": "1",
            "digest": tx,
            "type": self.nft_type(),
            "owner": { "AddressOwner": owner.to_hex() },
            "content": {
                "dataType": "moveObject",
                "type": self.nft_type(),
                "fields": {
                    "id": { "id": id.to_hex() },
                    "wallet_address": args[0],
                    "blob_id": args[1],
                    "timestamp": "1760000000000",
                    "name": args[3],
                    "description": args[4],
                    "doc_type": args[5],
                    "doc_size": args[6]
                }
            }
        });
        nfts.insert(id, Nft { owner, object });
        Ok(())
    }

    fn execute(&self, params: &Value) -> Value {
        let tx = BASE64
            .decode(params[0].as_str().unwrap_or_default())
            .ok()
            .and_then(|b| String::from_utf8(b).ok())
            .unwrap_or_default();
        let Some(call) = self.pending.lock().unwrap().remove(&tx) else {
            return json!({
                "digest": tx,
                "effects": { "status": { "status": "failure", "error": "unknown tx" } }
            });
        };

        let outcome = match call[3].as_str().unwrap_or_default() {
            function @ ("add_to_whitelist" | "remove_from_whitelist") => {
                self.update_members(function, &call[5])
            }
            "mint_and_transfer_nft" => self.mint(&call, &tx),
            other => Err(format!("FunctionNotFound: {other}")),
        };
        let status = match outcome {
            Ok(()) => json!({ "status": "success" }),
            Err(error) => json!({ "status": "failure", "error": error }),
        };
        json!({ "digest": format!("D{tx}"), "effects": { "status": status } })
    }
}

async fn handle(State(chain): State<Arc<FakeChain>>, Json(request): Json<Value>) -> Json<Value> {
    let params = &request["params"];
    let result = match request["method"].as_str().unwrap_or_default() {
        "sui_getObject" => chain.get_object(params),
        "suix_getOwnedObjects" => chain.get_owned_objects(params),
        "sui_devInspectTransactionBlock" => chain.dev_inspect(params),
        "unsafe_moveCall" => chain.move_call(params),
        "sui_executeTransactionBlock" => chain.execute(params),
        "sui_getLatestCheckpointSequenceNumber" => json!("42"),
        other => {
            return Json(json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "error": { "code": -32601, "message": format!("Method not found: {other}") }
            }))
        }
    };
    Json(json!({ "jsonrpc": "2.0", "id": request["id"], "result": result }))
}

/// Serve `chain` and return its RPC URL.
pub async fn spawn_fake_sui(chain: Arc<FakeChain>) -> Url {
    serve(Router::new().route("/", post(handle)).with_state(chain)).await
}

// ---------------------------------------------------------------------------
// Walrus nodes
// ---------------------------------------------------------------------------

/// Behaviour of one fake Walrus node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMode {
    Healthy,
    /// Every request fails with HTTP 500
    Failing,
}

/// Blob storage shared by all fake Walrus nodes.
#[derive(Default)]
pub struct FakeWalrus {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    gets: AtomicUsize,
    last_epochs: Mutex<Option<u32>>,
}

impl FakeWalrus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn last_epochs(&self) -> Option<u32> {
        *self.last_epochs.lock().unwrap()
    }
}

type WalrusState = (Arc<FakeWalrus>, NodeMode);

async fn put_blob(
    State((walrus, mode)): State<WalrusState>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    walrus.puts.fetch_add(1, Ordering::SeqCst);
    *walrus.last_epochs.lock().unwrap() = query.get("epochs").and_then(|e| e.parse().ok());
    if mode == NodeMode::Failing {
        return (StatusCode::INTERNAL_SERVER_ERROR, "storage node unavailable").into_response();
    }

    let digest = Sha256::digest(&body);
    let blob_id = URL_SAFE_NO_PAD.encode(digest);
    let size = body.len();
    let existed = walrus
        .blobs
        .lock()
        .unwrap()
        .insert(blob_id.clone(), body.to_vec())
        .is_some();

    let response = if existed {
        json!({
            "alreadyCertified": {
                "blobId": blob_id,
                "event": { "txDigest": format!("cert-{}", &blob_id[..8]), "eventSeq": "0" },
                "endEpoch": 60
            }
        })
    } else {
        json!({
            "newlyCreated": {
                "blobObject": {
                    "id": format!("0x{}", hex::encode(digest)),
                    "registeredEpoch": 1,
                    "blobId": blob_id,
                    "size": size,
                    "deletable": false
                },
                "cost": 1000
            }
        })
    };
    Json(response).into_response()
}

async fn get_blob(
    State((walrus, mode)): State<WalrusState>,
    Path(blob_id): Path<String>,
) -> Response {
    walrus.gets.fetch_add(1, Ordering::SeqCst);
    if mode == NodeMode::Failing {
        return (StatusCode::INTERNAL_SERVER_ERROR, "storage node unavailable").into_response();
    }
    match walrus.blobs.lock().unwrap().get(&blob_id) {
        Some(bytes) => bytes.clone().into_response(),
        None => (StatusCode::NOT_FOUND, "blob not found").into_response(),
    }
}

/// Serve one Walrus node over `walrus` and return its base URL.
pub async fn spawn_fake_walrus(walrus: Arc<FakeWalrus>, mode: NodeMode) -> Url {
    serve(
        Router::new()
            .route("/v1/blobs", put(put_blob))
            .route("/v1/blobs/{blob_id}", get(get_blob))
            .layer(DefaultBodyLimit::disable())
            .with_state((walrus, mode)),
    )
    .await
}

// ---------------------------------------------------------------------------
// Access policy and threshold cipher
// ---------------------------------------------------------------------------

/// Allowlist held in memory.
pub struct MemoryPolicy {
    pub package: ObjectId,
    pub members: Mutex<BTreeSet<AccountId>>,
}

impl MemoryPolicy {
    pub fn new(package: ObjectId) -> Arc<Self> {
        Arc::new(Self {
            package,
            members: Mutex::new(BTreeSet::new()),
        })
    }

    pub fn allow(&self, account: AccountId) {
        self.members.lock().unwrap().insert(account);
    }
}

#[async_trait]
impl AccessPolicy for MemoryPolicy {
    async fn is_authorized(&self, _policy_object: &ObjectId, caller: &Caller) -> bool {
        self.members.lock().unwrap().contains(caller.account())
    }

    async fn approval_transaction(
        &self,
        policy_id: &PolicyId,
    ) -> Result<ApprovalTransaction, AllowlistError> {
        let whitelist = ObjectArg::SharedObject {
            id: policy_id.policy_object(),
            initial_shared_version: 1,
            mutable: false,
        };
        Ok(ApprovalTransaction::build(
            self.package,
            "simple_whitelist",
            policy_id,
            whitelist,
        )?)
    }
}

/// XOR "cipher" that prefixes the policy id and counts key-share requests.
/// Refuses key shares without a `seal_approve` call.
#[derive(Default)]
pub struct XorCipher {
    decrypt_calls: AtomicUsize,
}

impl XorCipher {
    pub fn decrypt_calls(&self) -> usize {
        self.decrypt_calls.load(Ordering::SeqCst)
    }
}

fn keystream(id: &PolicyId) -> impl Iterator<Item = u8> + '_ {
    id.as_bytes().iter().copied().cycle()
}

#[async_trait]
impl ThresholdCipher for XorCipher {
    async fn encrypt(&self, request: EncryptRequest<'_>) -> Result<Vec<u8>, CipherError> {
        let id = request.id.as_bytes();
        let mut out = Vec::with_capacity(1 + id.len() + request.data.len());
        out.push(id.len() as u8);
        out.extend_from_slice(id);
        out.extend(request.data.iter().zip(keystream(request.id)).map(|(b, k)| b ^ k));
        Ok(out)
    }

    async fn decrypt(
        &self,
        ciphertext: &[u8],
        request: KeyShareRequest<'_>,
    ) -> Result<Vec<u8>, CipherError> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);

        if request.approval.call.function != "seal_approve" {
            return Err(CipherError::Rejected("not a seal_approve call".into()));
        }
        let (&len, rest) = ciphertext
            .split_first()
            .ok_or_else(|| CipherError::Malformed("empty".into()))?;
        let (id, body) = rest
            .split_at_checked(len as usize)
            .ok_or_else(|| CipherError::Malformed("short header".into()))?;
        if id != request.id.as_bytes() {
            return Err(CipherError::Rejected("approval is for a different id".into()));
        }
        Ok(body.iter().zip(keystream(request.id)).map(|(b, k)| b ^ k).collect())
    }
}
