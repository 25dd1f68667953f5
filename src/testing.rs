// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test fixtures.
//!
//! The node fakes live in `tests/common` so the integration tests share
//! them; this module mounts that file and adds the configuration and state
//! fixtures used by the handler tests.

use std::sync::Arc;

use url::Url;

use crate::config::{Config, DEFAULT_GAS_BUDGET, DEFAULT_MODULE};
use crate::state::AppState;
use crate::sui::{ObjectId, SuiClient, TransactionSigner};

#[path = "../tests/common/mod.rs"]
mod common;

pub(crate) use common::*;

/// Configuration pointing at the ids held by [`FakeChain`].
pub(crate) fn test_config(rpc_url: Url) -> Config {
    Config {
        sui_rpc_url: rpc_url,
        package_id: ObjectId::new([0x75; 32]),
        policy_object_id: ObjectId::new([0x15; 32]),
        admin_cap_id: Some(ObjectId::new([0x8c; 32])),
        nft_package_id: ObjectId::new([0x8e; 32]),
        module: DEFAULT_MODULE.to_string(),
        publishers: vec!["http://127.0.0.1:9".parse().unwrap()],
        aggregators: vec!["http://127.0.0.1:9".parse().unwrap()],
        epochs: 5,
        probe_timeout: std::time::Duration::from_secs(2),
        publish_timeout: std::time::Duration::from_secs(10),
        fetch_timeout: std::time::Duration::from_secs(10),
        threshold: 2,
        gas_budget: DEFAULT_GAS_BUDGET,
        signer_key: None,
        admin_token: None,
        host: "127.0.0.1".to_string(),
        port: 0,
    }
}

/// Application state wired to a fake node at `rpc_url`.
pub(crate) fn test_state(rpc_url: Url, signer: Option<Arc<dyn TransactionSigner>>) -> AppState {
    let config = test_config(rpc_url.clone());
    let sui = Arc::new(SuiClient::with_http(rpc_url, reqwest::Client::new()));
    AppState::new(config, sui, signer)
}
