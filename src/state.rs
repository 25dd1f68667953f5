// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::allowlist::AllowlistClient;
use crate::auth::AdminToken;
use crate::config::Config;
use crate::error::Error;
use crate::sui::{KeypairSigner, SuiClient, TransactionSigner};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sui: Arc<SuiClient>,
    pub allowlist: Arc<AllowlistClient>,
    /// Admin signer; mutations are refused without one
    pub signer: Option<Arc<dyn TransactionSigner>>,
    pub admin_token: Option<AdminToken>,
}

impl AppState {
    pub fn new(
        config: Config,
        sui: Arc<SuiClient>,
        signer: Option<Arc<dyn TransactionSigner>>,
    ) -> Self {
        let allowlist = Arc::new(AllowlistClient::new(
            sui.clone(),
            config.package_id,
            config.module.clone(),
        ));
        let admin_token = config.admin_token.as_deref().map(AdminToken::new);
        Self {
            config: Arc::new(config),
            sui,
            allowlist,
            signer,
            admin_token,
        }
    }

    /// Build clients from configuration, including the keypair signer when
    /// `SUI_SIGNER_KEY` is set.
    pub fn from_config(config: Config) -> Result<Self, Error> {
        let sui = Arc::new(SuiClient::new(config.sui_rpc_url.clone())?);
        let signer = match config.signer_key.as_deref() {
            Some(key) => {
                let signer = KeypairSigner::from_encoded(key, sui.clone(), config.gas_budget)?;
                tracing::info!(address = %signer.address(), "Loaded admin signer");
                Some(Arc::new(signer) as Arc<dyn TransactionSigner>)
            }
            None => {
                tracing::warn!("SUI_SIGNER_KEY not set, allowlist mutations are disabled");
                None
            }
        };
        Ok(Self::new(config, sui, signer))
    }
}
