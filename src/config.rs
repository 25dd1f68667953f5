// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! validated [`Config`] record. Configuration is loaded from the environment
//! once at startup and passed explicitly to every component.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SUI_RPC_URL` | Sui full-node JSON-RPC endpoint | testnet full node |
//! | `ALLOWLIST_PACKAGE_ID` | Allowlist Move package id | Required |
//! | `ALLOWLIST_OBJECT_ID` | Policy Object id | Required |
//! | `ALLOWLIST_ADMIN_CAP_ID` | Admin capability object id | Optional |
//! | `ALLOWLIST_MODULE` | Move module name | `simple_whitelist` |
//! | `DOCUMENT_NFT_PACKAGE_ID` | Document NFT Move package id | testnet deployment |
//! | `WALRUS_PUBLISHERS` | Comma-separated publisher URLs | built-in testnet list |
//! | `WALRUS_AGGREGATORS` | Comma-separated aggregator URLs | built-in testnet list |
//! | `WALRUS_EPOCHS` | Default storage epochs (1-53) | `5` |
//! | `WALRUS_PROBE_TIMEOUT_SECS` | Publisher probe timeout | `10` |
//! | `WALRUS_PUBLISH_TIMEOUT_SECS` | Publish request timeout | `120` |
//! | `WALRUS_FETCH_TIMEOUT_SECS` | Per-aggregator fetch timeout | `30` |
//! | `SEAL_THRESHOLD` | Key servers needed to decrypt | `2` |
//! | `SUI_GAS_BUDGET` | Gas budget in MIST for allowlist mutations | `10000000` |
//! | `SUI_SIGNER_KEY` | Admin key for the proxy (keystore base64 or hex) | Optional |
//! | `PROXY_ADMIN_TOKEN` | Bearer token for proxy mutations | Optional (dev mode) |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::nft::DEFAULT_NFT_PACKAGE;
use crate::storage::walrus::{DEFAULT_EPOCHS, MAX_EPOCHS, MIN_EPOCHS};
use crate::storage::{EndpointError, EndpointPool, StoreSettings};
use crate::sui::{ObjectId, SUI_TESTNET};

pub const SUI_RPC_URL_ENV: &str = "SUI_RPC_URL";
pub const ALLOWLIST_PACKAGE_ID_ENV: &str = "ALLOWLIST_PACKAGE_ID";
pub const ALLOWLIST_OBJECT_ID_ENV: &str = "ALLOWLIST_OBJECT_ID";
pub const ALLOWLIST_ADMIN_CAP_ID_ENV: &str = "ALLOWLIST_ADMIN_CAP_ID";
pub const ALLOWLIST_MODULE_ENV: &str = "ALLOWLIST_MODULE";
pub const DOCUMENT_NFT_PACKAGE_ID_ENV: &str = "DOCUMENT_NFT_PACKAGE_ID";
pub const WALRUS_PUBLISHERS_ENV: &str = "WALRUS_PUBLISHERS";
pub const WALRUS_AGGREGATORS_ENV: &str = "WALRUS_AGGREGATORS";
pub const WALRUS_EPOCHS_ENV: &str = "WALRUS_EPOCHS";
pub const WALRUS_PROBE_TIMEOUT_ENV: &str = "WALRUS_PROBE_TIMEOUT_SECS";
pub const WALRUS_PUBLISH_TIMEOUT_ENV: &str = "WALRUS_PUBLISH_TIMEOUT_SECS";
pub const WALRUS_FETCH_TIMEOUT_ENV: &str = "WALRUS_FETCH_TIMEOUT_SECS";
pub const SEAL_THRESHOLD_ENV: &str = "SEAL_THRESHOLD";
pub const SUI_GAS_BUDGET_ENV: &str = "SUI_GAS_BUDGET";

/// Admin signing key for the whitelist proxy.
///
/// Never logged. When unset the proxy serves reads only.
pub const SUI_SIGNER_KEY_ENV: &str = "SUI_SIGNER_KEY";

/// Bearer token required on `POST /whitelist`.
///
/// # Default
/// Unset, which disables the check (development mode).
pub const PROXY_ADMIN_TOKEN_ENV: &str = "PROXY_ADMIN_TOKEN";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_MODULE: &str = "simple_whitelist";
pub const DEFAULT_THRESHOLD: u8 = 2;
pub const DEFAULT_GAS_BUDGET: u64 = 10_000_000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Testnet publishers, tried in this order.
pub const DEFAULT_PUBLISHERS: &[&str] = &[
    "https://publisher.walrus-testnet.walrus.space",
    "https://publisher.testnet.walrus.atalma.io",
    "https://publisher.walrus-01.tududes.com",
    "https://publisher.walrus-testnet.h2o-nodes.com",
    "https://publisher.walrus.banansen.dev",
    "https://sm1-walrus-testnet-publisher.stakesquid.com",
    "https://sui-walrus-testnet-publisher.bwarelabs.com",
    "https://suiftly-testnet-pub.mhax.io",
    "https://testnet-publisher-walrus.kiliglab.io",
    "https://testnet-publisher.walrus.graphyte.dev",
    "https://testnet.publisher.walrus.silentvalidator.com",
    "https://wal-publisher-testnet.staketab.org",
    "https://walrus-publish-testnet.chainode.tech:9003",
    "https://walrus-publisher-testnet.n1stake.com",
    "https://walrus-publisher-testnet.staking4all.org",
    "https://walrus-publisher.rubynodes.io",
    "https://walrus-publisher.thcloud.dev",
    "https://walrus-testnet-published.luckyresearch.org",
    "https://walrus-testnet-publisher-1.zkv.xyz",
    "https://walrus-testnet-publisher.chainbase.online",
    "https://walrus-testnet-publisher.crouton.digital",
    "https://walrus-testnet-publisher.dzdaic.com",
    "https://walrus-testnet-publisher.everstake.one",
    "https://walrus-testnet-publisher.nami.cloud",
    "https://walrus-testnet-publisher.natsai.xyz",
    "https://walrus-testnet-publisher.nodeinfra.com",
    "https://walrus-testnet-publisher.nodes.guru",
    "https://walrus-testnet-publisher.redundex.com",
    "https://walrus-testnet-publisher.rpc101.org",
    "https://walrus-testnet-publisher.stakecraft.com",
    "https://walrus-testnet-publisher.stakeengine.co.uk",
    "https://walrus-testnet-publisher.stakely.io",
    "https://walrus-testnet-publisher.stakeme.pro",
    "https://walrus-testnet-publisher.stakingdefenseleague.com",
    "https://walrus-testnet-publisher.starduststaking.com",
    "https://walrus-testnet-publisher.trusted-point.com",
    "https://walrus-testnet.blockscope.net:11444",
    "https://walrus-testnet.validators.services.kyve.network/publish",
    "https://walrus.testnet.publisher.stakepool.dev.br",
    "http://walrus-publisher-testnet.cetus.zone:9001",
    "http://walrus-publisher-testnet.haedal.xyz:9001",
    "http://walrus-publisher-testnet.suisec.tech:9001",
    "http://walrus-storage.testnet.nelrann.org:9001",
    "http://walrus-testnet.equinoxdao.xyz:9001",
    "http://walrus-testnet.suicore.com:9001",
    "http://walrus.testnet.pops.one:9001",
    "http://waltest.chainflow.io:9001",
];

/// Testnet aggregators, tried in this order.
pub const DEFAULT_AGGREGATORS: &[&str] = &[
    "https://aggregator.walrus-testnet.walrus.space",
    "https://sui-walrus-tn-aggregator.bwarelabs.com",
    "https://wal-aggregator-testnet.staketab.org",
    "https://aggregator.walrus.banansen.dev",
];

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

fn invalid(var: &'static str, reason: impl fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.to_string(),
    }
}

/// Validated, immutable runtime configuration.
#[derive(Clone)]
pub struct Config {
    pub sui_rpc_url: Url,
    pub package_id: ObjectId,
    pub policy_object_id: ObjectId,
    pub admin_cap_id: Option<ObjectId>,
    pub nft_package_id: ObjectId,
    pub module: String,
    pub publishers: Vec<Url>,
    pub aggregators: Vec<Url>,
    pub epochs: u32,
    pub probe_timeout: Duration,
    pub publish_timeout: Duration,
    pub fetch_timeout: Duration,
    pub threshold: u8,
    pub gas_budget: u64,
    pub signer_key: Option<String>,
    pub admin_token: Option<String>,
    pub host: String,
    pub port: u16,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("sui_rpc_url", &self.sui_rpc_url.as_str())
            .field("package_id", &self.package_id)
            .field("policy_object_id", &self.policy_object_id)
            .field("admin_cap_id", &self.admin_cap_id)
            .field("nft_package_id", &self.nft_package_id)
            .field("module", &self.module)
            .field("publishers", &self.publishers.len())
            .field("aggregators", &self.aggregators.len())
            .field("epochs", &self.epochs)
            .field("threshold", &self.threshold)
            .field("signer_key", &self.signer_key.as_ref().map(|_| "<redacted>"))
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to read variables. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let sui_rpc_url = parse_url(
            SUI_RPC_URL_ENV,
            &get(SUI_RPC_URL_ENV).unwrap_or_else(|| SUI_TESTNET.rpc_url.to_string()),
        )?;

        let package_id = parse_id(
            ALLOWLIST_PACKAGE_ID_ENV,
            &get(ALLOWLIST_PACKAGE_ID_ENV).ok_or(ConfigError::Missing(ALLOWLIST_PACKAGE_ID_ENV))?,
        )?;
        let policy_object_id = parse_id(
            ALLOWLIST_OBJECT_ID_ENV,
            &get(ALLOWLIST_OBJECT_ID_ENV).ok_or(ConfigError::Missing(ALLOWLIST_OBJECT_ID_ENV))?,
        )?;
        let admin_cap_id = get(ALLOWLIST_ADMIN_CAP_ID_ENV)
            .map(|raw| parse_id(ALLOWLIST_ADMIN_CAP_ID_ENV, &raw))
            .transpose()?;
        let nft_package_id = parse_id(
            DOCUMENT_NFT_PACKAGE_ID_ENV,
            &get(DOCUMENT_NFT_PACKAGE_ID_ENV).unwrap_or_else(|| DEFAULT_NFT_PACKAGE.to_string()),
        )?;

        let module = get(ALLOWLIST_MODULE_ENV).unwrap_or_else(|| DEFAULT_MODULE.to_string());
        if !module.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            || module.starts_with(|c: char| c.is_ascii_digit())
        {
            return Err(invalid(ALLOWLIST_MODULE_ENV, "not a Move identifier"));
        }

        let publishers = parse_url_list(
            WALRUS_PUBLISHERS_ENV,
            get(WALRUS_PUBLISHERS_ENV),
            DEFAULT_PUBLISHERS,
        )?;
        let aggregators = parse_url_list(
            WALRUS_AGGREGATORS_ENV,
            get(WALRUS_AGGREGATORS_ENV),
            DEFAULT_AGGREGATORS,
        )?;

        let epochs = parse_number(WALRUS_EPOCHS_ENV, get(WALRUS_EPOCHS_ENV), DEFAULT_EPOCHS)?;
        if !(MIN_EPOCHS..=MAX_EPOCHS).contains(&epochs) {
            return Err(invalid(
                WALRUS_EPOCHS_ENV,
                format!("must be between {MIN_EPOCHS} and {MAX_EPOCHS}"),
            ));
        }

        let probe_timeout =
            parse_secs(WALRUS_PROBE_TIMEOUT_ENV, get(WALRUS_PROBE_TIMEOUT_ENV), 10)?;
        let publish_timeout =
            parse_secs(WALRUS_PUBLISH_TIMEOUT_ENV, get(WALRUS_PUBLISH_TIMEOUT_ENV), 120)?;
        let fetch_timeout =
            parse_secs(WALRUS_FETCH_TIMEOUT_ENV, get(WALRUS_FETCH_TIMEOUT_ENV), 30)?;

        let threshold =
            parse_number(SEAL_THRESHOLD_ENV, get(SEAL_THRESHOLD_ENV), DEFAULT_THRESHOLD)?;
        if threshold == 0 {
            return Err(invalid(SEAL_THRESHOLD_ENV, "must be at least 1"));
        }

        let gas_budget =
            parse_number(SUI_GAS_BUDGET_ENV, get(SUI_GAS_BUDGET_ENV), DEFAULT_GAS_BUDGET)?;
        let port = parse_number(PORT_ENV, get(PORT_ENV), DEFAULT_PORT)?;

        Ok(Self {
            sui_rpc_url,
            package_id,
            policy_object_id,
            admin_cap_id,
            nft_package_id,
            module,
            publishers,
            aggregators,
            epochs,
            probe_timeout,
            publish_timeout,
            fetch_timeout,
            threshold,
            gas_budget,
            signer_key: get(SUI_SIGNER_KEY_ENV),
            admin_token: get(PROXY_ADMIN_TOKEN_ENV),
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        })
    }

    pub fn publisher_pool(&self) -> Result<EndpointPool, EndpointError> {
        EndpointPool::new(self.publishers.clone())
    }

    pub fn aggregator_pool(&self) -> Result<EndpointPool, EndpointError> {
        EndpointPool::new(self.aggregators.clone())
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            epochs: self.epochs,
            probe_timeout: self.probe_timeout,
            publish_timeout: self.publish_timeout,
            fetch_timeout: self.fetch_timeout,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_id(var: &'static str, raw: &str) -> Result<ObjectId, ConfigError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    if digits.len() != 64 {
        return Err(invalid(var, format!("expected 32 bytes of hex, got {} digits", digits.len())));
    }
    raw.parse().map_err(|e| invalid(var, e))
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| invalid(var, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(var, format!("unsupported scheme {other}"))),
    }
}

fn parse_url_list(
    var: &'static str,
    raw: Option<String>,
    defaults: &[&str],
) -> Result<Vec<Url>, ConfigError> {
    let urls = match raw {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| parse_url(var, s))
            .collect::<Result<Vec<_>, _>>()?,
        None => defaults
            .iter()
            .map(|s| parse_url(var, s))
            .collect::<Result<Vec<_>, _>>()?,
    };
    if urls.is_empty() {
        return Err(invalid(var, "no endpoints configured"));
    }
    Ok(urls)
}

fn parse_number<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match raw {
        Some(value) => value.parse().map_err(|e| invalid(var, e)),
        None => Ok(default),
    }
}

fn parse_secs(
    var: &'static str,
    raw: Option<String>,
    default: u64,
) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_number(var, raw, default)?;
    if secs == 0 {
        return Err(invalid(var, "must be positive"));
    }
    Ok(Duration::from_secs(secs))
}
