// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded once from the environment at startup. Missing
//! required variables are fatal there and nowhere else.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SWAP_API_TOKEN` | Bearer token for authenticated routes | Required |
//! | `SIGNER_PRIVATE_KEY` | Custodial key, hex (optional `0x`) or PEM | Required |
//! | `TREASURY_ADDRESS` | Treasury account receiving fee shares | Required |
//! | `SWAP_NETWORKS` | Comma list of enabled network ids | `avalanche,fuji` |
//! | `RPC_URL_<NETWORK>` | RPC override, e.g. `RPC_URL_FUJI` | Built-in default |
//! | `WRAPPED_NATIVE_<NETWORK>` | Extra wrapped-native token addresses | None |
//! | `MIN_GAS_RESERVE_WEI` | Native balance kept for gas | `5000000000000000` |
//! | `SWAP_TASK_TIMEOUT_SECS` | Ceiling per queued swap task | `30` |
//! | `SWAP_STATE_RETENTION_SECS` | Swap state retention window | `1800` |
//! | `SWAP_STATE_CAPACITY` | Maximum tracked swaps | `10000` |
//! | `CONFIRMATION_TIMEOUT_SECS` | Receipt wait ceiling | `20` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, U256};

use crate::blockchain::{known_network, NetworkConfig};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const API_TOKEN_ENV: &str = "SWAP_API_TOKEN";
pub const SIGNER_KEY_ENV: &str = "SIGNER_PRIVATE_KEY";
pub const TREASURY_ENV: &str = "TREASURY_ADDRESS";
pub const NETWORKS_ENV: &str = "SWAP_NETWORKS";
pub const GAS_RESERVE_ENV: &str = "MIN_GAS_RESERVE_WEI";
pub const TASK_TIMEOUT_ENV: &str = "SWAP_TASK_TIMEOUT_SECS";
pub const STATE_RETENTION_ENV: &str = "SWAP_STATE_RETENTION_SECS";
pub const STATE_CAPACITY_ENV: &str = "SWAP_STATE_CAPACITY";
pub const CONFIRMATION_TIMEOUT_ENV: &str = "CONFIRMATION_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_NETWORKS: &str = "avalanche,fuji";
/// 0.005 of the native coin.
const DEFAULT_GAS_RESERVE_WEI: u64 = 5_000_000_000_000_000;
const DEFAULT_TASK_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STATE_RETENTION_SECS: u64 = 1_800;
const DEFAULT_STATE_CAPACITY: usize = 10_000;
const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 20;

/// Startup configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: String, reason: String },

    #[error("unknown network `{0}` in {NETWORKS_ENV}")]
    UnknownNetwork(String),

    #[error("{NETWORKS_ENV} enables no network")]
    NoNetworks,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
    }

    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Everything the engine needs to start.
#[derive(Clone)]
pub struct EngineConfig {
    pub bind_addr: SocketAddr,
    pub api_token: String,
    pub signer_key: String,
    pub treasury: Address,
    pub networks: Vec<NetworkConfig>,
    pub gas_reserve: U256,
    pub task_timeout: Duration,
    pub state_retention: Duration,
    pub state_capacity: usize,
    pub confirmation_timeout: Duration,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("bind_addr", &self.bind_addr)
            .field("api_token", &"<redacted>")
            .field("signer_key", &"<redacted>")
            .field("treasury", &self.treasury)
            .field("networks", &self.networks)
            .field("gas_reserve", &self.gas_reserve)
            .field("task_timeout", &self.task_timeout)
            .field("state_retention", &self.state_retention)
            .field("state_capacity", &self.state_capacity)
            .field("confirmation_timeout", &self.confirmation_timeout)
            .finish()
    }
}

impl EngineConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(PORT_ENV, var(PORT_ENV), DEFAULT_PORT)?;
        let bind_addr = format!("{host}:{port}")
            .parse()
            .map_err(|e: std::net::AddrParseError| invalid(HOST_ENV, e))?;

        let api_token = required(API_TOKEN_ENV)?;
        let signer_key = required(SIGNER_KEY_ENV)?;
        let treasury = Address::from_str(&required(TREASURY_ENV)?)
            .map_err(|e| invalid(TREASURY_ENV, e))?;

        let networks = var(NETWORKS_ENV).unwrap_or_else(|| DEFAULT_NETWORKS.to_string());
        let networks = load_networks(&networks, &var)?;

        let gas_reserve = match var(GAS_RESERVE_ENV) {
            Some(raw) => U256::from_str_radix(&raw, 10).map_err(|e| invalid(GAS_RESERVE_ENV, e))?,
            None => U256::from(DEFAULT_GAS_RESERVE_WEI),
        };

        let secs = |name: &str, default: u64| -> Result<Duration, ConfigError> {
            parse_or(name, var(name), default).map(Duration::from_secs)
        };

        Ok(Self {
            bind_addr,
            api_token,
            signer_key,
            treasury,
            networks,
            gas_reserve,
            task_timeout: secs(TASK_TIMEOUT_ENV, DEFAULT_TASK_TIMEOUT_SECS)?,
            state_retention: secs(STATE_RETENTION_ENV, DEFAULT_STATE_RETENTION_SECS)?,
            state_capacity: parse_or(
                STATE_CAPACITY_ENV,
                var(STATE_CAPACITY_ENV),
                DEFAULT_STATE_CAPACITY,
            )?,
            confirmation_timeout: secs(CONFIRMATION_TIMEOUT_ENV, DEFAULT_CONFIRMATION_TIMEOUT_SECS)?,
        })
    }
}

fn load_networks<V>(list: &str, var: &V) -> Result<Vec<NetworkConfig>, ConfigError>
where
    V: Fn(&str) -> Option<String>,
{
    let mut networks: Vec<NetworkConfig> = Vec::new();

    for id in list.split(',').map(str::trim).filter(|id| !id.is_empty()) {
        let known = known_network(id).ok_or_else(|| ConfigError::UnknownNetwork(id.to_string()))?;
        if networks.iter().any(|n| n.id == known.id) {
            continue;
        }

        let suffix = known.id.to_ascii_uppercase();
        let rpc_name = format!("RPC_URL_{suffix}");
        let rpc_url = var(&rpc_name);
        if let Some(url) = &rpc_url {
            url::Url::parse(url).map_err(|e| invalid(&rpc_name, e))?;
        }

        let wrapped_name = format!("WRAPPED_NATIVE_{suffix}");
        let extra_wrapped = match var(&wrapped_name) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(Address::from_str)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| invalid(&wrapped_name, e))?,
            None => Vec::new(),
        };

        networks.push(known.configure(rpc_url, &extra_wrapped));
    }

    if networks.is_empty() {
        return Err(ConfigError::NoNetworks);
    }
    Ok(networks)
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse().map_err(|e| invalid(name, e)),
        None => Ok(default),
    }
}

fn invalid(var: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        var: var.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TREASURY: &str = "0x0000000000000000000000000000000000007777";

    fn load(vars: &[(&str, &str)]) -> Result<EngineConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|name| vars.get(name).cloned())
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            (API_TOKEN_ENV, "token"),
            (SIGNER_KEY_ENV, "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"),
            (TREASURY_ENV, TREASURY),
        ]
    }

    #[test]
    fn defaults_apply() {
        let config = load(&base()).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.gas_reserve, U256::from(DEFAULT_GAS_RESERVE_WEI));
        assert_eq!(config.task_timeout, Duration::from_secs(30));
        assert_eq!(config.state_retention, Duration::from_secs(1800));
        assert_eq!(config.state_capacity, 10_000);
        assert_eq!(config.confirmation_timeout, Duration::from_secs(20));

        let ids: Vec<&str> = config.networks.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["avalanche", "fuji"]);
    }

    #[test]
    fn required_variables_are_enforced() {
        for missing in [API_TOKEN_ENV, SIGNER_KEY_ENV, TREASURY_ENV] {
            let vars: Vec<_> = base().into_iter().filter(|(k, _)| *k != missing).collect();
            assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing(missing));
        }
    }

    #[test]
    fn network_overrides() {
        let mut vars = base();
        vars.push((NETWORKS_ENV, "fuji, ethereum,fuji"));
        vars.push(("RPC_URL_FUJI", "http://127.0.0.1:9650/ext/bc/C/rpc"));
        vars.push((
            "WRAPPED_NATIVE_ETHEREUM",
            "0x000000000000000000000000000000000000beef",
        ));

        let config = load(&vars).unwrap();
        assert_eq!(config.networks.len(), 2);
        assert_eq!(config.networks[0].rpc_url, "http://127.0.0.1:9650/ext/bc/C/rpc");
        assert_eq!(config.networks[1].id, "ethereum");
        assert_eq!(config.networks[1].wrapped_native.len(), 2);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut vars = base();
        vars.push((NETWORKS_ENV, "solana"));
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::UnknownNetwork("solana".into())
        );

        let mut vars = base();
        vars.push((PORT_ENV, "eighty"));
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { var, .. }) if var == PORT_ENV));

        let mut vars = base();
        vars.push((GAS_RESERVE_ENV, "1e18"));
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { .. })));

        let mut vars = base();
        vars.push((NETWORKS_ENV, " , "));
        assert_eq!(load(&vars).unwrap_err(), ConfigError::NoNetworks);
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = load(&base()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("ac0974"));
        assert!(!debug.contains("\"token\""));
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::parse(Some("JSON")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(None), LogFormat::Pretty);
    }
}
