// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use std::str::FromStr;

use alloy::primitives::{address, Address};

/// EVM network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Identifier used in swap requests (e.g. `avalanche`)
    pub id: String,
    /// Network name for display
    pub name: String,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Block explorer URL
    pub explorer_url: String,
    /// Token contracts that wrap the native coin. Sends of these are
    /// delivered as native coin.
    pub wrapped_native: Vec<Address>,
}

impl NetworkConfig {
    /// Whether `asset` is one of this network's wrapped-native contracts.
    pub fn is_wrapped_native(&self, asset: &Address) -> bool {
        self.wrapped_native.contains(asset)
    }

    /// Explorer link for a transaction hash.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_hash)
    }
}

/// Static description of a network this build knows how to reach.
#[derive(Debug, Clone, Copy)]
pub struct KnownNetwork {
    pub id: &'static str,
    pub name: &'static str,
    pub chain_id: u64,
    pub rpc_url: &'static str,
    pub explorer_url: &'static str,
    pub wrapped_native: &'static [Address],
}

impl KnownNetwork {
    /// Materialize the runtime configuration, optionally overriding the RPC URL
    /// and adding extra wrapped-native contracts.
    pub fn configure(&self, rpc_url: Option<String>, extra_wrapped: &[Address]) -> NetworkConfig {
        let mut wrapped_native = self.wrapped_native.to_vec();
        for addr in extra_wrapped {
            if !wrapped_native.contains(addr) {
                wrapped_native.push(*addr);
            }
        }

        NetworkConfig {
            id: self.id.to_string(),
            name: self.name.to_string(),
            chain_id: self.chain_id,
            rpc_url: rpc_url.unwrap_or_else(|| self.rpc_url.to_string()),
            explorer_url: self.explorer_url.to_string(),
            wrapped_native,
        }
    }
}

/// Ethereum mainnet.
pub const ETHEREUM: KnownNetwork = KnownNetwork {
    id: "ethereum",
    name: "Ethereum Mainnet",
    chain_id: 1,
    rpc_url: "https://ethereum-rpc.publicnode.com",
    explorer_url: "https://etherscan.io",
    // WETH
    wrapped_native: &[address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2")],
};

/// BNB Smart Chain.
pub const BSC: KnownNetwork = KnownNetwork {
    id: "bsc",
    name: "BNB Smart Chain",
    chain_id: 56,
    rpc_url: "https://bsc-dataseed.bnbchain.org",
    explorer_url: "https://bscscan.com",
    // WBNB
    wrapped_native: &[address!("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c")],
};

/// Polygon PoS.
pub const POLYGON: KnownNetwork = KnownNetwork {
    id: "polygon",
    name: "Polygon PoS",
    chain_id: 137,
    rpc_url: "https://polygon-rpc.com",
    explorer_url: "https://polygonscan.com",
    // WPOL (formerly WMATIC)
    wrapped_native: &[address!("0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270")],
};

/// Avalanche C-Chain Mainnet.
pub const AVALANCHE: KnownNetwork = KnownNetwork {
    id: "avalanche",
    name: "Avalanche C-Chain",
    chain_id: 43114,
    rpc_url: "https://api.avax.network/ext/bc/C/rpc",
    explorer_url: "https://snowtrace.io",
    // WAVAX
    wrapped_native: &[address!("B31f66AA3C1e785363F0875A1B74E27b85FD66c7")],
};

/// Avalanche Fuji Testnet.
pub const FUJI: KnownNetwork = KnownNetwork {
    id: "fuji",
    name: "Avalanche Fuji Testnet",
    chain_id: 43113,
    rpc_url: "https://api.avax-test.network/ext/bc/C/rpc",
    explorer_url: "https://testnet.snowtrace.io",
    // WAVAX (Fuji)
    wrapped_native: &[address!("d00ae08403B9bbb9124bB305C09058E32C39A48c")],
};

/// Every network this build can be configured for.
pub const KNOWN_NETWORKS: &[KnownNetwork] = &[ETHEREUM, BSC, POLYGON, AVALANCHE, FUJI];

/// Look up a known network by identifier (case-insensitive).
pub fn known_network(id: &str) -> Option<&'static KnownNetwork> {
    let id = id.trim();
    KNOWN_NETWORKS
        .iter()
        .find(|network| network.id.eq_ignore_ascii_case(id))
}

/// Placeholder address some integrations use for the native coin.
const NATIVE_PLACEHOLDER: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Asset identifier as it appears in a swap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetId {
    /// The chain's native coin.
    Native,
    /// A token contract.
    Contract(Address),
}

impl AssetId {
    /// Resolve how a transfer of this asset is carried out on `network`.
    pub fn resolve(&self, network: &NetworkConfig) -> AssetKind {
        match self {
            AssetId::Native => AssetKind::Native,
            AssetId::Contract(addr) if network.is_wrapped_native(addr) => {
                AssetKind::WrappedNative(*addr)
            }
            AssetId::Contract(addr) => AssetKind::Token(*addr),
        }
    }
}

impl FromStr for AssetId {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("native") {
            return Ok(AssetId::Native);
        }

        let addr = Address::from_str(raw).map_err(|e| format!("Invalid asset `{raw}`: {e}"))?;
        if addr == Address::ZERO || addr == NATIVE_PLACEHOLDER {
            Ok(AssetId::Native)
        } else {
            Ok(AssetId::Contract(addr))
        }
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetId::Native => write!(f, "native"),
            AssetId::Contract(addr) => write!(f, "{addr}"),
        }
    }
}

/// How an asset movement is executed on a specific network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Native,
    /// Requested as the wrapped token, delivered as native coin.
    WrappedNative(Address),
    Token(Address),
}

/// Decimals of every EVM native coin.
pub const NATIVE_DECIMALS: u8 = 18;

/// Decimals assumed when a token's `decimals()` lookup fails.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;
