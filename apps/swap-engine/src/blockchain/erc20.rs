// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ERC-20 token contract interactions.

use alloy::{
    primitives::{Address, Bytes, U256},
    providers::Provider,
    sol,
    sol_types::SolCall,
};

use super::ledger::LedgerError;

// Define the ERC-20 interface using alloy's sol! macro
sol! {
    #[sol(rpc)]
    interface IERC20 {
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// ERC-20 contract wrapper.
pub struct Erc20Contract<P> {
    contract: IERC20::IERC20Instance<P>,
}

impl<P: Provider + Clone> Erc20Contract<P> {
    /// Create a new ERC-20 contract instance.
    pub fn new(provider: &P, address: Address) -> Self {
        let contract = IERC20::new(address, provider.clone());
        Self { contract }
    }

    /// Get the token decimals.
    pub async fn decimals(&self) -> Result<u8, LedgerError> {
        self.contract
            .decimals()
            .call()
            .await
            .map_err(|e| LedgerError::ContractError(e.to_string()))
    }

    /// Get the raw balance of an address.
    pub async fn balance_of(&self, holder: Address) -> Result<U256, LedgerError> {
        self.contract
            .balanceOf(holder)
            .call()
            .await
            .map_err(|e| LedgerError::ContractError(e.to_string()))
    }
}

/// ABI-encode `transfer(to, amount)`.
pub fn transfer_calldata(to: Address, amount: U256) -> Bytes {
    IERC20::transferCall { to, amount }.abi_encode().into()
}
