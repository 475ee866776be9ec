// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM JSON-RPC implementation of [`Ledger`].

use std::time::Duration;

use alloy::{
    network::Ethereum,
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::{RpcError, TransportError},
};
use async_trait::async_trait;

use super::erc20::{transfer_calldata, Erc20Contract};
use super::ledger::{
    Confirmation, Ledger, LedgerError, SubmissionError, SubmissionFailureKind,
};
use super::signing::wallet_from_signer;
use super::types::{NetworkConfig, DEFAULT_TOKEN_DECIMALS};

/// Interval between receipt polls while waiting for confirmation.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Ledger client for one EVM network, signing with the custodial key.
pub struct EvmLedger {
    /// Network configuration
    network: NetworkConfig,
    /// Custodial signer address
    signer: Address,
    /// Alloy HTTP provider with wallet and gas/chain-id fillers
    provider: DynProvider<Ethereum>,
    /// Upper bound on a single confirmation wait
    confirmation_timeout: Duration,
}

impl EvmLedger {
    /// Create a client for `network` that signs with `signer`.
    ///
    /// Nonces are always supplied by the caller; the provider's nonce filler
    /// only runs for transactions that arrive without one.
    pub fn connect(
        network: NetworkConfig,
        signer: PrivateKeySigner,
        confirmation_timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| LedgerError::InvalidRpcUrl(e.to_string()))?;

        let signer_address = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(wallet_from_signer(signer))
            .connect_http(url)
            .erased();

        Ok(Self {
            network,
            signer: signer_address,
            provider,
            confirmation_timeout,
        })
    }

    async fn submit(&self, tx: TransactionRequest) -> Result<TxHash, SubmissionError> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(classify_transport_error)?;

        Ok(*pending.tx_hash())
    }
}

/// Map a provider error onto the closed submission failure kinds.
fn classify_transport_error(err: TransportError) -> SubmissionError {
    match &err {
        RpcError::ErrorResp(payload) => SubmissionError::from_rpc_message(payload.message.to_string()),
        RpcError::Transport(_) => {
            SubmissionError::new(SubmissionFailureKind::Transient, err.to_string())
        }
        _ => SubmissionError::from_rpc_message(err.to_string()),
    }
}

#[async_trait]
impl Ledger for EvmLedger {
    fn network(&self) -> &NetworkConfig {
        &self.network
    }

    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn next_nonce(&self, address: Address) -> Result<u64, LedgerError> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| LedgerError::RpcError(e.to_string()))
    }

    async fn native_balance(&self, address: Address) -> Result<U256, LedgerError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| LedgerError::RpcError(e.to_string()))
    }

    async fn asset_balance(&self, asset: Address, holder: Address) -> Result<U256, LedgerError> {
        Erc20Contract::new(&self.provider, asset)
            .balance_of(holder)
            .await
    }

    async fn asset_decimals(&self, asset: Address) -> u8 {
        match Erc20Contract::new(&self.provider, asset).decimals().await {
            Ok(decimals) => decimals,
            Err(e) => {
                tracing::warn!(
                    network = %self.network.id,
                    asset = %asset,
                    error = %e,
                    "decimals() lookup failed, assuming {}",
                    DEFAULT_TOKEN_DECIMALS
                );
                DEFAULT_TOKEN_DECIMALS
            }
        }
    }

    async fn send_native(
        &self,
        to: Address,
        amount: U256,
        nonce: u64,
    ) -> Result<TxHash, SubmissionError> {
        let tx = TransactionRequest::default()
            .from(self.signer)
            .to(to)
            .value(amount)
            .nonce(nonce);

        self.submit(tx).await
    }

    async fn send_asset(
        &self,
        asset: Address,
        to: Address,
        amount: U256,
        nonce: u64,
    ) -> Result<TxHash, SubmissionError> {
        let tx = TransactionRequest::default()
            .from(self.signer)
            .to(asset)
            .input(transfer_calldata(to, amount).into())
            .nonce(nonce);

        self.submit(tx).await
    }

    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
    ) -> Result<Confirmation, LedgerError> {
        let confirmations = confirmations.max(1);
        let deadline = tokio::time::Instant::now() + self.confirmation_timeout;

        loop {
            match self.provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    if let Some(block_number) = receipt.block_number {
                        let head = self
                            .provider
                            .get_block_number()
                            .await
                            .map_err(|e| LedgerError::RpcError(e.to_string()))?;

                        if head.saturating_sub(block_number) + 1 >= confirmations {
                            return Ok(Confirmation {
                                block_number,
                                success: receipt.status(),
                            });
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(tx_hash = %tx_hash, error = %e, "Receipt poll failed");
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(LedgerError::ConfirmationTimeout {
                    tx_hash,
                    confirmations,
                });
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}
