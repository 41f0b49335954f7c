// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::{
    future::{Future, IntoFuture},
    time::Duration,
};

use alloy::{
    network::{Ethereum, EthereumWallet, TransactionBuilder},
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::{local::PrivateKeySigner, Signer},
};
use reqwest::Url;
use tokio::time::timeout;

use super::{Query, QueryResponse, Session, SessionError, SessionKind, TxOutcome};
use crate::core::{
    credentials::{resolve_signers, CredentialProvider},
    profile::NetworkProfile,
};

/// Session against a JSON-RPC endpoint.
#[derive(Debug)]
pub struct RemoteSession {
    network: String,
    endpoint: Url,
    provider: Option<DynProvider<Ethereum>>,
    accounts: Vec<Address>,
    timeout: Duration,
}

impl RemoteSession {
    /// Resolve credentials, then connect and confirm the endpoint answers within the timeout.
    pub async fn connect(
        profile: &NetworkProfile,
        endpoint: &Url,
        credentials: &impl CredentialProvider,
    ) -> Result<Self, SessionError> {
        let signers = resolve_signers(credentials, &profile.accounts)?;

        let reader = ProviderBuilder::new().connect_http(endpoint.clone());
        let chain_id = match timeout(profile.timeout, reader.get_chain_id()).await {
            Err(_) => {
                return Err(SessionError::Timeout {
                    operation: "connecting",
                    timeout: profile.timeout,
                })
            }
            Ok(Err(err)) => {
                return Err(SessionError::Connection {
                    endpoint: endpoint.to_string(),
                    reason: err.to_string(),
                })
            }
            Ok(Ok(chain_id)) => chain_id,
        };
        if let Some(expected) = profile.chain_id {
            if expected != chain_id {
                return Err(SessionError::ChainIdMismatch {
                    endpoint: endpoint.to_string(),
                    expected,
                    actual: chain_id,
                });
            }
        }
        debug!(@grey, "endpoint {endpoint} reports chain id {chain_id}");

        let accounts = signers.iter().map(|signer| signer.address()).collect();
        let provider = match build_wallet(signers, chain_id) {
            Some(wallet) => ProviderBuilder::new()
                .wallet(wallet)
                .connect_http(endpoint.clone())
                .erased(),
            None => reader.erased(),
        };

        Ok(Self {
            network: profile.name.clone(),
            endpoint: endpoint.clone(),
            provider: Some(provider),
            accounts,
            timeout: profile.timeout,
        })
    }

    fn provider(&self) -> Result<&DynProvider<Ethereum>, SessionError> {
        self.provider.as_ref().ok_or(SessionError::Closed)
    }

    /// Await a request, bounded by the session timeout.
    async fn bounded<T, E>(
        &self,
        operation: &'static str,
        request: impl Future<Output = Result<T, E>>,
    ) -> Result<T, SessionError>
    where
        SessionError: From<E>,
    {
        match timeout(self.timeout, request).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(SessionError::Timeout {
                operation,
                timeout: self.timeout,
            }),
        }
    }
}

fn build_wallet(signers: Vec<PrivateKeySigner>, chain_id: u64) -> Option<EthereumWallet> {
    let mut signers = signers
        .into_iter()
        .map(|signer| signer.with_chain_id(Some(chain_id)));
    let mut wallet = EthereumWallet::new(signers.next()?);
    for signer in signers {
        wallet.register_signer(signer);
    }
    Some(wallet)
}

impl Session for RemoteSession {
    fn network(&self) -> &str {
        &self.network
    }

    fn kind(&self) -> SessionKind {
        SessionKind::Remote
    }

    fn rpc_url(&self) -> Option<&Url> {
        Some(&self.endpoint)
    }

    fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxOutcome, SessionError> {
        let Some(&default_sender) = self.accounts.first() else {
            return Err(SessionError::NoAccount);
        };
        let tx = match tx.from {
            Some(_) => tx,
            None => tx.with_from(default_sender),
        };
        let provider = self.provider()?;
        let pending = self
            .bounded("sending transaction", provider.send_transaction(tx))
            .await?;
        let tx_hash = *pending.tx_hash();
        debug!(@grey, "sent transaction {tx_hash}");
        let receipt = self
            .bounded("waiting for receipt", pending.get_receipt())
            .await?;
        if !receipt.status() {
            return Err(SessionError::Reverted(tx_hash));
        }
        Ok(TxOutcome {
            tx_hash,
            contract_address: receipt.contract_address,
            gas_used: receipt.gas_used,
            block_number: receipt.block_number,
        })
    }

    async fn query(&self, query: Query) -> Result<QueryResponse, SessionError> {
        let provider = self.provider()?;
        Ok(match query {
            Query::ChainId => {
                QueryResponse::ChainId(self.bounded("eth_chainId", provider.get_chain_id()).await?)
            }
            Query::BlockNumber => QueryResponse::BlockNumber(
                self.bounded("eth_blockNumber", provider.get_block_number())
                    .await?,
            ),
            Query::Balance(address) => QueryResponse::Balance(
                self.bounded("eth_getBalance", provider.get_balance(address).into_future())
                    .await?,
            ),
            Query::Code(address) => QueryResponse::Code(
                self.bounded("eth_getCode", provider.get_code_at(address).into_future())
                    .await?,
            ),
            Query::Nonce(address) => QueryResponse::Nonce(
                self.bounded(
                    "eth_getTransactionCount",
                    provider.get_transaction_count(address).pending().into_future(),
                )
                .await?,
            ),
            Query::Call(tx) => QueryResponse::Call(
                self.bounded("eth_call", provider.call(tx).into_future())
                    .await?,
            ),
        })
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        // dropping the provider releases its connection pool
        self.provider.take();
        Ok(())
    }
}
