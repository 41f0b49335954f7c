// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! In-process simulated chain.
//!
//! The chain keeps a ledger of balances, nonces and deployed code. It does not execute EVM code:
//! a contract creation stores the init code at the derived address and calls only move value.

use std::{collections::HashMap, sync::Arc};

use alloy::{
    primitives::{keccak256, Address, Bytes, TxKind, B256, U256},
    rpc::types::TransactionRequest,
};
use parking_lot::Mutex;
use reqwest::Url;

use super::{Query, QueryResponse, Session, SessionError, SessionKind, TxOutcome};
use crate::core::{
    credentials::{resolve_signers, CredentialProvider},
    profile::NetworkProfile,
};

pub const SIMULATED_CHAIN_ID: u64 = 31337;

const TX_BASE_GAS: u64 = 21_000;
const TX_CREATE_GAS: u64 = 32_000;
const TX_DATA_ZERO_GAS: u64 = 4;
const TX_DATA_NON_ZERO_GAS: u64 = 16;

/// Well-known development accounts funded when a profile lists no accounts of its own.
pub const DEV_ACCOUNTS: [Address; 3] = [
    alloy::primitives::address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
    alloy::primitives::address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8"),
    alloy::primitives::address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"),
];

fn dev_balance() -> U256 {
    U256::from(10_000u64) * U256::from(1_000_000_000_000_000_000u64)
}

#[derive(Debug, Default)]
struct AccountState {
    nonce: u64,
    balance: U256,
    code: Bytes,
}

#[derive(Debug, Default)]
struct ChainState {
    block_number: u64,
    accounts: HashMap<Address, AccountState>,
}

/// Ephemeral chain state, shared by every session attached to it.
#[derive(Debug, Default)]
pub struct SimulatedChain {
    state: Mutex<ChainState>,
}

impl SimulatedChain {
    /// Start a chain with each of `accounts` funded.
    pub fn new(accounts: &[Address]) -> Arc<Self> {
        let chain = Self::default();
        {
            let mut state = chain.state.lock();
            for account in accounts {
                state.accounts.entry(*account).or_default().balance = dev_balance();
            }
        }
        Arc::new(chain)
    }

    pub fn block_number(&self) -> u64 {
        self.state.lock().block_number
    }

    fn apply(&self, from: Address, tx: &TransactionRequest) -> Result<TxOutcome, SessionError> {
        let mut state = self.state.lock();
        let input = tx.input.input().cloned().unwrap_or_default();
        let value = tx.value.unwrap_or_default();

        let sender = state.accounts.entry(from).or_default();
        let nonce = sender.nonce;
        if let Some(requested) = tx.nonce {
            if requested != nonce {
                return Err(SessionError::Rejected(format!(
                    "nonce {requested} does not match the next nonce {nonce} of {from}"
                )));
            }
        }
        if sender.balance < value {
            return Err(SessionError::Rejected(format!(
                "{from} cannot transfer {value} wei"
            )));
        }
        sender.balance -= value;
        sender.nonce += 1;

        let mut gas_used = TX_BASE_GAS
            + input
                .iter()
                .map(|byte| match byte {
                    0 => TX_DATA_ZERO_GAS,
                    _ => TX_DATA_NON_ZERO_GAS,
                })
                .sum::<u64>();
        let contract_address = match tx.to {
            None | Some(TxKind::Create) => {
                gas_used += TX_CREATE_GAS;
                let address = from.create(nonce);
                let account = state.accounts.entry(address).or_default();
                account.balance += value;
                account.code = input.clone();
                Some(address)
            }
            Some(TxKind::Call(to)) => {
                state.accounts.entry(to).or_default().balance += value;
                None
            }
        };

        state.block_number += 1;
        let mut preimage = Vec::with_capacity(20 + 8 + 8 + input.len());
        preimage.extend_from_slice(from.as_slice());
        preimage.extend_from_slice(&nonce.to_be_bytes());
        preimage.extend_from_slice(&SIMULATED_CHAIN_ID.to_be_bytes());
        preimage.extend_from_slice(&input);
        let tx_hash: B256 = keccak256(&preimage);

        Ok(TxOutcome {
            tx_hash,
            contract_address,
            gas_used,
            block_number: Some(state.block_number),
        })
    }

    fn query(&self, query: Query) -> Result<QueryResponse, SessionError> {
        let state = self.state.lock();
        let account = |address: &Address| state.accounts.get(address);
        Ok(match query {
            Query::ChainId => QueryResponse::ChainId(SIMULATED_CHAIN_ID),
            Query::BlockNumber => QueryResponse::BlockNumber(state.block_number),
            Query::Balance(address) => {
                QueryResponse::Balance(account(&address).map(|a| a.balance).unwrap_or_default())
            }
            Query::Code(address) => QueryResponse::Code(
                account(&address)
                    .map(|a| a.code.clone())
                    .unwrap_or_default(),
            ),
            Query::Nonce(address) => {
                QueryResponse::Nonce(account(&address).map(|a| a.nonce).unwrap_or_default())
            }
            Query::Call(_) => return Err(SessionError::Unsupported("eth_call")),
        })
    }
}

/// Session attached to a [`SimulatedChain`].
#[derive(Debug)]
pub struct SimulatedSession {
    network: String,
    chain: Arc<SimulatedChain>,
    accounts: Vec<Address>,
}

impl SimulatedSession {
    /// Start a fresh chain for `profile`.
    ///
    /// Accounts listed in the profile are resolved and funded. Without any, the development
    /// accounts are used instead.
    pub fn start(
        profile: &NetworkProfile,
        credentials: &impl CredentialProvider,
    ) -> Result<Self, SessionError> {
        let accounts: Vec<Address> = if profile.accounts.is_empty() {
            DEV_ACCOUNTS.to_vec()
        } else {
            resolve_signers(credentials, &profile.accounts)?
                .iter()
                .map(|signer| signer.address())
                .collect()
        };
        let chain = SimulatedChain::new(&accounts);
        Ok(Self::attach(&profile.name, chain, accounts))
    }

    /// Attach to a chain that is already running.
    pub fn attach(
        network: impl Into<String>,
        chain: Arc<SimulatedChain>,
        accounts: Vec<Address>,
    ) -> Self {
        Self {
            network: network.into(),
            chain,
            accounts,
        }
    }

    pub fn chain(&self) -> &Arc<SimulatedChain> {
        &self.chain
    }
}

impl Session for SimulatedSession {
    fn network(&self) -> &str {
        &self.network
    }

    fn kind(&self) -> SessionKind {
        SessionKind::Simulated
    }

    fn rpc_url(&self) -> Option<&Url> {
        None
    }

    fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxOutcome, SessionError> {
        let from = tx
            .from
            .or_else(|| self.accounts.first().copied())
            .ok_or(SessionError::NoAccount)?;
        if !self.accounts.contains(&from) {
            return Err(SessionError::Rejected(format!(
                "{from} is not an account of this session"
            )));
        }
        self.chain.apply(from, &tx)
    }

    async fn query(&self, query: Query) -> Result<QueryResponse, SessionError> {
        self.chain.query(query)
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}
