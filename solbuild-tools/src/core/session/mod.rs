// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Uniform access to a chain, either simulated in-process or remote over JSON-RPC.
//!
//! A session is opened for one pipeline invocation and must be closed on every exit path.
//! [`NetworkSession`] logs a warning if it is dropped without being closed.

use std::{fmt, time::Duration};

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, TxHash, U256},
    rpc::types::TransactionRequest,
};
use futures::future::try_join_all;
use reqwest::Url;

use crate::core::{
    credentials::{CredentialError, CredentialProvider},
    profile::NetworkProfile,
};

pub use remote::RemoteSession;
pub use simulated::{SimulatedChain, SimulatedSession, SIMULATED_CHAIN_ID};

pub mod remote;
pub mod simulated;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to connect to {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },
    #[error("{operation} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
    #[error("missing credentials: {0}")]
    MissingCredentials(#[from] CredentialError),
    #[error("endpoint {endpoint} reports chain id {actual}, but {expected} is configured")]
    ChainIdMismatch {
        endpoint: String,
        expected: u64,
        actual: u64,
    },

    #[error("rpc error: {0}")]
    Rpc(#[from] alloy::transports::RpcError<alloy::transports::TransportErrorKind>),
    #[error("pending transaction error: {0}")]
    PendingTransaction(#[from] alloy::providers::PendingTransactionError),

    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("no account is configured to send transactions from")]
    NoAccount,
    #[error("{0} is not supported by the simulated chain")]
    Unsupported(&'static str),
    #[error("session is closed")]
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionKind {
    Simulated,
    Remote,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulated => f.write_str("simulated"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

/// Read-only requests against chain state.
#[derive(Clone, Debug)]
pub enum Query {
    ChainId,
    BlockNumber,
    Balance(Address),
    Code(Address),
    Nonce(Address),
    Call(TransactionRequest),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryResponse {
    ChainId(u64),
    BlockNumber(u64),
    Balance(U256),
    Code(Bytes),
    Nonce(u64),
    Call(Bytes),
}

/// Result of an included transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOutcome {
    pub tx_hash: TxHash,
    pub contract_address: Option<Address>,
    pub gas_used: u64,
    pub block_number: Option<u64>,
}

/// Operations shared by every kind of session.
#[allow(async_fn_in_trait)]
pub trait Session {
    fn network(&self) -> &str;

    fn kind(&self) -> SessionKind;

    /// JSON-RPC endpoint, if the session has one.
    fn rpc_url(&self) -> Option<&Url>;

    /// Accounts transactions can be sent from, the first being the default sender.
    fn accounts(&self) -> &[Address];

    /// Send a transaction and wait for its inclusion.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxOutcome, SessionError>;

    async fn query(&self, query: Query) -> Result<QueryResponse, SessionError>;

    /// Release the session. Calling this more than once is a no-op.
    async fn close(&mut self) -> Result<(), SessionError>;

    /// Send transactions that do not depend on each other.
    ///
    /// Nonces are assigned up-front from the sender's pending transaction count, so the
    /// transactions can be in flight at the same time without conflicting. Transactions that
    /// depend on each other must go through [`Session::send_transaction`] one at a time.
    async fn send_independent(
        &self,
        txs: Vec<TransactionRequest>,
    ) -> Result<Vec<TxOutcome>, SessionError> {
        let Some(&default_sender) = self.accounts().first() else {
            return Err(SessionError::NoAccount);
        };
        let mut next_nonce = std::collections::HashMap::<Address, u64>::new();
        let mut prepared = Vec::with_capacity(txs.len());
        for tx in txs {
            let from = tx.from.unwrap_or(default_sender);
            let nonce = match next_nonce.get(&from) {
                Some(nonce) => *nonce,
                None => self.nonce(from).await?,
            };
            next_nonce.insert(from, nonce + 1);
            prepared.push(tx.with_from(from).with_nonce(nonce));
        }
        try_join_all(prepared.into_iter().map(|tx| self.send_transaction(tx))).await
    }

    async fn chain_id(&self) -> Result<u64, SessionError> {
        match self.query(Query::ChainId).await? {
            QueryResponse::ChainId(id) => Ok(id),
            other => Err(unexpected(other)),
        }
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, SessionError> {
        match self.query(Query::Code(address)).await? {
            QueryResponse::Code(code) => Ok(code),
            other => Err(unexpected(other)),
        }
    }

    async fn balance(&self, address: Address) -> Result<U256, SessionError> {
        match self.query(Query::Balance(address)).await? {
            QueryResponse::Balance(balance) => Ok(balance),
            other => Err(unexpected(other)),
        }
    }

    async fn nonce(&self, address: Address) -> Result<u64, SessionError> {
        match self.query(Query::Nonce(address)).await? {
            QueryResponse::Nonce(nonce) => Ok(nonce),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(response: QueryResponse) -> SessionError {
    SessionError::Rejected(format!("unexpected query response: {response:?}"))
}

/// Opens sessions for resolved profiles.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Session: Session;

    async fn open(&self, profile: &NetworkProfile) -> Result<Self::Session, SessionError>;
}

/// Connector resolving account credentials through a [`CredentialProvider`].
#[derive(Debug)]
pub struct NetworkConnector<P> {
    credentials: P,
}

impl<P: CredentialProvider> NetworkConnector<P> {
    pub fn new(credentials: P) -> Self {
        Self { credentials }
    }
}

impl<P: CredentialProvider> Connector for NetworkConnector<P> {
    type Session = NetworkSession;

    async fn open(&self, profile: &NetworkProfile) -> Result<NetworkSession, SessionError> {
        NetworkSession::open(profile, &self.credentials).await
    }
}

#[derive(Debug)]
enum Backend {
    Simulated(SimulatedSession),
    Remote(RemoteSession),
}

/// A live session against the network of a resolved profile.
#[derive(Debug)]
pub struct NetworkSession {
    backend: Backend,
    closed: bool,
}

impl NetworkSession {
    /// Open a session for `profile`.
    ///
    /// Profiles without an endpoint start a fresh in-process simulated chain and never touch the
    /// network. Remote profiles resolve their credentials first and then query the endpoint,
    /// bounded by the profile timeout.
    pub async fn open(
        profile: &NetworkProfile,
        credentials: &impl CredentialProvider,
    ) -> Result<Self, SessionError> {
        let backend = match &profile.endpoint {
            None => Backend::Simulated(SimulatedSession::start(profile, credentials)?),
            Some(endpoint) => {
                Backend::Remote(RemoteSession::connect(profile, endpoint, credentials).await?)
            }
        };
        let session = Self {
            backend,
            closed: false,
        };
        info!(
            @grey,
            "Opened {} session on network '{}'",
            session.kind(),
            session.network()
        );
        Ok(session)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Session for NetworkSession {
    fn network(&self) -> &str {
        match &self.backend {
            Backend::Simulated(session) => session.network(),
            Backend::Remote(session) => session.network(),
        }
    }

    fn kind(&self) -> SessionKind {
        match &self.backend {
            Backend::Simulated(_) => SessionKind::Simulated,
            Backend::Remote(_) => SessionKind::Remote,
        }
    }

    fn rpc_url(&self) -> Option<&Url> {
        match &self.backend {
            Backend::Simulated(_) => None,
            Backend::Remote(session) => session.rpc_url(),
        }
    }

    fn accounts(&self) -> &[Address] {
        match &self.backend {
            Backend::Simulated(session) => session.accounts(),
            Backend::Remote(session) => session.accounts(),
        }
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxOutcome, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        match &self.backend {
            Backend::Simulated(session) => session.send_transaction(tx).await,
            Backend::Remote(session) => session.send_transaction(tx).await,
        }
    }

    async fn query(&self, query: Query) -> Result<QueryResponse, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        match &self.backend {
            Backend::Simulated(session) => session.query(query).await,
            Backend::Remote(session) => session.query(query).await,
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match &mut self.backend {
            Backend::Simulated(session) => session.close().await?,
            Backend::Remote(session) => session.close().await?,
        }
        debug!(@grey, "Closed session on network '{}'", self.network());
        Ok(())
    }
}

impl Drop for NetworkSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!(@yellow, "session on network '{}' dropped without being closed", self.network());
        }
    }
}
