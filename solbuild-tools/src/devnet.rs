// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Disposable Anvil node for exercising remote sessions against a real JSON-RPC endpoint.

use eyre::{Result, WrapErr};
use reqwest::{header::HeaderValue, Method, Response};
use testcontainers::{
    core::{wait::HttpWaitStrategy, IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

/// First prefunded Anvil account.
pub const DEVNET_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const DEVNET_CHAIN_ID: u64 = 31337;

const ANVIL_IMAGE_NAME: &str = "ghcr.io/foundry-rs/foundry";
const ANVIL_IMAGE_TAG: &str = "v1.2.3";
const ANVIL_PORT: u16 = 8545;

/// A running Anvil container. The container is stopped when this is dropped.
pub struct Node {
    _container: ContainerAsync<GenericImage>,
    rpc: String,
}

impl Node {
    pub async fn new() -> Result<Self> {
        let wait_strategy = HttpWaitStrategy::new("/")
            .with_port(ANVIL_PORT.into())
            .with_method(Method::POST)
            .with_header("Content-Type", HeaderValue::from_static("application/json"))
            .with_body(r#"{"jsonrpc":"2.0","method":"eth_chainId","params":[],"id":1}"#)
            .with_response_matcher_async(rpc_response_matcher);
        let container = GenericImage::new(ANVIL_IMAGE_NAME, ANVIL_IMAGE_TAG)
            .with_exposed_port(ANVIL_PORT.tcp())
            .with_wait_for(WaitFor::Http(wait_strategy))
            .with_entrypoint("anvil")
            .with_cmd(vec!["--host", "0.0.0.0"])
            .start()
            .await
            .wrap_err("failed to start Anvil container")?;
        let port = container
            .get_host_port_ipv4(ANVIL_PORT)
            .await
            .wrap_err("failed to get Anvil RPC port")?;
        Ok(Node {
            _container: container,
            rpc: format!("http://localhost:{port}"),
        })
    }

    pub fn rpc(&self) -> &str {
        &self.rpc
    }
}

async fn rpc_response_matcher(response: Response) -> bool {
    let Ok(text) = response.text().await else {
        return false;
    };
    text.contains("result")
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use alloy::{network::TransactionBuilder, primitives::Bytes, rpc::types::TransactionRequest};

    use super::*;
    use crate::core::{
        credentials::{tests::StaticCredentials, CredentialRef},
        profile::NetworkProfile,
        session::{NetworkSession, Session, SessionError, SessionKind},
    };

    // returns a single STOP byte as runtime code
    const INIT_CODE: [u8; 13] = [
        0x60, 0x01, 0x60, 0x0c, 0x60, 0x00, 0x39, 0x60, 0x01, 0x60, 0x00, 0xf3, 0x00,
    ];

    fn profile(rpc: &str, chain_id: Option<u64>) -> NetworkProfile {
        NetworkProfile {
            name: "devnet".into(),
            endpoint: Some(rpc.parse().unwrap()),
            accounts: vec![CredentialRef::Env("DEVNET_KEY".into())],
            timeout: Duration::from_secs(10),
            is_default: false,
            chain_id,
        }
    }

    fn credentials() -> StaticCredentials {
        StaticCredentials(HashMap::from([(
            CredentialRef::Env("DEVNET_KEY".into()),
            DEVNET_PRIVATE_KEY.to_string(),
        )]))
    }

    #[tokio::test]
    async fn remote_session_deploys_concurrently() -> Result<()> {
        let devnode = Node::new().await?;
        let mut session =
            NetworkSession::open(&profile(devnode.rpc(), Some(DEVNET_CHAIN_ID)), &credentials())
                .await?;
        assert_eq!(session.kind(), SessionKind::Remote);

        let deploy = || TransactionRequest::default().with_deploy_code(Bytes::from(INIT_CODE));
        let outcomes = session
            .send_independent(vec![deploy(), deploy(), deploy()])
            .await?;
        let sender = session.accounts()[0];
        for (nonce, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.contract_address, Some(sender.create(nonce as u64)));
            let code = session.code_at(sender.create(nonce as u64)).await?;
            assert_eq!(code, Bytes::from_static(&[0x00]));
        }

        session.close().await?;
        Ok(())
    }

    #[tokio::test]
    async fn chain_id_mismatch_is_rejected() -> Result<()> {
        let devnode = Node::new().await?;
        let err = NetworkSession::open(&profile(devnode.rpc(), Some(1)), &credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::ChainIdMismatch { actual: 31337, .. }));
        Ok(())
    }
}
