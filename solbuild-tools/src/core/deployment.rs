// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Deploying compiled artifacts through a session.
//!
//! Every run deploys fresh contracts. Contract creations do not depend on each other, so they are
//! sent together with pre-assigned nonces.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt, Specifier},
    network::TransactionBuilder,
    primitives::{Address, Bytes, TxHash},
    rpc::types::TransactionRequest,
};
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        artifact::{Artifact, ArtifactSet, LookupError},
        session::{Session, SessionError},
    },
    utils::{color::DebugColor, format_gas, write_atomic},
};

const DEPLOYMENTS_DIR: &str = "deployments";

#[derive(Debug, Default, Clone)]
pub struct DeploymentConfig {
    /// Contracts to deploy, as `Source.sol:Name` or an unambiguous bare name. When empty, every
    /// deployable contract whose constructor takes no arguments is deployed.
    pub contracts: Vec<String>,
    /// Constructor arguments, allowed only when exactly one contract is selected.
    pub constructor_args: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error("{0}")]
    Session(#[from] SessionError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("contract {0} has no bytecode (is it abstract or an interface?)")]
    NotDeployable(String),
    #[error("constructor arguments require exactly one --contract")]
    AmbiguousConstructorArgs,
    #[error("invalid constructor for {contract}: {reason}")]
    InvalidConstructor { contract: String, reason: String },
    #[error("session returned no contract address for {0}")]
    NoContractAddress(String),

    #[error("failed to read deployment record {0}: {1}")]
    ReadRecord(PathBuf, #[source] io::Error),
    #[error("deployment record {0} is malformed: {1}")]
    MalformedRecord(PathBuf, #[source] serde_json::Error),
    #[error("failed to write deployment record {0}: {1}")]
    WriteRecord(PathBuf, #[source] io::Error),
}

/// Where a contract ended up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedContract {
    pub source_name: String,
    pub address: Address,
    pub tx_hash: TxHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Addresses of the contracts deployed to one network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub network: String,
    pub chain_id: u64,
    pub contracts: BTreeMap<String, DeployedContract>,
}

impl DeploymentRecord {
    pub fn path(artifacts_dir: &Path, network: &str) -> PathBuf {
        artifacts_dir
            .join(DEPLOYMENTS_DIR)
            .join(format!("{network}.json"))
    }

    pub fn read(artifacts_dir: &Path, network: &str) -> Result<Self, DeploymentError> {
        let path = Self::path(artifacts_dir, network);
        let bytes = fs::read(&path).map_err(|err| DeploymentError::ReadRecord(path.clone(), err))?;
        serde_json::from_slice(&bytes).map_err(|err| DeploymentError::MalformedRecord(path, err))
    }

    pub fn write(&self, artifacts_dir: &Path) -> Result<PathBuf, DeploymentError> {
        let path = Self::path(artifacts_dir, &self.network);
        let write = || -> io::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            write_atomic(&path, &serde_json::to_vec_pretty(self)?)
        };
        write().map_err(|err| DeploymentError::WriteRecord(path.clone(), err))?;
        Ok(path)
    }
}

/// Deploy the selected artifacts and return where they landed.
pub async fn deploy(
    artifacts: &ArtifactSet,
    config: &DeploymentConfig,
    session: &impl Session,
) -> Result<DeploymentRecord, DeploymentError> {
    let selected = select(artifacts, config)?;
    let mut record = DeploymentRecord {
        network: session.network().to_string(),
        chain_id: session.chain_id().await?,
        contracts: BTreeMap::new(),
    };
    if selected.is_empty() {
        warn!(@yellow, "no deployable contracts found");
        return Ok(record);
    }

    let txs = selected
        .iter()
        .map(|artifact| deploy_request(artifact, &config.constructor_args))
        .collect::<Result<Vec<_>, _>>()?;
    let outcomes = session.send_independent(txs).await?;

    for (artifact, outcome) in selected.iter().zip(outcomes) {
        let name = artifact.fully_qualified_name();
        let address = outcome
            .contract_address
            .ok_or_else(|| DeploymentError::NoContractAddress(name.clone()))?;
        info!(@grey, "deployed {name} at address: {}", address.debug_lavender());
        debug!(@grey, "deployment tx hash: {}", outcome.tx_hash.debug_lavender());
        debug!(@grey, "gas used: {}", format_gas(outcome.gas_used));
        record.contracts.insert(
            name,
            DeployedContract {
                source_name: artifact.source_name.clone(),
                address,
                tx_hash: outcome.tx_hash,
                block_number: outcome.block_number,
                gas_used: outcome.gas_used,
            },
        );
    }
    Ok(record)
}

fn select<'a>(
    artifacts: &'a ArtifactSet,
    config: &DeploymentConfig,
) -> Result<Vec<&'a Artifact>, DeploymentError> {
    if !config.constructor_args.is_empty() && config.contracts.len() != 1 {
        return Err(DeploymentError::AmbiguousConstructorArgs);
    }
    if config.contracts.is_empty() {
        return Ok(artifacts
            .deployable()
            .filter(|artifact| {
                let takes_args = artifact.constructor_inputs() > 0;
                if takes_args {
                    warn!(
                        @yellow,
                        "skipping {}: its constructor takes arguments, select it with --contract",
                        artifact.fully_qualified_name()
                    );
                }
                !takes_args
            })
            .collect());
    }
    config
        .contracts
        .iter()
        .map(|name| {
            let artifact = artifacts.get(name)?;
            if !artifact.is_deployable() {
                return Err(DeploymentError::NotDeployable(name.clone()));
            }
            Ok(artifact)
        })
        .collect()
}

/// Creation transaction for `artifact`, with ABI-encoded constructor arguments appended.
fn deploy_request(artifact: &Artifact, args: &[String]) -> Result<TransactionRequest, DeploymentError> {
    let invalid = |reason: String| DeploymentError::InvalidConstructor {
        contract: artifact.contract_name.clone(),
        reason,
    };
    let mut code = artifact.bytecode.to_vec();
    match &artifact.abi.constructor {
        None if args.is_empty() => {}
        None => return Err(invalid("constructor takes no arguments".into())),
        Some(constructor) => {
            if constructor.inputs.len() != args.len() {
                return Err(invalid(format!(
                    "expected {} arguments, got {}",
                    constructor.inputs.len(),
                    args.len()
                )));
            }
            let mut values = Vec::<DynSolValue>::with_capacity(args.len());
            for (arg, param) in args.iter().zip(&constructor.inputs) {
                let ty = param
                    .resolve()
                    .map_err(|err| invalid(format!("could not resolve {param}: {err}")))?;
                let value = ty
                    .coerce_str(arg)
                    .map_err(|err| invalid(format!("could not parse {param}: {err}")))?;
                values.push(value);
            }
            let encoded = constructor
                .abi_encode_input_raw(&values)
                .map_err(|err| invalid(err.to_string()))?;
            code.extend(encoded);
        }
    }
    Ok(TransactionRequest::default().with_deploy_code(Bytes::from(code)))
}
