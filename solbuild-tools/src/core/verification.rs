// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Source verification of deployed contracts.

use std::{collections::BTreeMap, fmt, time::Duration};

use alloy::primitives::Address;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::core::{
    artifact::ArtifactSet,
    deployment::{DeploymentError, DeploymentRecord},
    session::{Session, SessionError},
    source::SourceSet,
};

const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("{0}")]
    Record(#[from] DeploymentError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid verification url {0}: {1}")]
    InvalidUrl(String, String),

    #[error("deployment record is for chain {recorded}, but the network reports {actual}")]
    ChainMismatch { recorded: u64, actual: u64 },
    #[error("no code at {address}, the {contract} deployment is gone (was the network reset?)")]
    NoCode { contract: String, address: Address },
    #[error("{0} is not in the current build output")]
    MissingArtifact(String),
    #[error("{0} was built without compiler metadata")]
    MissingMetadata(String),
    #[error("networks without an endpoint cannot be verified")]
    UnsupportedNetwork,
    #[error("nothing deployed on network {0}")]
    NothingDeployed(String),

    #[error("verification service rejected {contract}: {message}")]
    Rejected { contract: String, message: String },
    #[error("verification service returned {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },
}

/// Match quality reported by the verification service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Perfect,
    Partial,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Perfect => f.write_str("perfect match"),
            Self::Partial => f.write_str("partial match"),
        }
    }
}

/// Everything a verification service needs to match one deployed contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationRequest {
    pub contract: String,
    pub chain_id: u64,
    pub address: Address,
    /// File name to contents, including the compiler metadata.
    pub files: BTreeMap<String, String>,
}

#[allow(async_fn_in_trait)]
pub trait Verifier {
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationStatus, VerificationError>;
}

/// Client for a Sourcify-compatible verification API.
#[derive(Clone, Debug)]
pub struct SourcifyVerifier {
    base_url: Url,
    client: reqwest::Client,
}

impl SourcifyVerifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, VerificationError> {
        // a trailing slash keeps the last path segment when joining
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&base)
            .map_err(|err| VerificationError::InvalidUrl(base.clone(), err.to_string()))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[derive(Serialize)]
struct VerifyBody<'a> {
    address: String,
    chain: String,
    files: &'a BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    result: Vec<VerifyResult>,
}

#[derive(Debug, Deserialize)]
struct VerifyResult {
    status: VerificationStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl Verifier for SourcifyVerifier {
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationStatus, VerificationError> {
        let url = self.base_url.join("verify").map_err(|err| {
            VerificationError::InvalidUrl(self.base_url.to_string(), err.to_string())
        })?;
        let body = VerifyBody {
            address: request.address.to_checksum(None),
            chain: request.chain_id.to_string(),
            files: &request.files,
        };
        debug!(@grey, "submitting {} to {url}", request.contract);
        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        parse_response(&request.contract, status, &text)
    }
}

fn parse_response(
    contract: &str,
    status: StatusCode,
    body: &str,
) -> Result<VerificationStatus, VerificationError> {
    if status.is_success() {
        if let Ok(response) = serde_json::from_str::<VerifyResponse>(body) {
            if let Some(result) = response.result.first() {
                return Ok(result.status);
            }
        }
    } else if status.is_client_error() {
        if let Ok(response) = serde_json::from_str::<ErrorResponse>(body) {
            return Err(VerificationError::Rejected {
                contract: contract.to_string(),
                message: response.error,
            });
        }
    }
    Err(VerificationError::UnexpectedStatus {
        status,
        body: body.to_string(),
    })
}

/// Build the verification requests for every contract in `record`.
pub fn requests(
    record: &DeploymentRecord,
    artifacts: &ArtifactSet,
    sources: &SourceSet,
) -> Result<Vec<VerificationRequest>, VerificationError> {
    if record.contracts.is_empty() {
        return Err(VerificationError::NothingDeployed(record.network.clone()));
    }
    let mut files: BTreeMap<String, String> = sources
        .files()
        .iter()
        .map(|file| (file.path.clone(), file.content.clone()))
        .collect();
    record
        .contracts
        .iter()
        .map(|(name, deployed)| {
            let artifact = artifacts
                .get(name)
                .map_err(|_| VerificationError::MissingArtifact(name.clone()))?;
            if artifact.metadata.is_empty() {
                return Err(VerificationError::MissingMetadata(name.clone()));
            }
            files.insert(METADATA_FILE.to_string(), artifact.metadata.clone());
            Ok(VerificationRequest {
                contract: name.clone(),
                chain_id: record.chain_id,
                address: deployed.address,
                files: files.clone(),
            })
        })
        .collect()
}

/// Confirm each recorded deployment still exists, then submit it for verification.
pub async fn verify_deployments(
    verifier: &impl Verifier,
    session: &impl Session,
    record: &DeploymentRecord,
    artifacts: &ArtifactSet,
    sources: &SourceSet,
) -> Result<BTreeMap<String, VerificationStatus>, VerificationError> {
    if session.rpc_url().is_none() {
        return Err(VerificationError::UnsupportedNetwork);
    }
    let actual = session.chain_id().await?;
    if actual != record.chain_id {
        return Err(VerificationError::ChainMismatch {
            recorded: record.chain_id,
            actual,
        });
    }

    let mut statuses = BTreeMap::new();
    for request in requests(record, artifacts, sources)? {
        if session.code_at(request.address).await?.is_empty() {
            return Err(VerificationError::NoCode {
                contract: request.contract,
                address: request.address,
            });
        }
        let status = verifier.verify(&request).await?;
        info!(@grey, "verified {} at {}: {status}", request.contract, request.address);
        statuses.insert(request.contract, status);
    }
    Ok(statuses)
}
