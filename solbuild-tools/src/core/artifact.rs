// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Compiled contract artifacts.

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::{json_abi::JsonAbi, primitives::Bytes};
use serde::{Deserialize, Serialize};

use crate::{core::cache::CacheKey, utils::write_atomic};

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("no contract named {0} in the build output")]
    UnknownContract(String),
    #[error("contract name {name} is ambiguous, use one of: {}", .candidates.join(", "))]
    AmbiguousContract {
        name: String,
        candidates: Vec<String>,
    },
}

/// Compiled output for a single contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    /// Source unit the contract was declared in, relative to the sources directory.
    pub source_name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
    pub deployed_bytecode: Bytes,
    /// Compiler metadata JSON, needed for source verification.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub metadata: String,
}

impl Artifact {
    /// Interfaces and abstract contracts compile to empty bytecode.
    pub fn is_deployable(&self) -> bool {
        !self.bytecode.is_empty()
    }

    pub fn constructor_inputs(&self) -> usize {
        self.abi
            .constructor
            .as_ref()
            .map(|constructor| constructor.inputs.len())
            .unwrap_or_default()
    }

    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Location of this artifact's JSON file below the artifacts directory.
    pub fn path_in(&self, artifacts_dir: &Path) -> PathBuf {
        artifacts_dir
            .join(&self.source_name)
            .join(format!("{}.json", self.contract_name))
    }
}

/// All artifacts produced by one build, together with the cache key they were stored under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactSet {
    key: Option<CacheKey>,
    artifacts: Vec<Artifact>,
}

impl ArtifactSet {
    pub fn new(key: Option<CacheKey>, artifacts: Vec<Artifact>) -> Self {
        Self { key, artifacts }
    }

    /// Cache key of the build, `None` when there was nothing to compile.
    pub fn key(&self) -> Option<CacheKey> {
        self.key
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter()
    }

    /// Look up a contract by `Source.sol:Name`, or by bare name when only one source declares it.
    pub fn get(&self, name: &str) -> Result<&Artifact, LookupError> {
        if name.contains(':') {
            return self
                .artifacts
                .iter()
                .find(|artifact| artifact.fully_qualified_name() == name)
                .ok_or_else(|| LookupError::UnknownContract(name.to_string()));
        }
        let mut matches = self
            .artifacts
            .iter()
            .filter(|artifact| artifact.contract_name == name);
        match (matches.next(), matches.next()) {
            (None, _) => Err(LookupError::UnknownContract(name.to_string())),
            (Some(artifact), None) => Ok(artifact),
            (Some(first), Some(second)) => {
                let candidates = [first, second]
                    .into_iter()
                    .chain(matches)
                    .map(Artifact::fully_qualified_name)
                    .collect();
                Err(LookupError::AmbiguousContract {
                    name: name.to_string(),
                    candidates,
                })
            }
        }
    }

    pub fn deployable(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(|artifact| artifact.is_deployable())
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Write one JSON file per artifact, optionally skipping files that already exist.
    pub fn write_files(&self, artifacts_dir: &Path, only_missing: bool) -> std::io::Result<usize> {
        let mut written = 0;
        for artifact in &self.artifacts {
            let path = artifact.path_in(artifacts_dir);
            if only_missing && path.exists() {
                continue;
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_vec_pretty(artifact)?;
            write_atomic(&path, &json)?;
            written += 1;
        }
        Ok(written)
    }
}

impl<'a> IntoIterator for &'a ArtifactSet {
    type Item = &'a Artifact;
    type IntoIter = std::slice::Iter<'a, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.iter()
    }
}
