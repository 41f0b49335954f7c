// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Credential references and their lazy resolution into signers.
//!
//! Network profiles only ever hold a [`CredentialRef`]. The secret behind it is read by a
//! [`CredentialProvider`] when a session is opened, and is kept inside a [`Secret`] which never
//! prints its contents.

use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::{primitives::B256, signers::local::PrivateKeySigner};

use crate::utils::decode0x;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("credential {0} could not be resolved: {1}")]
    Unresolved(CredentialRef, String),
    #[error("credential {0} is not a valid private key")]
    InvalidKey(CredentialRef),
    #[error("failed to load {0}: {1}")]
    Dotenv(PathBuf, #[source] dotenv::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialRefError {
    #[error("empty account reference")]
    Empty,
    #[error("plaintext secrets are not allowed in configuration, use env:VAR or file:PATH")]
    Plaintext,
    #[error("unsupported reference '{0}', expected env:VAR or file:PATH")]
    Unsupported(String),
    #[error("invalid environment variable name '{0}'")]
    InvalidVariable(String),
}

/// An opaque pointer to secret material.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CredentialRef {
    /// Read from an environment variable (a project `.env` file is consulted first).
    Env(String),
    /// Read from a file, relative paths resolving against the project root.
    File(PathBuf),
}

impl FromStr for CredentialRef {
    type Err = CredentialRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CredentialRefError::Empty);
        }
        if let Some(var) = s.strip_prefix("env:") {
            let valid = !var.is_empty()
                && var.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !var.starts_with(|c: char| c.is_ascii_digit());
            if !valid {
                return Err(CredentialRefError::InvalidVariable(var.to_string()));
            }
            return Ok(Self::Env(var.to_string()));
        }
        if let Some(path) = s.strip_prefix("file:") {
            if path.is_empty() {
                return Err(CredentialRefError::Empty);
            }
            return Ok(Self::File(PathBuf::from(path)));
        }
        if looks_like_key(s) {
            return Err(CredentialRefError::Plaintext);
        }
        Err(CredentialRefError::Unsupported(s.to_string()))
    }
}

impl fmt::Display for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env(var) => write!(f, "env:{var}"),
            Self::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

fn looks_like_key(s: &str) -> bool {
    let s = s.strip_prefix("0x").unwrap_or(s);
    s.len() >= 32 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Secret material. Formatting never reveals the contents.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Turns credential references into secrets.
pub trait CredentialProvider {
    fn resolve(&self, reference: &CredentialRef) -> Result<Secret, CredentialError>;
}

/// Resolves references from the process environment and the filesystem.
#[derive(Debug)]
pub struct EnvCredentialProvider {
    root: PathBuf,
}

impl EnvCredentialProvider {
    /// Create a provider rooted at the project directory, loading `<root>/.env` if present.
    ///
    /// Variables already set in the environment take precedence over the `.env` file.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, CredentialError> {
        let root = root.into();
        let dotenv_path = root.join(".env");
        if dotenv_path.is_file() {
            dotenv::from_path(&dotenv_path)
                .map_err(|err| CredentialError::Dotenv(dotenv_path.clone(), err))?;
            debug!(@grey, "loaded environment from {}", dotenv_path.display());
        }
        Ok(Self { root })
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn resolve(&self, reference: &CredentialRef) -> Result<Secret, CredentialError> {
        let value = match reference {
            CredentialRef::Env(var) => env::var(var)
                .map_err(|err| CredentialError::Unresolved(reference.clone(), err.to_string()))?,
            CredentialRef::File(path) => fs::read_to_string(self.resolve_path(path))
                .map_err(|err| CredentialError::Unresolved(reference.clone(), err.to_string()))?,
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(CredentialError::Unresolved(
                reference.clone(),
                "value is empty".to_string(),
            ));
        }
        Ok(Secret::new(value))
    }
}

/// Resolve every reference into a local signer, failing on the first that cannot be used.
pub fn resolve_signers(
    provider: &impl CredentialProvider,
    references: &[CredentialRef],
) -> Result<Vec<PrivateKeySigner>, CredentialError> {
    references
        .iter()
        .map(|reference| {
            let secret = provider.resolve(reference)?;
            signer_from_secret(&secret).ok_or_else(|| CredentialError::InvalidKey(reference.clone()))
        })
        .collect()
}

fn signer_from_secret(secret: &Secret) -> Option<PrivateKeySigner> {
    let bytes = decode0x(secret.expose()).ok()?;
    if bytes.len() != 32 {
        return None;
    }
    PrivateKeySigner::from_bytes(&B256::from_slice(&bytes)).ok()
}
