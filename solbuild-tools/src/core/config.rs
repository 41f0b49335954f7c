// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Project configuration, read once from `Solbuild.toml`.
//!
//! The configuration is deserialized into a plain [`Config`] value which is then handed to the
//! profile store, compiler driver and sessions explicitly. Nothing here is global.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::core::credentials::CredentialRef;

/// Filename for solbuild project configuration files.
pub const FILENAME: &str = "Solbuild.toml";

/// Name of the in-process simulated network, always available.
pub const LOCAL_NETWORK: &str = "local";

const DEFAULT_TEST_RUNNER_TIMEOUT_MS: u64 = 40_000;
const DEFAULT_OPTIMIZER_RUNS: u32 = 200;
const DEFAULT_VERIFY_URL: &str = "https://sourcify.dev/server";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not find {FILENAME} in {0} or any parent directory")]
    NotFound(PathBuf),
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("malformed {FILENAME}: {0}")]
    Malformed(#[from] toml::de::Error),

    #[error("default network '{0}' is not declared under [networks]")]
    UnknownDefaultNetwork(String),
    #[error("network '{0}' has invalid url '{1}': only http and https endpoints are supported")]
    InvalidUrl(String, String),
    #[error("network '{0}' must have a positive timeout")]
    InvalidTimeout(String),
    #[error("network '{network}' has invalid account reference: {reason}")]
    InvalidAccount { network: String, reason: String },
    #[error("network '{0}' is local and cannot declare a chain id")]
    LocalChainId(String),
    #[error("invalid compiler version '{0}': {1}")]
    InvalidCompilerVersion(String, #[source] semver::Error),
    #[error("test runner timeout must be positive")]
    InvalidTestTimeout,
    #[error("invalid verification url '{0}'")]
    InvalidVerifyUrl(String),
}

/// Top-level contents of `Solbuild.toml`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory containing the configuration file; relative paths resolve against it.
    #[serde(skip)]
    root: PathBuf,

    #[serde(default = "default_network_name")]
    pub default_network: String,
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default = "default_test_runner_timeout_ms")]
    pub test_runner_timeout_ms: u64,
    #[serde(default)]
    pub test: TestConfig,
    #[serde(default)]
    pub verify: VerifyConfig,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint. Absent for the in-process simulated chain.
    pub url: Option<String>,
    /// Credential references such as `env:PRIVATE_KEY` or `file:./deployer.key`.
    #[serde(default)]
    pub accounts: Vec<String>,
    pub timeout_ms: Option<u64>,
    /// Expected chain id, checked when a session is opened.
    pub chain_id: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    pub version: String,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    pub evm_version: Option<String>,
    /// Explicit path to a `solc` binary, bypassing discovery.
    pub solc_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_optimizer_runs")]
    pub runs: u32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            runs: DEFAULT_OPTIMIZER_RUNS,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    #[serde(default = "default_sources")]
    pub sources: PathBuf,
    #[serde(default = "default_tests")]
    pub tests: PathBuf,
    #[serde(default = "default_cache")]
    pub cache: PathBuf,
    #[serde(default = "default_artifacts")]
    pub artifacts: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            tests: default_tests(),
            cache: default_cache(),
            artifacts: default_artifacts(),
        }
    }
}

/// External test command. When empty, the built-in deployment smoke runner is used.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    #[serde(default)]
    pub command: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyConfig {
    #[serde(default = "default_verify_url")]
    pub url: String,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            url: default_verify_url(),
        }
    }
}

impl Config {
    /// Find the configuration file in `dir` or the nearest parent directory and load it.
    pub fn nearest(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = find_file(dir.as_ref())?;
        Self::from_file(path)
    }

    /// Load the configuration from an explicit file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|err| ConfigError::Read(path.to_path_buf(), err))?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_toml(&contents, root)
    }

    /// Parse configuration contents, resolving relative paths against `root`.
    pub fn from_toml(contents: &str, root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(contents)?;
        config.root = root.into();
        config
            .networks
            .entry(LOCAL_NETWORK.to_string())
            .or_default();
        config.validate()?;
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sources_dir(&self) -> PathBuf {
        self.root.join(&self.paths.sources)
    }

    pub fn tests_dir(&self) -> PathBuf {
        self.root.join(&self.paths.tests)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(&self.paths.cache)
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.root.join(&self.paths.artifacts)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.networks.contains_key(&self.default_network) {
            return Err(ConfigError::UnknownDefaultNetwork(
                self.default_network.clone(),
            ));
        }
        if self.test_runner_timeout_ms == 0 {
            return Err(ConfigError::InvalidTestTimeout);
        }
        semver::Version::parse(&self.compiler.version).map_err(|err| {
            ConfigError::InvalidCompilerVersion(self.compiler.version.clone(), err)
        })?;
        if reqwest::Url::parse(&self.verify.url).is_err() {
            return Err(ConfigError::InvalidVerifyUrl(self.verify.url.clone()));
        }
        for (name, network) in &self.networks {
            if network.timeout_ms == Some(0) {
                return Err(ConfigError::InvalidTimeout(name.clone()));
            }
            if network.url.is_none() && network.chain_id.is_some() {
                return Err(ConfigError::LocalChainId(name.clone()));
            }
            for account in &network.accounts {
                account
                    .parse::<CredentialRef>()
                    .map_err(|err| ConfigError::InvalidAccount {
                        network: name.clone(),
                        reason: err.to_string(),
                    })?;
            }
        }
        Ok(())
    }
}

fn find_file(dir: &Path) -> Result<PathBuf, ConfigError> {
    let mut path = dir.to_path_buf();
    loop {
        let candidate = path.join(FILENAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !path.pop() {
            return Err(ConfigError::NotFound(dir.to_path_buf()));
        }
    }
}

fn default_network_name() -> String {
    LOCAL_NETWORK.to_string()
}

fn default_test_runner_timeout_ms() -> u64 {
    DEFAULT_TEST_RUNNER_TIMEOUT_MS
}

fn default_optimizer_runs() -> u32 {
    DEFAULT_OPTIMIZER_RUNS
}

fn default_sources() -> PathBuf {
    PathBuf::from("contracts")
}

fn default_tests() -> PathBuf {
    PathBuf::from("test")
}

fn default_cache() -> PathBuf {
    PathBuf::from("cache")
}

fn default_artifacts() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_verify_url() -> String {
    DEFAULT_VERIFY_URL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const HARDHAT_LIKE: &str = r#"
        default_network = "local"

        [networks.local]

        [networks.remote_test]
        url = "https://testnet.example.io/api"
        accounts = ["env:PRIVATE_KEY"]
        timeout_ms = 60000

        [compiler]
        version = "0.8.12"
        optimizer = { enabled = true, runs = 200 }

        [paths]
        sources = "./contracts"
        tests = "./test"
        cache = "./cache"
        artifacts = "./artifacts"
    "#;

    #[test]
    fn parses_full_config() {
        let config = Config::from_toml(HARDHAT_LIKE, "/project").unwrap();
        assert_eq!(config.default_network, "local");
        assert_eq!(config.networks.len(), 2);
        let remote = &config.networks["remote_test"];
        assert_eq!(remote.url.as_deref(), Some("https://testnet.example.io/api"));
        assert_eq!(remote.timeout_ms, Some(60000));
        assert!(config.compiler.optimizer.enabled);
        assert_eq!(config.compiler.optimizer.runs, 200);
        assert_eq!(config.test_runner_timeout_ms, DEFAULT_TEST_RUNNER_TIMEOUT_MS);
        assert_eq!(
            config.sources_dir(),
            Path::new("/project").join("./contracts")
        );
    }

    #[test]
    fn local_network_is_implicit() {
        let config = Config::from_toml("[compiler]\nversion = \"0.8.24\"", ".").unwrap();
        assert_eq!(config.default_network, LOCAL_NETWORK);
        assert!(config.networks[LOCAL_NETWORK].url.is_none());
        assert_eq!(config.paths.artifacts, PathBuf::from("artifacts"));
        assert!(!config.compiler.optimizer.enabled);
    }

    #[test]
    fn rejects_unknown_default() {
        let err = Config::from_toml(
            "default_network = \"mainnet\"\n[compiler]\nversion = \"0.8.24\"",
            ".",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDefaultNetwork(name) if name == "mainnet"));
    }

    #[test]
    fn rejects_bad_compiler_version() {
        let err = Config::from_toml("[compiler]\nversion = \"latest\"", ".").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCompilerVersion(..)));
    }

    #[test]
    fn rejects_plaintext_key() {
        let err = Config::from_toml(
            r#"
            [networks.remote]
            url = "http://localhost:8545"
            accounts = ["0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"]

            [compiler]
            version = "0.8.24"
            "#,
            ".",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAccount { network, .. } if network == "remote"));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = Config::from_toml(
            "[networks.remote]\nurl = \"http://localhost:8545\"\ntimeout_ms = 0\n[compiler]\nversion = \"0.8.24\"",
            ".",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(name) if name == "remote"));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = Config::from_toml("mocha = 1\n[compiler]\nversion = \"0.8.24\"", ".").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn finds_nearest_file() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join(FILENAME), HARDHAT_LIKE).unwrap();
        let nested = tmp.path().join("contracts").join("tokens");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::nearest(&nested).unwrap();
        assert_eq!(config.root(), tmp.path());
        assert_eq!(config.artifacts_dir(), tmp.path().join("./artifacts"));
    }

    #[test]
    fn missing_file() {
        let tmp = tempdir().unwrap();
        assert!(matches!(
            Config::nearest(tmp.path()),
            Err(ConfigError::NotFound(_))
        ));
    }
}
