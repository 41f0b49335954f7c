// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Drive `solc` through its standard JSON interface.

use std::{
    collections::BTreeMap,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use alloy::{json_abi::JsonAbi, primitives::Bytes};
use semver::Version;
use serde::{Deserialize, Serialize};

use super::{BuildError, Compiler, CompilerOutput, CompilerSettings, Diagnostic, Severity};
use crate::{
    core::{artifact::Artifact, message::ProcessOutput, source::SourceSet},
    utils::{color::Color, sys},
};

const SOLC: &str = "solc";
const LINK: &str = "https://docs.soliditylang.org/en/latest/installing-solidity.html";
const OUTPUT_SELECTION: &[&str] = &[
    "abi",
    "evm.bytecode.object",
    "evm.deployedBytecode.object",
    "metadata",
];

#[derive(Debug, thiserror::Error)]
pub enum SolcError {
    #[error("solc {version} not found. Install it as `solc-{version}` on your PATH or set compiler.solc_path. Please see\n{link}", link = LINK.red())]
    NotFound { version: Version },
    #[error("{path} reports version {found}, but {expected} is configured")]
    VersionMismatch {
        path: PathBuf,
        found: String,
        expected: Version,
    },
    #[error("failed to run {0}: {1}")]
    Spawn(PathBuf, #[source] std::io::Error),
    #[error("solc exited with an error (exit code: {code:?}): {stderr}", code = .0.exit_code, stderr = .0.stderr)]
    CommandFailure(ProcessOutput),
    #[error("failed to encode solc input: {0}")]
    Input(#[source] serde_json::Error),
    #[error("failed to decode solc output: {0}")]
    Output(#[source] serde_json::Error),
}

/// The Solidity compiler, located on demand for the configured version.
#[derive(Clone, Debug, Default)]
pub struct Solc {
    explicit_path: Option<PathBuf>,
}

impl Solc {
    pub fn new(explicit_path: Option<PathBuf>) -> Self {
        Self { explicit_path }
    }

    /// Find a binary reporting `version`: an explicit path, then `solc-<version>`, then `solc`.
    pub fn find(&self, version: &Version) -> Result<PathBuf, SolcError> {
        if let Some(path) = &self.explicit_path {
            let found = binary_version(path).unwrap_or_else(|| "unknown".to_string());
            if found != version.to_string() {
                return Err(SolcError::VersionMismatch {
                    path: path.clone(),
                    found,
                    expected: version.clone(),
                });
            }
            return Ok(path.clone());
        }

        let versioned = PathBuf::from(format!("{SOLC}-{version}"));
        if sys::command_exists(&versioned) {
            return Ok(versioned);
        }
        let plain = PathBuf::from(SOLC);
        if binary_version(&plain).is_some_and(|found| found == version.to_string()) {
            return Ok(plain);
        }
        Err(SolcError::NotFound {
            version: version.clone(),
        })
    }

    fn run(&self, path: &Path, input: &[u8]) -> Result<Vec<u8>, SolcError> {
        let mut child = Command::new(path)
            .arg("--standard-json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| SolcError::Spawn(path.to_path_buf(), err))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input)
                .map_err(|err| SolcError::Spawn(path.to_path_buf(), err))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|err| SolcError::Spawn(path.to_path_buf(), err))?;
        if !output.status.success() {
            return Err(SolcError::CommandFailure(ProcessOutput::from_output(
                path.display().to_string(),
                &output,
            )));
        }
        Ok(output.stdout)
    }
}

impl Compiler for Solc {
    fn compile(
        &self,
        sources: &SourceSet,
        settings: &CompilerSettings,
    ) -> Result<CompilerOutput, BuildError> {
        let path = self.find(&settings.language_version)?;
        debug!(@grey, "using compiler at {}", path.display());

        let input = StandardJsonInput::new(sources, settings);
        let input = serde_json::to_vec(&input).map_err(SolcError::Input)?;
        let stdout = self.run(&path, &input)?;
        let output: StandardJsonOutput =
            serde_json::from_slice(&stdout).map_err(SolcError::Output)?;
        Ok(output.into_compiler_output())
    }
}

/// Parse the `Version: x.y.z+commit...` line printed by `solc --version`.
fn binary_version(path: &Path) -> Option<String> {
    let output = Command::new(path)
        .arg("--version")
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_version_output(&String::from_utf8_lossy(&output.stdout))
}

fn parse_version_output(text: &str) -> Option<String> {
    let line = text.lines().find_map(|line| line.strip_prefix("Version:"))?;
    let version = line.trim().split(['+', '-']).next()?;
    (!version.is_empty()).then(|| version.to_string())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StandardJsonInput<'a> {
    language: &'static str,
    sources: BTreeMap<&'a str, SourceContent<'a>>,
    settings: StandardJsonSettings<'a>,
}

#[derive(Serialize)]
struct SourceContent<'a> {
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StandardJsonSettings<'a> {
    optimizer: OptimizerSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    evm_version: Option<&'a str>,
    output_selection: BTreeMap<&'static str, BTreeMap<&'static str, &'static [&'static str]>>,
}

#[derive(Serialize)]
struct OptimizerSettings {
    enabled: bool,
    runs: u32,
}

impl<'a> StandardJsonInput<'a> {
    fn new(sources: &'a SourceSet, settings: &'a CompilerSettings) -> Self {
        Self {
            language: "Solidity",
            sources: sources
                .files()
                .iter()
                .map(|file| {
                    (
                        file.path.as_str(),
                        SourceContent {
                            content: &file.content,
                        },
                    )
                })
                .collect(),
            settings: StandardJsonSettings {
                optimizer: OptimizerSettings {
                    enabled: settings.optimizer_enabled,
                    runs: settings.optimizer_runs,
                },
                evm_version: settings.evm_version.as_deref(),
                output_selection: BTreeMap::from([("*", BTreeMap::from([("*", OUTPUT_SELECTION)]))]),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct StandardJsonOutput {
    #[serde(default)]
    errors: Vec<SolcDiagnostic>,
    #[serde(default)]
    contracts: BTreeMap<String, BTreeMap<String, SolcContract>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolcDiagnostic {
    severity: String,
    message: String,
    formatted_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SolcContract {
    #[serde(default)]
    abi: JsonAbi,
    #[serde(default)]
    metadata: String,
    #[serde(default)]
    evm: SolcEvm,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolcEvm {
    #[serde(default)]
    bytecode: SolcBytecode,
    #[serde(default)]
    deployed_bytecode: SolcBytecode,
}

#[derive(Debug, Default, Deserialize)]
struct SolcBytecode {
    #[serde(default)]
    object: String,
}

impl StandardJsonOutput {
    fn into_compiler_output(self) -> CompilerOutput {
        let mut diagnostics: Vec<Diagnostic> = self
            .errors
            .into_iter()
            .map(|error| Diagnostic {
                severity: match error.severity.as_str() {
                    "error" => Severity::Error,
                    "warning" => Severity::Warning,
                    _ => Severity::Info,
                },
                message: error.formatted_message.unwrap_or(error.message),
            })
            .collect();

        let mut artifacts = Vec::new();
        for (source_name, contracts) in self.contracts {
            for (contract_name, contract) in contracts {
                let bytecode = decode_object(&contract.evm.bytecode.object);
                let deployed_bytecode = decode_object(&contract.evm.deployed_bytecode.object);
                let (Some(bytecode), Some(deployed_bytecode)) = (bytecode, deployed_bytecode) else {
                    diagnostics.push(Diagnostic {
                        severity: Severity::Error,
                        message: format!(
                            "{source_name}:{contract_name} has unlinked library references, which are not supported"
                        ),
                    });
                    continue;
                };
                artifacts.push(Artifact {
                    contract_name,
                    source_name: source_name.clone(),
                    abi: contract.abi,
                    bytecode,
                    deployed_bytecode,
                    metadata: contract.metadata,
                });
            }
        }
        CompilerOutput {
            artifacts,
            diagnostics,
        }
    }
}

fn decode_object(object: &str) -> Option<Bytes> {
    let object = object.strip_prefix("0x").unwrap_or(object);
    hex::decode(object).ok().map(Bytes::from)
}
