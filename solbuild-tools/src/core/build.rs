// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::{
    fmt,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use semver::Version;
use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

use crate::core::{
    artifact::{Artifact, ArtifactSet},
    cache::{ArtifactCache, ArtifactCacheEntry, CacheKey},
    config::{CompilerConfig, ConfigError},
    source::{SourceError, SourceSet},
};

pub mod solc;

/// Compiler configuration fixed for the duration of a build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerSettings {
    pub language_version: Version,
    pub optimizer_enabled: bool,
    pub optimizer_runs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm_version: Option<String>,
}

impl CompilerSettings {
    pub fn from_config(config: &CompilerConfig) -> Result<Self, ConfigError> {
        let language_version = Version::parse(&config.version)
            .map_err(|err| ConfigError::InvalidCompilerVersion(config.version.clone(), err))?;
        Ok(Self {
            language_version,
            optimizer_enabled: config.optimizer.enabled,
            optimizer_runs: config.optimizer.runs,
            evm_version: config.evm_version.clone(),
        })
    }

    pub(crate) fn hash_into(&self, keccak: &mut Keccak) {
        let version = self.language_version.to_string();
        keccak.update(&(version.len() as u64).to_be_bytes());
        keccak.update(version.as_bytes());
        keccak.update(&[u8::from(self.optimizer_enabled)]);
        keccak.update(&self.optimizer_runs.to_be_bytes());
        match &self.evm_version {
            Some(evm) => {
                keccak.update(&[1]);
                keccak.update(&(evm.len() as u64).to_be_bytes());
                keccak.update(evm.as_bytes());
            }
            None => keccak.update(&[0]),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A message reported by the compiler, kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message.trim_end())
    }
}

/// Diagnostics of a failed compilation.
#[derive(Debug)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

/// What a compiler produced for one invocation.
#[derive(Debug, Default)]
pub struct CompilerOutput {
    pub artifacts: Vec<Artifact>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilerOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// An external compiler.
pub trait Compiler {
    fn compile(
        &self,
        sources: &SourceSet,
        settings: &CompilerSettings,
    ) -> Result<CompilerOutput, BuildError>;
}

impl<C: Compiler + ?Sized> Compiler for &C {
    fn compile(
        &self,
        sources: &SourceSet,
        settings: &CompilerSettings,
    ) -> Result<CompilerOutput, BuildError> {
        (**self).compile(sources, settings)
    }
}

/// Errors which can occur while building contracts.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Source(#[from] SourceError),
    #[error("{0}")]
    Cache(#[from] crate::core::cache::CacheError),
    #[error("{0}")]
    Solc(#[from] solc::SolcError),

    #[error("compilation failed:\n{0}")]
    Compilation(Diagnostics),
}

/// Compiles sources through an external compiler, consulting the artifact cache first.
#[derive(Debug)]
pub struct CompilerDriver<C> {
    compiler: C,
    cache: ArtifactCache,
    artifacts_dir: PathBuf,
}

impl<C: Compiler> CompilerDriver<C> {
    pub fn new(compiler: C, cache: ArtifactCache, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            compiler,
            cache,
            artifacts_dir: artifacts_dir.into(),
        }
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    /// Build every source below `source_location`.
    ///
    /// With unchanged sources and settings this returns the cached artifacts without invoking
    /// the compiler.
    pub fn build(
        &self,
        source_location: &Path,
        settings: &CompilerSettings,
    ) -> Result<ArtifactSet, BuildError> {
        let sources = SourceSet::scan(source_location)?;
        if sources.is_empty() {
            warn!(@yellow, "no sources found in {}, nothing to compile", source_location.display());
            return Ok(ArtifactSet::new(None, Vec::new()));
        }

        let key = CacheKey::compute(&sources, settings);
        if let Some(entry) = self.cache.get(&key) {
            info!(@grey, "compiled artifacts are up to date (cache {key})");
            let artifacts = ArtifactSet::new(Some(key), entry.artifacts);
            let restored = artifacts.write_files(&self.artifacts_dir, true)?;
            if restored > 0 {
                debug!(@grey, "restored {restored} missing artifact files");
            }
            return Ok(artifacts);
        }

        info!(
            @grey,
            "Compiling {} source file(s) with solc {} (optimizer: {}, runs: {})",
            sources.len(),
            settings.language_version,
            if settings.optimizer_enabled { "enabled" } else { "disabled" },
            settings.optimizer_runs
        );
        let output = self.compiler.compile(&sources, settings)?;
        for diagnostic in output
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
        {
            warn!(@yellow, "{diagnostic}");
        }
        if output.has_errors() {
            let errors = output
                .diagnostics
                .into_iter()
                .filter(|d| d.severity == Severity::Error)
                .collect();
            return Err(BuildError::Compilation(Diagnostics(errors)));
        }

        let entry = ArtifactCacheEntry {
            key,
            settings: settings.clone(),
            sources: (&sources).into(),
            artifacts: output.artifacts,
            built_at: unix_now(),
        };
        self.cache.put(&key, &entry)?;

        let artifacts = ArtifactSet::new(Some(key), entry.artifacts);
        artifacts.write_files(&self.artifacts_dir, false)?;
        info!(@mint, "Compiled {} contract(s) successfully", artifacts.len());
        Ok(artifacts)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::Cell, fs};

    use alloy::primitives::Bytes;
    use tempfile::tempdir;

    use super::*;

    /// Compiler double which emits one artifact per source and counts invocations.
    #[derive(Default)]
    pub(crate) struct CountingCompiler {
        pub calls: Cell<usize>,
        pub fail_with: Option<String>,
    }

    impl Compiler for CountingCompiler {
        fn compile(
            &self,
            sources: &SourceSet,
            settings: &CompilerSettings,
        ) -> Result<CompilerOutput, BuildError> {
            self.calls.set(self.calls.get() + 1);
            if let Some(message) = &self.fail_with {
                return Ok(CompilerOutput {
                    artifacts: vec![],
                    diagnostics: vec![Diagnostic {
                        severity: Severity::Error,
                        message: message.clone(),
                    }],
                });
            }
            let artifacts = sources
                .files()
                .iter()
                .map(|file| {
                    let name = file.path.trim_end_matches(".sol").replace('/', "_");
                    let mut bytecode = vec![0x60, 0x80];
                    bytecode.extend_from_slice(&file.hash[..4]);
                    bytecode.extend_from_slice(&settings.optimizer_runs.to_be_bytes());
                    Artifact {
                        contract_name: name,
                        source_name: file.path.clone(),
                        abi: Default::default(),
                        bytecode: Bytes::from(bytecode.clone()),
                        deployed_bytecode: Bytes::from(bytecode),
                        metadata: String::new(),
                    }
                })
                .collect();
            Ok(CompilerOutput {
                artifacts,
                diagnostics: vec![Diagnostic {
                    severity: Severity::Warning,
                    message: "Warning: SPDX license identifier not provided".into(),
                }],
            })
        }
    }

    pub(crate) fn settings(runs: u32) -> CompilerSettings {
        CompilerSettings {
            language_version: Version::new(0, 8, 12),
            optimizer_enabled: true,
            optimizer_runs: runs,
            evm_version: None,
        }
    }

    fn project() -> (tempfile::TempDir, PathBuf) {
        let tmp = tempdir().unwrap();
        let sources = tmp.path().join("contracts");
        fs::create_dir_all(&sources).unwrap();
        fs::write(sources.join("Lock.sol"), "contract Lock {}").unwrap();
        (tmp, sources)
    }

    fn driver<'a>(
        compiler: &'a CountingCompiler,
        root: &Path,
    ) -> CompilerDriver<&'a CountingCompiler> {
        CompilerDriver::new(
            compiler,
            ArtifactCache::new(root.join("cache")),
            root.join("artifacts"),
        )
    }

    #[test]
    fn second_build_is_a_cache_hit() {
        let (tmp, sources) = project();
        let compiler = CountingCompiler::default();
        let driver = driver(&compiler, tmp.path());

        let first = driver.build(&sources, &settings(200)).unwrap();
        let second = driver.build(&sources, &settings(200)).unwrap();
        assert_eq!(compiler.calls.get(), 1);
        assert_eq!(first, second);
        assert!(tmp.path().join("artifacts/Lock.sol/Lock.json").is_file());
    }

    #[test]
    fn changed_settings_rebuild() {
        let (tmp, sources) = project();
        let compiler = CountingCompiler::default();
        let driver = driver(&compiler, tmp.path());

        let first = driver.build(&sources, &settings(200)).unwrap();
        let second = driver.build(&sources, &settings(300)).unwrap();
        assert_eq!(compiler.calls.get(), 2);
        assert_ne!(first.key(), second.key());
        assert_eq!(driver.cache().keys().len(), 2);
    }

    #[test]
    fn changed_sources_rebuild() {
        let (tmp, sources) = project();
        let compiler = CountingCompiler::default();
        let driver = driver(&compiler, tmp.path());

        driver.build(&sources, &settings(200)).unwrap();
        fs::write(sources.join("Lock.sol"), "contract Lock { uint x; }").unwrap();
        driver.build(&sources, &settings(200)).unwrap();
        assert_eq!(compiler.calls.get(), 2);
    }

    #[test]
    fn corrupt_cache_rebuilds() {
        let (tmp, sources) = project();
        let compiler = CountingCompiler::default();
        let driver = driver(&compiler, tmp.path());

        let first = driver.build(&sources, &settings(200)).unwrap();
        let key = first.key().unwrap();
        fs::write(driver.cache().entry_path(&key), "garbage").unwrap();

        let second = driver.build(&sources, &settings(200)).unwrap();
        assert_eq!(compiler.calls.get(), 2);
        assert_eq!(first, second);
        assert!(driver.cache().get(&key).is_some());
    }

    #[test]
    fn hit_restores_missing_artifact_files() {
        let (tmp, sources) = project();
        let compiler = CountingCompiler::default();
        let driver = driver(&compiler, tmp.path());

        driver.build(&sources, &settings(200)).unwrap();
        fs::remove_dir_all(tmp.path().join("artifacts")).unwrap();
        driver.build(&sources, &settings(200)).unwrap();
        assert_eq!(compiler.calls.get(), 1);
        assert!(tmp.path().join("artifacts/Lock.sol/Lock.json").is_file());
    }

    #[test]
    fn compiler_errors_are_reported_and_not_cached() {
        let (tmp, sources) = project();
        let compiler = CountingCompiler {
            fail_with: Some("ParserError: Expected ';' but got '}'".into()),
            ..Default::default()
        };
        let driver = driver(&compiler, tmp.path());

        let err = driver.build(&sources, &settings(200)).unwrap_err();
        match err {
            BuildError::Compilation(diagnostics) => {
                assert_eq!(diagnostics.0.len(), 1);
                assert!(diagnostics.to_string().contains("Expected ';'"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(driver.cache().keys().is_empty());
        assert_eq!(compiler.calls.get(), 1);
    }

    #[test]
    fn empty_sources_skip_the_compiler() {
        let tmp = tempdir().unwrap();
        let sources = tmp.path().join("contracts");
        fs::create_dir_all(&sources).unwrap();
        let compiler = CountingCompiler::default();
        let driver = driver(&compiler, tmp.path());

        let artifacts = driver.build(&sources, &settings(200)).unwrap();
        assert!(artifacts.is_empty());
        assert_eq!(artifacts.key(), None);
        assert_eq!(compiler.calls.get(), 0);
    }

    #[test]
    fn settings_from_config() {
        let config = crate::core::config::Config::from_toml(
            "[compiler]\nversion = \"0.8.12\"\noptimizer = { enabled = true, runs = 200 }",
            ".",
        )
        .unwrap();
        let settings = CompilerSettings::from_config(&config.compiler).unwrap();
        assert_eq!(settings, self::settings(200));
    }
}
