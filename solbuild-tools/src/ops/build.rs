// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use crate::core::{
    artifact::ArtifactSet,
    build::{solc::Solc, CompilerDriver, CompilerSettings},
    cache::ArtifactCache,
    config::Config,
    pipeline::PipelineError,
};

/// Compile every source, reusing cached artifacts when nothing changed.
pub fn build(config: &Config) -> Result<ArtifactSet, PipelineError> {
    let settings = CompilerSettings::from_config(&config.compiler)?;
    let driver = CompilerDriver::new(
        Solc::new(config.compiler.solc_path.clone()),
        ArtifactCache::new(config.cache_dir()),
        config.artifacts_dir(),
    );
    let artifacts = driver.build(&config.sources_dir(), &settings)?;
    for artifact in &artifacts {
        let kind = if artifact.is_deployable() {
            format!("{} bytes", artifact.bytecode.len())
        } else {
            "abstract".to_string()
        };
        greyln!("{} ({kind})", artifact.fully_qualified_name());
    }
    Ok(artifacts)
}
