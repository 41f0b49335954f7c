// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::{fs, io};

use crate::core::{cache::ArtifactCache, config::Config, pipeline::PipelineError};

/// Remove every cache entry and the artifacts directory. Returns how many cache entries were
/// removed.
pub fn clean(config: &Config) -> Result<usize, PipelineError> {
    let removed = ArtifactCache::new(config.cache_dir()).clear()?;
    let artifacts_dir = config.artifacts_dir();
    match fs::remove_dir_all(&artifacts_dir) {
        Ok(()) => debug!(@grey, "removed {}", artifacts_dir.display()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    greyln!("removed {removed} cache entries and {}", artifacts_dir.display());
    Ok(removed)
}
