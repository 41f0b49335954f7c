// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use crate::{
    core::{config::Config, pipeline::PipelineError, profile::ProfileStore},
    utils::color::Color,
};

/// Print the configured network profiles. Credential references are counted, never resolved.
pub fn networks(config: &Config) -> Result<ProfileStore, PipelineError> {
    let profiles = ProfileStore::from_config(config)?;
    for profile in profiles.iter() {
        let marker = if profile.is_default { "*" } else { " " };
        let endpoint = match &profile.endpoint {
            Some(url) => url.to_string(),
            None => "simulated".to_string(),
        };
        println!(
            "{marker} {} {} ({} account(s), timeout {}ms)",
            profile.name.mint(),
            endpoint.grey(),
            profile.accounts.len(),
            profile.timeout.as_millis()
        );
    }
    Ok(profiles)
}
