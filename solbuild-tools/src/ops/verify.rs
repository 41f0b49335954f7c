// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::collections::BTreeMap;

use crate::core::{
    config::Config,
    pipeline::{Cancellation, Mode, Outcome, PipelineError},
    profile::ProfileStore,
    verification::VerificationStatus,
};

/// Submit the contracts recorded for `network` to the verification service.
pub async fn verify(
    config: &Config,
    network: Option<&str>,
    cancellation: Cancellation,
) -> Result<BTreeMap<String, VerificationStatus>, PipelineError> {
    let profiles = ProfileStore::from_config(config)?;
    let orchestrator = super::orchestrator(config, &profiles, Default::default(), cancellation)?;
    let Outcome::Verified(statuses) = orchestrator.run(network, Mode::Verify).await? else {
        unreachable!("verify mode always produces verification statuses");
    };
    for (name, status) in &statuses {
        mintln!("{name}: {status}");
    }
    Ok(statuses)
}
