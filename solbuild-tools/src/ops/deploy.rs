// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use crate::{
    core::{
        config::Config,
        deployment::{DeploymentConfig, DeploymentRecord},
        pipeline::{Cancellation, Mode, Outcome, PipelineError},
        profile::ProfileStore,
    },
    utils::color::DebugColor,
};

/// Build, then deploy fresh copies of the selected contracts.
pub async fn deploy(
    config: &Config,
    network: Option<&str>,
    deployment: DeploymentConfig,
    cancellation: Cancellation,
) -> Result<DeploymentRecord, PipelineError> {
    let profiles = ProfileStore::from_config(config)?;
    let orchestrator = super::orchestrator(config, &profiles, deployment, cancellation)?;
    let Outcome::Deployed(record) = orchestrator.run(network, Mode::Deploy).await? else {
        unreachable!("deploy mode always produces a deployment record");
    };
    for (name, contract) in &record.contracts {
        mintln!("{name}: {}", contract.address.debug_lavender());
    }
    Ok(record)
}
