// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Entry points behind each command, wired with the production collaborators.

use std::time::Duration;

use crate::core::{
    build::solc::Solc,
    config::Config,
    credentials::EnvCredentialProvider,
    deployment::DeploymentConfig,
    pipeline::{test_runner_timeout, Cancellation, Orchestrator, PipelineError},
    profile::ProfileStore,
    session::NetworkConnector,
    testing::ConfiguredRunner,
    verification::SourcifyVerifier,
};

pub use build::build;
pub use clean::clean;
pub use deploy::deploy;
pub use networks::networks;
pub use test::test;
pub use verify::verify;

mod build;
mod clean;
mod deploy;
mod networks;
mod verify;

const VERIFY_TIMEOUT: Duration = Duration::from_secs(60);

pub type DefaultOrchestrator<'a> = Orchestrator<
    'a,
    Solc,
    NetworkConnector<EnvCredentialProvider>,
    ConfiguredRunner,
    SourcifyVerifier,
>;

/// Build an orchestrator using `solc`, environment credentials, the configured test runner and
/// the configured verification service.
pub fn orchestrator<'a>(
    config: &'a Config,
    profiles: &'a ProfileStore,
    deployment: DeploymentConfig,
    cancellation: Cancellation,
) -> Result<DefaultOrchestrator<'a>, PipelineError> {
    let credentials = EnvCredentialProvider::new(config.root())?;
    let command = (!config.test.command.is_empty()).then(|| config.test.command.clone());
    Ok(Orchestrator::builder()
        .config(config)
        .profiles(profiles)
        .compiler(Solc::new(config.compiler.solc_path.clone()))
        .connector(NetworkConnector::new(credentials))
        .test_runner(ConfiguredRunner::new(command, test_runner_timeout(config)))
        .verifier(SourcifyVerifier::new(&config.verify.url, VERIFY_TIMEOUT)?)
        .deployment(deployment)
        .cancellation(cancellation)
        .build())
}
