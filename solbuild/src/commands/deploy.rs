// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use solbuild_tools::{core::pipeline::Cancellation, ops};

use crate::{
    common_args::{ConfigArgs, DeployArgs, NetworkArgs},
    error::SolbuildResult,
};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    config: ConfigArgs,
    #[command(flatten)]
    network: NetworkArgs,
    #[command(flatten)]
    deploy: DeployArgs,
}

pub async fn exec(args: Args, cancellation: Cancellation) -> SolbuildResult {
    let config = args.config.load()?;
    ops::deploy(
        &config,
        args.network.network.as_deref(),
        args.deploy.config(),
        cancellation,
    )
    .await?;
    Ok(())
}
