// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use solbuild_tools::{core::pipeline::Cancellation, ops};

use crate::{
    common_args::{ConfigArgs, NetworkArgs},
    error::SolbuildResult,
};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    config: ConfigArgs,
    #[command(flatten)]
    network: NetworkArgs,
}

pub async fn exec(args: Args, cancellation: Cancellation) -> SolbuildResult {
    let config = args.config.load()?;
    ops::verify(&config, args.network.network.as_deref(), cancellation).await?;
    Ok(())
}
