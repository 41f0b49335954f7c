// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use solbuild_tools::ops;

use crate::{common_args::ConfigArgs, error::SolbuildResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    config: ConfigArgs,
}

pub fn exec(args: Args) -> SolbuildResult {
    let config = args.config.load()?;
    ops::build(&config)?;
    Ok(())
}
