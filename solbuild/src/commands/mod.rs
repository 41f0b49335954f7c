// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use solbuild_tools::core::pipeline::Cancellation;

use crate::error::SolbuildResult;

mod build;
mod clean;
mod deploy;
mod networks;
mod test;
mod verify;

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Compile the project's contracts
    #[clap(visible_alias = "b")]
    Build(build::Args),
    /// Remove cached and generated artifacts
    Clean(clean::Args),
    /// Build, then deploy contracts to a network
    #[clap(visible_alias = "d")]
    Deploy(deploy::Args),
    /// List the configured networks
    Networks(networks::Args),
    /// Build, then run the test suite against a network
    #[clap(visible_alias = "t")]
    Test(test::Args),
    /// Verify the contracts deployed to a network
    Verify(verify::Args),
}

pub async fn exec(cmd: Command, cancellation: Cancellation) -> SolbuildResult {
    match cmd {
        Command::Build(args) => build::exec(args),
        Command::Clean(args) => clean::exec(args),
        Command::Deploy(args) => deploy::exec(args, cancellation).await,
        Command::Networks(args) => networks::exec(args),
        Command::Test(args) => test::exec(args, cancellation).await,
        Command::Verify(args) => verify::exec(args, cancellation).await,
    }
}
