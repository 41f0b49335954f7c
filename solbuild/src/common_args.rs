// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::path::PathBuf;

use solbuild_tools::core::{
    config::{Config, ConfigError},
    deployment::DeploymentConfig,
};

#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Path to Solbuild.toml. Defaults to the nearest one in the current directory or a parent.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<Config, ConfigError> {
        match &self.config {
            Some(path) => Config::from_file(path),
            None => {
                let cwd = std::env::current_dir()
                    .map_err(|err| ConfigError::Read(PathBuf::from("."), err))?;
                Config::nearest(cwd)
            }
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct NetworkArgs {
    /// Network profile to use. Defaults to `default_network`.
    #[arg(short, long)]
    pub network: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct DeployArgs {
    /// Contract to deploy, by name or `Source.sol:Name`. May be repeated.
    #[arg(long)]
    contract: Vec<String>,
    /// Constructor arguments, used when a single contract is selected.
    #[arg(long, num_args(0..), value_name = "ARGS", allow_hyphen_values = true)]
    constructor_args: Vec<String>,
}

impl DeployArgs {
    pub fn config(&self) -> DeploymentConfig {
        DeploymentConfig {
            contracts: self.contract.clone(),
            constructor_args: self.constructor_args.clone(),
        }
    }
}
