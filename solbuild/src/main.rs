// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! CLI for `solbuild`.

use std::process::ExitCode;

use clap::Parser;
use solbuild_tools::core::pipeline::Cancellation;

mod commands;
mod common_args;
mod constants;
mod error;
mod utils;

#[derive(Debug, Parser)]
#[command(name = "solbuild")]
#[command(author = "Offchain Labs, Inc.")]
#[command(about = "Compile, test, deploy and verify Solidity projects", long_about = None)]
#[command(propagate_version = true)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: commands::Command,

    /// Whether to print debug info.
    #[arg(long, global = true)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    if let Err(err) = simple_logger::init_with_level(log_level) {
        utils::print_error(err);
        return ExitCode::FAILURE;
    }

    // Build async runtime and block on command execution
    let cancellation = Cancellation::new();
    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(Into::into)
        .and_then(|rt| {
            rt.block_on(async {
                tokio::spawn(watch_interrupt(cancellation.clone()));
                commands::exec(args.command, cancellation).await
            })
        });

    // Report any error and return proper exit code
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            utils::print_error(&err);
            err.exit_code()
        }
    }
}

/// The pipeline stops at its next step after Ctrl-C and still closes any open session.
async fn watch_interrupt(cancellation: Cancellation) {
    if tokio::signal::ctrl_c().await.is_ok() {
        log::warn!("interrupted, stopping after the current step");
        cancellation.cancel();
    }
}
