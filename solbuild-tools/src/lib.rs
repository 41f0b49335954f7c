// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Tools to compile, test, deploy and verify Solidity projects across networks.

#[macro_use]
mod macros;

pub mod core;
pub mod ops;
pub mod utils;

#[cfg(feature = "integration-tests")]
pub mod devnet;
