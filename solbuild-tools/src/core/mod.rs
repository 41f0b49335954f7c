// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

pub mod artifact;
pub mod build;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod deployment;
pub mod message;
pub mod pipeline;
pub mod profile;
pub mod session;
pub mod source;
pub mod testing;
pub mod verification;
