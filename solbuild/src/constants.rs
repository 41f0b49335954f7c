// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

pub const EXIT_OTHER: u8 = 1;
pub const EXIT_CONFIGURATION: u8 = 2;
pub const EXIT_COMPILATION: u8 = 3;
pub const EXIT_CONNECTION: u8 = 4;
pub const EXIT_TEST_FAILURE: u8 = 5;
pub const EXIT_MISSING_CREDENTIALS: u8 = 6;
pub const EXIT_VERIFICATION: u8 = 7;
/// Conventional shell status for termination by SIGINT.
pub const EXIT_CANCELLED: u8 = 130;
