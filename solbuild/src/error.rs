// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::fmt;
use std::process::ExitCode;

use solbuild_tools::core::{
    config::ConfigError,
    pipeline::{ErrorKind, PipelineError},
};

use crate::constants::*;

pub type SolbuildResult = Result<(), SolbuildError>;

#[derive(Debug)]
pub struct SolbuildError {
    error: eyre::Error,
    exit_code: ExitCode,
}

impl SolbuildError {
    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }
}

impl fmt::Display for SolbuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl From<std::io::Error> for SolbuildError {
    fn from(err: std::io::Error) -> Self {
        Self {
            error: err.into(),
            exit_code: ExitCode::from(EXIT_OTHER),
        }
    }
}

impl From<ConfigError> for SolbuildError {
    fn from(err: ConfigError) -> Self {
        Self {
            error: err.into(),
            exit_code: ExitCode::from(EXIT_CONFIGURATION),
        }
    }
}

impl From<PipelineError> for SolbuildError {
    fn from(err: PipelineError) -> Self {
        let exit_code = ExitCode::from(exit_status(err.kind()));
        Self {
            error: err.into(),
            exit_code,
        }
    }
}

pub fn exit_status(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Configuration => EXIT_CONFIGURATION,
        ErrorKind::Compilation => EXIT_COMPILATION,
        ErrorKind::Connection | ErrorKind::Timeout => EXIT_CONNECTION,
        ErrorKind::TestFailure => EXIT_TEST_FAILURE,
        ErrorKind::MissingCredentials => EXIT_MISSING_CREDENTIALS,
        ErrorKind::Verification => EXIT_VERIFICATION,
        ErrorKind::Cancelled => EXIT_CANCELLED,
        ErrorKind::Other => EXIT_OTHER,
    }
}
