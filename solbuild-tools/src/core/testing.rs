// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Test runners.
//!
//! A project either names an external test command, which is spawned with the session details in
//! its environment, or relies on the built-in smoke runner which deploys every argument-free
//! contract and checks that code landed at the returned address.

use std::{fmt, path::Path, process::Stdio, time::Duration};

use tokio::{process::Command, time::timeout};

use crate::core::{
    artifact::ArtifactSet,
    deployment::{self, DeploymentConfig, DeploymentError},
    session::{Session, SessionError},
};

pub const ENV_NETWORK: &str = "SOLBUILD_NETWORK";
pub const ENV_CHAIN_ID: &str = "SOLBUILD_CHAIN_ID";
pub const ENV_RPC_URL: &str = "SOLBUILD_RPC_URL";
pub const ENV_ARTIFACTS: &str = "SOLBUILD_ARTIFACTS";
pub const ENV_TESTS: &str = "SOLBUILD_TESTS";

#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("test run exceeded {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("failed to start test command {0}: {1}")]
    Spawn(String, #[source] std::io::Error),
    #[error("test command is empty")]
    EmptyCommand,
    #[error("{0}")]
    Session(#[from] SessionError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub outcome: TestOutcome,
}

/// Results of one test run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestReport {
    pub cases: Vec<TestCase>,
}

impl TestReport {
    pub fn passed(&self) -> usize {
        self.cases
            .iter()
            .filter(|case| case.outcome == TestOutcome::Passed)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestCase> {
        self.cases
            .iter()
            .filter(|case| matches!(case.outcome, TestOutcome::Failed(_)))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    fn push(&mut self, name: impl Into<String>, outcome: TestOutcome) {
        self.cases.push(TestCase {
            name: name.into(),
            outcome,
        });
    }
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.cases.len() - self.passed();
        write!(f, "{} passed, {failed} failed", self.passed())
    }
}

/// Locations handed to a test runner.
#[derive(Clone, Debug)]
pub struct TestContext<'a> {
    pub root: &'a Path,
    pub tests_dir: &'a Path,
    pub artifacts_dir: &'a Path,
    pub artifacts: &'a ArtifactSet,
}

#[allow(async_fn_in_trait)]
pub trait TestRunner {
    async fn run_tests<S: Session>(
        &self,
        context: &TestContext<'_>,
        session: &S,
    ) -> Result<TestReport, TestError>;
}

/// Either runner, chosen from configuration.
#[derive(Debug)]
pub enum ConfiguredRunner {
    Command(CommandTestRunner),
    Smoke(SmokeTestRunner),
}

impl ConfiguredRunner {
    pub fn new(command: Option<Vec<String>>, timeout: Duration) -> Self {
        match command {
            Some(command) => Self::Command(CommandTestRunner::new(command, timeout)),
            None => Self::Smoke(SmokeTestRunner::new(timeout)),
        }
    }
}

impl TestRunner for ConfiguredRunner {
    async fn run_tests<S: Session>(
        &self,
        context: &TestContext<'_>,
        session: &S,
    ) -> Result<TestReport, TestError> {
        match self {
            Self::Command(runner) => runner.run_tests(context, session).await,
            Self::Smoke(runner) => runner.run_tests(context, session).await,
        }
    }
}

/// Runs an external command, passing the session details through the environment.
///
/// The simulated chain lives inside this process, so a command run against it receives no RPC
/// URL.
#[derive(Debug)]
pub struct CommandTestRunner {
    command: Vec<String>,
    timeout: Duration,
}

impl CommandTestRunner {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }
}

impl TestRunner for CommandTestRunner {
    async fn run_tests<S: Session>(
        &self,
        context: &TestContext<'_>,
        session: &S,
    ) -> Result<TestReport, TestError> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(TestError::EmptyCommand);
        };
        let display = self.command.join(" ");
        let chain_id = session.chain_id().await?;
        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(context.root)
            .env(ENV_NETWORK, session.network())
            .env(ENV_CHAIN_ID, chain_id.to_string())
            .env(ENV_ARTIFACTS, context.artifacts_dir)
            .env(ENV_TESTS, context.tests_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        match session.rpc_url() {
            Some(url) => cmd.env(ENV_RPC_URL, url.as_str()),
            None => cmd.env_remove(ENV_RPC_URL),
        };
        info!(@grey, "running test command: {display}");
        let mut child = cmd
            .spawn()
            .map_err(|err| TestError::Spawn(display.clone(), err))?;
        let status = match timeout(self.timeout, child.wait()).await {
            Ok(status) => status.map_err(|err| TestError::Spawn(display.clone(), err))?,
            Err(_) => {
                // kill_on_drop reaps the child once it goes out of scope
                return Err(TestError::Timeout(self.timeout));
            }
        };

        let mut report = TestReport::default();
        if status.success() {
            report.push(display, TestOutcome::Passed);
        } else {
            let reason = match status.code() {
                Some(code) => format!("exited with code {code}"),
                None => "terminated by signal".to_string(),
            };
            report.push(display, TestOutcome::Failed(reason));
        }
        Ok(report)
    }
}

/// Deploys every argument-free contract and checks that each one has code afterwards.
#[derive(Debug)]
pub struct SmokeTestRunner {
    timeout: Duration,
}

impl SmokeTestRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run<S: Session>(
        &self,
        context: &TestContext<'_>,
        session: &S,
    ) -> Result<TestReport, TestError> {
        let mut report = TestReport::default();
        for artifact in context.artifacts.deployable() {
            if artifact.constructor_inputs() > 0 {
                debug!(@grey, "smoke test skips {}: constructor takes arguments", artifact.contract_name);
                continue;
            }
            let qualified = artifact.fully_qualified_name();
            let name = format!("deploys {qualified}");
            let config = DeploymentConfig {
                contracts: vec![qualified.clone()],
                ..Default::default()
            };
            let outcome = match deployment::deploy(context.artifacts, &config, session).await {
                Ok(record) => match record.contracts.get(&qualified) {
                    Some(deployed) => {
                        let code = session.code_at(deployed.address).await?;
                        if code.is_empty() {
                            TestOutcome::Failed(format!("no code at {}", deployed.address))
                        } else {
                            TestOutcome::Passed
                        }
                    }
                    None => TestOutcome::Failed("contract was not deployed".into()),
                },
                // losing the chain aborts the run instead of failing one case
                Err(DeploymentError::Session(err)) => return Err(err.into()),
                Err(err) => TestOutcome::Failed(err.to_string()),
            };
            report.push(name, outcome);
        }
        if report.cases.is_empty() {
            warn!(@yellow, "no deployable contracts to smoke test");
        }
        Ok(report)
    }
}

impl TestRunner for SmokeTestRunner {
    async fn run_tests<S: Session>(
        &self,
        context: &TestContext<'_>,
        session: &S,
    ) -> Result<TestReport, TestError> {
        timeout(self.timeout, self.run(context, session))
            .await
            .map_err(|_| TestError::Timeout(self.timeout))?
    }
}
