// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! The build pipeline.
//!
//! A run walks `Idle -> ProfileResolved -> ArtifactsReady -> SessionOpen -> Completed`, or ends in
//! `Failed` from any state before that. Cancellation is checked on every transition. Once a
//! session is open it is closed before the run returns, whatever the outcome.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use typed_builder::TypedBuilder;

use crate::core::{
    artifact::ArtifactSet,
    build::{BuildError, Compiler, CompilerDriver, CompilerSettings},
    cache::{ArtifactCache, CacheError},
    config::{Config, ConfigError},
    credentials::CredentialError,
    deployment::{self, DeploymentConfig, DeploymentError, DeploymentRecord},
    profile::{ProfileError, ProfileStore},
    session::{Connector, Session, SessionError, SessionKind},
    source::{SourceError, SourceSet},
    testing::{TestContext, TestError, TestReport, TestRunner},
    verification::{self, VerificationError, VerificationStatus, Verifier},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Test,
    Deploy,
    Verify,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Test => f.write_str("test"),
            Self::Deploy => f.write_str("deploy"),
            Self::Verify => f.write_str("verify"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    ProfileResolved,
    ArtifactsReady,
    SessionOpen,
    Completed,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use PipelineState::*;
        match (self, next) {
            (Idle, ProfileResolved)
            | (ProfileResolved, ArtifactsReady)
            | (ArtifactsReady, SessionOpen)
            | (SessionOpen, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Cooperative cancellation flag, shared with whoever may cancel the run.
#[derive(Clone, Debug, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Broad classes of failure, used to pick an exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Compilation,
    Connection,
    Timeout,
    MissingCredentials,
    TestFailure,
    Verification,
    Cancelled,
    Other,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Profile(#[from] ProfileError),
    #[error("{0}")]
    Build(#[from] BuildError),
    #[error("{0}")]
    Source(#[from] SourceError),
    #[error("{0}")]
    Credentials(#[from] CredentialError),
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("{0}")]
    Cache(#[from] CacheError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Deployment(#[from] DeploymentError),
    #[error("{0}")]
    Test(#[from] TestError),
    #[error("tests failed: {0}")]
    TestsFailed(TestReport),
    #[error("{0}")]
    Verification(#[from] VerificationError),

    #[error("cancelled")]
    Cancelled,
    #[error("illegal pipeline transition from {from:?} to {to:?}")]
    IllegalTransition {
        from: PipelineState,
        to: PipelineState,
    },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Profile(_) => ErrorKind::Configuration,
            Self::Build(BuildError::Source(SourceError::MissingDirectory(_))) => {
                ErrorKind::Configuration
            }
            Self::Build(_) => ErrorKind::Compilation,
            Self::Source(_) | Self::Cache(_) | Self::Io(_) => ErrorKind::Other,
            Self::Credentials(CredentialError::Dotenv(..)) => ErrorKind::Configuration,
            Self::Credentials(_) => ErrorKind::MissingCredentials,
            Self::Session(err) => session_kind(err),
            Self::Deployment(DeploymentError::Session(err)) => session_kind(err),
            Self::Deployment(_) => ErrorKind::Other,
            Self::Test(TestError::Session(err)) => session_kind(err),
            Self::Test(TestError::Timeout(_)) | Self::TestsFailed(_) => ErrorKind::TestFailure,
            Self::Test(TestError::EmptyCommand) => ErrorKind::Configuration,
            Self::Test(TestError::Spawn(..)) => ErrorKind::Other,
            Self::Verification(VerificationError::Session(err)) => session_kind(err),
            Self::Verification(_) => ErrorKind::Verification,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::IllegalTransition { .. } => ErrorKind::Other,
        }
    }
}

fn session_kind(err: &SessionError) -> ErrorKind {
    match err {
        SessionError::Connection { .. }
        | SessionError::ChainIdMismatch { .. }
        | SessionError::Rpc(_)
        | SessionError::PendingTransaction(_) => ErrorKind::Connection,
        SessionError::Timeout { .. } => ErrorKind::Timeout,
        SessionError::MissingCredentials(_) | SessionError::NoAccount => {
            ErrorKind::MissingCredentials
        }
        _ => ErrorKind::Other,
    }
}

/// What a completed run produced.
#[derive(Debug)]
pub enum Outcome {
    Tested(TestReport),
    Deployed(DeploymentRecord),
    Verified(BTreeMap<String, VerificationStatus>),
}

impl Outcome {
    /// One line per result, for reporting an outcome the caller will never see.
    pub fn summary(&self) -> Vec<String> {
        match self {
            Self::Tested(report) => vec![format!("tests: {report}")],
            Self::Deployed(record) => record
                .contracts
                .iter()
                .map(|(name, deployed)| format!("deployed {name} at {}", deployed.address))
                .collect(),
            Self::Verified(statuses) => statuses
                .iter()
                .map(|(name, status)| format!("verified {name}: {status}"))
                .collect(),
        }
    }
}

/// Tracks the current state of one run.
#[derive(Debug)]
struct StateMachine {
    state: PipelineState,
    cancellation: Cancellation,
}

impl StateMachine {
    fn new(cancellation: Cancellation) -> Self {
        Self {
            state: PipelineState::Idle,
            cancellation,
        }
    }

    fn advance(&mut self, next: PipelineState) -> Result<(), PipelineError> {
        if self.cancellation.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        if !self.state.can_transition_to(next) {
            return Err(PipelineError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(@grey, "pipeline: {:?} -> {next:?}", self.state);
        self.state = next;
        Ok(())
    }

    fn fail(&mut self) {
        if !self.state.is_terminal() {
            debug!(@grey, "pipeline: {:?} -> Failed", self.state);
            self.state = PipelineState::Failed;
        }
    }
}

/// Ties configuration, compiler, network access and the mode-specific work together.
#[derive(TypedBuilder)]
pub struct Orchestrator<'a, C, N, T, V> {
    config: &'a Config,
    profiles: &'a ProfileStore,
    compiler: C,
    connector: N,
    test_runner: T,
    verifier: V,
    #[builder(default)]
    deployment: DeploymentConfig,
    #[builder(default)]
    cancellation: Cancellation,
}

impl<C, N, T, V> Orchestrator<'_, C, N, T, V>
where
    C: Compiler,
    N: Connector,
    T: TestRunner,
    V: Verifier,
{
    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn connector(&self) -> &N {
        &self.connector
    }

    /// Bring artifacts up to date without touching any network.
    pub fn build(&self) -> Result<ArtifactSet, PipelineError> {
        let settings = CompilerSettings::from_config(&self.config.compiler)?;
        let driver = CompilerDriver::new(
            &self.compiler,
            ArtifactCache::new(self.config.cache_dir()),
            self.config.artifacts_dir(),
        );
        Ok(driver.build(&self.config.sources_dir(), &settings)?)
    }

    /// Run the pipeline in `mode` against the named profile, or the default one.
    pub async fn run(
        &self,
        profile_name: Option<&str>,
        mode: Mode,
    ) -> Result<Outcome, PipelineError> {
        let mut machine = StateMachine::new(self.cancellation.clone());
        let result = self.run_stages(&mut machine, profile_name, mode).await;
        if result.is_err() {
            machine.fail();
        }
        result
    }

    async fn run_stages(
        &self,
        machine: &mut StateMachine,
        profile_name: Option<&str>,
        mode: Mode,
    ) -> Result<Outcome, PipelineError> {
        let profile = self.profiles.resolve(profile_name)?;
        machine.advance(PipelineState::ProfileResolved)?;
        debug!(@grey, "running {mode} on network '{}'", profile.name);

        let artifacts = self.build()?;
        machine.advance(PipelineState::ArtifactsReady)?;
        info!(@grey, "{} artifacts ready", artifacts.len());

        let mut session = self.connector.open(profile).await?;
        let result = match machine.advance(PipelineState::SessionOpen) {
            Ok(()) => self.dispatch(&session, &artifacts, mode).await,
            Err(err) => Err(err),
        };
        let closed = session.close().await;
        let outcome = result?;
        closed?;

        if let Err(err) = machine.advance(PipelineState::Completed) {
            // the work finished before the cancellation was seen
            for line in outcome.summary() {
                warn!(@yellow, "{line}");
            }
            return Err(err);
        }
        Ok(outcome)
    }

    async fn dispatch(
        &self,
        session: &N::Session,
        artifacts: &ArtifactSet,
        mode: Mode,
    ) -> Result<Outcome, PipelineError> {
        let artifacts_dir = self.config.artifacts_dir();
        match mode {
            Mode::Test => {
                let tests_dir = self.config.tests_dir();
                let context = TestContext {
                    root: self.config.root(),
                    tests_dir: &tests_dir,
                    artifacts_dir: &artifacts_dir,
                    artifacts,
                };
                let report = self.test_runner.run_tests(&context, session).await?;
                if !report.is_success() {
                    for case in report.failures() {
                        warn!(@red, "failed: {}", case.name);
                    }
                    return Err(PipelineError::TestsFailed(report));
                }
                info!(@grey, "tests passed: {report}");
                Ok(Outcome::Tested(report))
            }
            Mode::Deploy => {
                let record = deployment::deploy(artifacts, &self.deployment, session).await?;
                // the simulated chain is gone once this process exits
                if session.kind() == SessionKind::Remote && !record.contracts.is_empty() {
                    let path = record.write(&artifacts_dir)?;
                    info!(@grey, "wrote deployment record {}", path.display());
                }
                Ok(Outcome::Deployed(record))
            }
            Mode::Verify => {
                if session.rpc_url().is_none() {
                    return Err(VerificationError::UnsupportedNetwork.into());
                }
                let record = DeploymentRecord::read(&artifacts_dir, session.network())
                    .map_err(VerificationError::from)?;
                let sources = SourceSet::scan(self.config.sources_dir())?;
                let statuses = verification::verify_deployments(
                    &self.verifier,
                    session,
                    &record,
                    artifacts,
                    &sources,
                )
                .await?;
                Ok(Outcome::Verified(statuses))
            }
        }
    }
}

/// Timeout applied to an entire test run.
pub fn test_runner_timeout(config: &Config) -> Duration {
    Duration::from_millis(config.test_runner_timeout_ms)
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
    };

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::core::{
        build::tests::CountingCompiler,
        credentials::{tests::StaticCredentials, EnvCredentialProvider},
        profile::NetworkProfile,
        session::{NetworkConnector, NetworkSession},
        testing::SmokeTestRunner,
        verification::VerificationRequest,
    };

    const CONFIG: &str = r#"
default_network = "local"

[networks.local]

[networks.remote_test]
url = "http://127.0.0.1:9"
timeout_ms = 2000

[compiler]
version = "0.8.12"
optimizer = { enabled = true, runs = 200 }
"#;

    fn project(config: &str) -> (TempDir, Config, ProfileStore) {
        let tmp = tempfile::tempdir().unwrap();
        let sources = tmp.path().join("contracts");
        fs::create_dir_all(&sources).unwrap();
        fs::write(sources.join("Counter.sol"), "contract Counter {}").unwrap();
        let config = Config::from_toml(config, tmp.path()).unwrap();
        let profiles = ProfileStore::from_config(&config).unwrap();
        (tmp, config, profiles)
    }

    /// Counts sessions opened and closed through it.
    #[derive(Default)]
    struct CountingConnector {
        opens: AtomicUsize,
        closes: Arc<AtomicUsize>,
    }

    struct CountingSession {
        inner: NetworkSession,
        closes: Arc<AtomicUsize>,
    }

    impl Connector for CountingConnector {
        type Session = CountingSession;

        async fn open(&self, profile: &NetworkProfile) -> Result<CountingSession, SessionError> {
            let inner = NetworkSession::open(profile, &StaticCredentials::default()).await?;
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(CountingSession {
                inner,
                closes: self.closes.clone(),
            })
        }
    }

    impl Session for CountingSession {
        fn network(&self) -> &str {
            self.inner.network()
        }

        fn kind(&self) -> SessionKind {
            self.inner.kind()
        }

        fn rpc_url(&self) -> Option<&reqwest::Url> {
            self.inner.rpc_url()
        }

        fn accounts(&self) -> &[alloy::primitives::Address] {
            self.inner.accounts()
        }

        async fn send_transaction(
            &self,
            tx: alloy::rpc::types::TransactionRequest,
        ) -> Result<crate::core::session::TxOutcome, SessionError> {
            self.inner.send_transaction(tx).await
        }

        async fn query(
            &self,
            query: crate::core::session::Query,
        ) -> Result<crate::core::session::QueryResponse, SessionError> {
            self.inner.query(query).await
        }

        async fn close(&mut self) -> Result<(), SessionError> {
            if !self.inner.is_closed() {
                self.closes.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.close().await
        }
    }

    /// Records the kind of session it ran against and reports a fixed result.
    #[derive(Default)]
    struct RecordingRunner {
        seen: Mutex<Vec<SessionKind>>,
        fail: bool,
        cancel_on_run: Option<Cancellation>,
    }

    impl TestRunner for RecordingRunner {
        async fn run_tests<S: Session>(
            &self,
            _: &TestContext<'_>,
            session: &S,
        ) -> Result<TestReport, TestError> {
            self.seen.lock().unwrap().push(session.kind());
            if let Some(cancellation) = &self.cancel_on_run {
                cancellation.cancel();
            }
            let outcome = if self.fail {
                crate::core::testing::TestOutcome::Failed("assertion failed".into())
            } else {
                crate::core::testing::TestOutcome::Passed
            };
            Ok(TestReport {
                cases: vec![crate::core::testing::TestCase {
                    name: "counts".into(),
                    outcome,
                }],
            })
        }
    }

    struct AlwaysPerfect;

    impl Verifier for AlwaysPerfect {
        async fn verify(
            &self,
            _: &VerificationRequest,
        ) -> Result<VerificationStatus, VerificationError> {
            Ok(VerificationStatus::Perfect)
        }
    }

    type TestOrchestrator<'a> =
        Orchestrator<'a, CountingCompiler, CountingConnector, RecordingRunner, AlwaysPerfect>;

    fn orchestrator<'a>(
        config: &'a Config,
        profiles: &'a ProfileStore,
        runner: RecordingRunner,
    ) -> TestOrchestrator<'a> {
        Orchestrator::builder()
            .config(config)
            .profiles(profiles)
            .compiler(CountingCompiler::default())
            .connector(CountingConnector::default())
            .test_runner(runner)
            .verifier(AlwaysPerfect)
            .build()
    }

    /// Sessions opened and closed so far.
    fn balanced(orchestrator: &TestOrchestrator<'_>) -> (usize, usize) {
        let connector = orchestrator.connector();
        (
            connector.opens.load(Ordering::SeqCst),
            connector.closes.load(Ordering::SeqCst),
        )
    }

    #[test]
    fn state_transitions() {
        use PipelineState::*;
        assert!(Idle.can_transition_to(ProfileResolved));
        assert!(SessionOpen.can_transition_to(Completed));
        assert!(ArtifactsReady.can_transition_to(Failed));
        assert!(!ArtifactsReady.can_transition_to(Completed));
        assert!(!Idle.can_transition_to(SessionOpen));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Idle));
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let mut machine = StateMachine::new(Cancellation::new());
        assert!(matches!(
            machine.advance(PipelineState::Completed),
            Err(PipelineError::IllegalTransition { .. })
        ));
        machine.fail();
        assert_eq!(machine.state, PipelineState::Failed);
    }

    #[tokio::test]
    async fn default_profile_tests_against_simulated_chain() {
        let (_tmp, config, profiles) = project(CONFIG);
        let orchestrator = orchestrator(&config, &profiles, RecordingRunner::default());

        let outcome = orchestrator.run(None, Mode::Test).await.unwrap();
        assert!(matches!(outcome, Outcome::Tested(report) if report.is_success()));
        assert_eq!(
            *orchestrator.test_runner.seen.lock().unwrap(),
            vec![SessionKind::Simulated]
        );
        assert_eq!(balanced(&orchestrator), (1, 1));
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_with_connection_kind() {
        let (_tmp, config, profiles) = project(CONFIG);
        let orchestrator = orchestrator(&config, &profiles, RecordingRunner::default());

        let err = orchestrator
            .run(Some("remote_test"), Mode::Deploy)
            .await
            .unwrap_err();
        assert!(
            matches!(err.kind(), ErrorKind::Connection | ErrorKind::Timeout),
            "unexpected error: {err}"
        );
        assert_eq!(balanced(&orchestrator), (0, 0));
    }

    #[test]
    fn malformed_dotenv_is_a_configuration_error() {
        let (tmp, _config, _profiles) = project(CONFIG);
        std::fs::write(tmp.path().join(".env"), "this is not an env file\n").unwrap();
        let err = PipelineError::from(EnvCredentialProvider::new(tmp.path()).unwrap_err());
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn unknown_profile_is_a_configuration_error() {
        let (_tmp, config, profiles) = project(CONFIG);
        let orchestrator = orchestrator(&config, &profiles, RecordingRunner::default());
        let err = orchestrator.run(Some("mainnet"), Mode::Test).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(orchestrator.compiler().calls.get(), 0);
    }

    #[tokio::test]
    async fn failing_tests_still_close_the_session() {
        let (_tmp, config, profiles) = project(CONFIG);
        let runner = RecordingRunner {
            fail: true,
            ..Default::default()
        };
        let orchestrator = orchestrator(&config, &profiles, runner);
        let err = orchestrator.run(None, Mode::Test).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TestFailure);
        assert_eq!(balanced(&orchestrator), (1, 1));
    }

    #[tokio::test]
    async fn compilation_failure_never_opens_a_session() {
        let (_tmp, config, profiles) = project(CONFIG);
        let orchestrator = Orchestrator::builder()
            .config(&config)
            .profiles(&profiles)
            .compiler(CountingCompiler {
                fail_with: Some("ParserError: expected ';'".into()),
                ..Default::default()
            })
            .connector(CountingConnector::default())
            .test_runner(RecordingRunner::default())
            .verifier(AlwaysPerfect)
            .build();
        let err = orchestrator.run(None, Mode::Test).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Compilation);
        assert_eq!(balanced(&orchestrator), (0, 0));
    }

    #[tokio::test]
    async fn cancellation_stops_the_run() {
        let (_tmp, config, profiles) = project(CONFIG);
        let cancellation = Cancellation::new();
        cancellation.cancel();
        let orchestrator = Orchestrator::builder()
            .config(&config)
            .profiles(&profiles)
            .compiler(CountingCompiler::default())
            .connector(CountingConnector::default())
            .test_runner(RecordingRunner::default())
            .verifier(AlwaysPerfect)
            .cancellation(cancellation)
            .build();
        let err = orchestrator.run(None, Mode::Deploy).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(orchestrator.compiler().calls.get(), 0);
    }

    #[tokio::test]
    async fn cancellation_after_the_work_finishes() {
        let (_tmp, config, profiles) = project(CONFIG);
        let cancellation = Cancellation::new();
        let runner = RecordingRunner {
            cancel_on_run: Some(cancellation.clone()),
            ..Default::default()
        };
        let orchestrator = Orchestrator::builder()
            .config(&config)
            .profiles(&profiles)
            .compiler(CountingCompiler::default())
            .connector(CountingConnector::default())
            .test_runner(runner)
            .verifier(AlwaysPerfect)
            .cancellation(cancellation)
            .build();
        let err = orchestrator.run(None, Mode::Test).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(balanced(&orchestrator), (1, 1));
    }

    #[test]
    fn outcome_summary_lists_addresses() {
        let address = alloy::primitives::Address::repeat_byte(0x11);
        let record = DeploymentRecord {
            network: "remote_test".into(),
            chain_id: 421614,
            contracts: BTreeMap::from([(
                "Counter.sol:Counter".to_string(),
                crate::core::deployment::DeployedContract {
                    source_name: "Counter.sol".into(),
                    address,
                    tx_hash: alloy::primitives::TxHash::repeat_byte(0x22),
                    block_number: Some(7),
                    gas_used: 53_000,
                },
            )]),
        };
        assert_eq!(
            Outcome::Deployed(record).summary(),
            vec![format!("deployed Counter.sol:Counter at {address}")]
        );
        assert_eq!(
            Outcome::Tested(TestReport::default()).summary(),
            vec!["tests: 0 passed, 0 failed".to_string()]
        );
    }

    #[tokio::test]
    async fn repeated_builds_compile_once() {
        let (tmp, config, profiles) = project(CONFIG);
        let orchestrator = orchestrator(&config, &profiles, RecordingRunner::default());
        let first = orchestrator.build().unwrap();
        let second = orchestrator.build().unwrap();
        assert_eq!(orchestrator.compiler().calls.get(), 1);
        assert_eq!(first, second);

        let entries = fs::read_dir(tmp.path().join("cache")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn changing_optimizer_runs_adds_a_cache_entry() {
        let (tmp, config, profiles) = project(CONFIG);
        orchestrator(&config, &profiles, RecordingRunner::default())
            .build()
            .unwrap();

        let changed = CONFIG.replace("runs = 200", "runs = 300");
        let config = Config::from_toml(&changed, tmp.path()).unwrap();
        let orchestrator = orchestrator(&config, &profiles, RecordingRunner::default());
        orchestrator.build().unwrap();
        assert_eq!(orchestrator.compiler().calls.get(), 1);

        let entries = fs::read_dir(tmp.path().join("cache")).unwrap().count();
        assert_eq!(entries, 2);
    }

    #[tokio::test]
    async fn local_deploys_are_not_recorded() {
        let (tmp, config, profiles) = project(CONFIG);
        let orchestrator = orchestrator(&config, &profiles, RecordingRunner::default());
        let outcome = orchestrator.run(None, Mode::Deploy).await.unwrap();
        let Outcome::Deployed(record) = outcome else {
            panic!("expected a deployment");
        };
        assert_eq!(record.contracts.len(), 1);
        assert!(!tmp.path().join("artifacts/deployments").exists());
        assert_eq!(balanced(&orchestrator), (1, 1));
    }

    #[tokio::test]
    async fn verify_on_simulated_chain_fails_with_verification_kind() {
        let (_tmp, config, profiles) = project(CONFIG);
        let orchestrator = orchestrator(&config, &profiles, RecordingRunner::default());
        let err = orchestrator.run(None, Mode::Verify).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Verification);
        assert_eq!(balanced(&orchestrator), (1, 1));
    }

    #[tokio::test]
    async fn smoke_runner_through_real_connector() {
        let (_tmp, config, profiles) = project(CONFIG);
        let orchestrator = Orchestrator::builder()
            .config(&config)
            .profiles(&profiles)
            .compiler(CountingCompiler::default())
            .connector(NetworkConnector::new(StaticCredentials::default()))
            .test_runner(SmokeTestRunner::new(test_runner_timeout(&config)))
            .verifier(AlwaysPerfect)
            .build();
        let outcome = orchestrator.run(Some("local"), Mode::Test).await.unwrap();
        let Outcome::Tested(report) = outcome else {
            panic!("expected a test report");
        };
        assert_eq!(report.to_string(), "1 passed, 0 failed");
    }
}
