//! The test runner: one session per test, drained to a terminal outcome.

use crosswave_core::{BrowserSurface, Origin, Session};
use crosswave_engine::{
    cancel_pair, Command, CommandQueue, ExecContext, ExecDefaults, Outcome, TextExpectation,
};
use tracing::{info, warn};
use url::Url;

use crate::config::{RunnerBuilder, RunnerConfig};
use crate::reporter::Reporter;

/// Runner lifecycle states.
///
/// `TornDown` always follows a terminal outcome, whatever it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Created,
    Running,
    Passed,
    Failed,
    TornDown,
}

/// An ordered list of commands under a test name.
#[derive(Debug, Clone)]
pub struct TestDefinition {
    name: String,
    commands: Vec<Command>,
}

impl TestDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    /// Append any command.
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Append a navigation.
    pub fn navigate(self, url: Url) -> Self {
        self.command(Command::navigate(url))
    }

    /// Append a retried text assertion.
    pub fn assert_text(self, selector: &str, expect: TextExpectation) -> Self {
        self.command(Command::assert_text(selector, expect))
    }

    /// Append a boundary crossing running `program` inside `origin`.
    pub fn run_in_origin(self, origin: Origin, program: Vec<Command>) -> Self {
        self.command(Command::run_in_origin(origin, program))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

/// What one finished test looked like.
#[derive(Debug, Clone, PartialEq)]
pub struct TestReport {
    pub name: String,
    pub outcome: Outcome,
    /// Commands that reached a terminal state.
    pub executed: usize,
    /// Commands short-circuited by the first failure.
    pub remaining: usize,
}

impl TestReport {
    pub fn passed(&self) -> bool {
        self.outcome.is_passed()
    }
}

/// Owns the session lifecycle for one test at a time.
pub struct TestRunner {
    config: RunnerConfig,
    state: RunnerState,
}

impl TestRunner {
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            config,
            state: RunnerState::Created,
        }
    }

    pub fn builder() -> RunnerBuilder {
        RunnerBuilder::new()
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run one test to its terminal outcome.
    ///
    /// The session is created here and torn down here, unconditionally; by
    /// the time the drain returns, any retry state or boundary crossing is
    /// already gone, so teardown only has the session left to release.
    pub async fn run(
        &mut self,
        test: TestDefinition,
        browser: &mut dyn BrowserSurface,
        reporter: &mut dyn Reporter,
    ) -> TestReport {
        let TestDefinition { name, commands } = test;
        info!(test = %name, commands = commands.len(), "Test starting");
        self.state = RunnerState::Running;

        let mut session = Session::new();
        let (cancel_handle, cancel_signal) = cancel_pair();

        let drain_report = {
            let mut queue = CommandQueue::from_commands(commands);
            let mut ctx = ExecContext::new(&mut session, browser)
                .with_cancel(cancel_signal)
                .with_defaults(ExecDefaults {
                    assert_timeout: self.config.assert_timeout,
                    poll_interval: self.config.poll_interval,
                });

            match self.config.global_timeout {
                Some(limit) => {
                    let drain = queue.drain(&mut ctx);
                    tokio::pin!(drain);
                    tokio::select! {
                        report = &mut drain => report,
                        _ = tokio::time::sleep(limit) => {
                            warn!(
                                test = %name,
                                timeout_ms = limit.as_millis() as u64,
                                "Global timeout elapsed, cancelling drain"
                            );
                            cancel_handle.cancel();
                            // The drain observes the signal at its next
                            // suspension point and winds down.
                            drain.await
                        }
                    }
                }
                None => queue.drain(&mut ctx).await,
            }
        };

        let outcome = drain_report.outcome();
        self.state = if outcome.is_passed() {
            RunnerState::Passed
        } else {
            RunnerState::Failed
        };

        session.teardown();
        self.state = RunnerState::TornDown;

        let report = TestReport {
            name,
            outcome,
            executed: drain_report.executed(),
            remaining: drain_report.remaining,
        };
        reporter.report(&report);
        report
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::NullReporter;
    use crosswave_headless::{HeadlessBrowser, ScriptedPage};

    fn site_a() -> HeadlessBrowser {
        HeadlessBrowser::new()
            .with_page(ScriptedPage::new("http://site-a/").element("h1", "Site A"))
    }

    struct CollectingReporter {
        reports: Vec<TestReport>,
    }

    impl Reporter for CollectingReporter {
        fn report(&mut self, report: &TestReport) {
            self.reports.push(report.clone());
        }
    }

    #[tokio::test]
    async fn test_runner_reaches_torn_down_after_pass() {
        let mut browser = site_a();
        let mut runner = TestRunner::new();
        assert_eq!(runner.state(), RunnerState::Created);

        let test = TestDefinition::new("passes")
            .navigate(Url::parse("http://site-a/").unwrap())
            .assert_text("h1", TextExpectation::contains("Site A"));

        let report = runner.run(test, &mut browser, &mut NullReporter).await;
        assert!(report.passed());
        assert_eq!(runner.state(), RunnerState::TornDown);
    }

    #[tokio::test]
    async fn test_runner_reaches_torn_down_after_failure() {
        let mut browser = site_a();
        let mut runner = TestRunner::new();

        let test = TestDefinition::new("fails")
            .navigate(Url::parse("http://nowhere/").unwrap());

        let report = runner.run(test, &mut browser, &mut NullReporter).await;
        assert!(!report.passed());
        assert!(matches!(report.outcome, Outcome::Failed(_)));
        assert_eq!(runner.state(), RunnerState::TornDown);
    }

    #[tokio::test]
    async fn test_reporter_receives_exactly_one_report() {
        let mut browser = site_a();
        let mut runner = TestRunner::new();
        let mut reporter = CollectingReporter {
            reports: Vec::new(),
        };

        let test =
            TestDefinition::new("reported").navigate(Url::parse("http://site-a/").unwrap());
        runner.run(test, &mut browser, &mut reporter).await;

        assert_eq!(reporter.reports.len(), 1);
        assert_eq!(reporter.reports[0].name, "reported");
        assert_eq!(reporter.reports[0].executed, 1);
    }

    #[tokio::test]
    async fn test_definition_builder_keeps_order() {
        let test = TestDefinition::new("ordered")
            .navigate(Url::parse("http://site-a/").unwrap())
            .assert_text("h1", TextExpectation::contains("x"));

        assert_eq!(test.commands().len(), 2);
        assert!(matches!(test.commands()[0], Command::Navigate { .. }));
        assert!(matches!(test.commands()[1], Command::AssertText(_)));
    }
}
