//! End-to-end test definitions driven through the runner.

use std::time::Duration;

use crate::support::{two_origin_browser, CollectingReporter};
use crosswave_driver::{
    Command, Origin, Outcome, RunnerState, TestDefinition, TestRunner, TextExpectation,
};
use crosswave_engine::{AssertSpec, CommandError};
use url::Url;

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn origin(s: &str) -> Origin {
    Origin::parse(s).unwrap()
}

/// The canonical scenario: visit one origin, visit a second, and assert
/// inside the second origin's isolated context.
#[tokio::test(start_paused = true)]
async fn test_cross_origin_assertion_passes() {
    let mut browser = two_origin_browser();
    let mut runner = TestRunner::new();
    let mut reporter = CollectingReporter::new();

    let test = TestDefinition::new("navigates to site-b and asserts the heading")
        .navigate(url("http://site-a/"))
        .navigate(url("http://site-b/"))
        .run_in_origin(
            origin("http://site-b:80"),
            vec![Command::AssertText(
                AssertSpec::new("h1", TextExpectation::contains("Expected Title"))
                    .with_timeout(Duration::from_secs(1))
                    .with_poll_interval(Duration::from_millis(10)),
            )],
        );

    let report = runner.run(test, &mut browser, &mut reporter).await;

    assert_eq!(report.outcome, Outcome::Passed);
    assert_eq!(report.executed, 3);
    assert_eq!(report.remaining, 0);
    assert_eq!(runner.state(), RunnerState::TornDown);
    assert_eq!(reporter.reports.len(), 1);
}

/// Crossing to an origin the session never navigated to fails immediately;
/// the bridge does not navigate on the caller's behalf.
#[tokio::test]
async fn test_crossing_to_wrong_origin_fails() {
    let mut browser = two_origin_browser();
    let mut runner = TestRunner::new();
    let mut reporter = CollectingReporter::new();

    let test = TestDefinition::new("targets site-c while on site-b")
        .navigate(url("http://site-a/"))
        .navigate(url("http://site-b/"))
        .run_in_origin(origin("http://site-c:80"), vec![Command::query("h1")])
        .command(Command::query("h1"));

    let report = runner.run(test, &mut browser, &mut reporter).await;

    let diagnostic = report.outcome.diagnostic().expect("must fail");
    assert_eq!(diagnostic.command_index, 2);
    match &diagnostic.error {
        CommandError::OriginMismatch { requested, actual } => {
            assert_eq!(requested, &origin("http://site-c:80"));
            assert_eq!(actual.as_ref(), Some(&origin("http://site-b:80")));
        }
        other => panic!("expected OriginMismatch, got {:?}", other),
    }

    // Both navigations ran; the command after the crossing did not.
    assert_eq!(report.executed, 2);
    assert_eq!(report.remaining, 1);
    assert_eq!(runner.state(), RunnerState::TornDown);
}

#[tokio::test(start_paused = true)]
async fn test_nested_failure_surfaces_with_diagnostics() {
    let mut browser = two_origin_browser();
    let mut runner = TestRunner::new();
    let mut reporter = CollectingReporter::new();

    let test = TestDefinition::new("sub-program assertion times out")
        .navigate(url("http://site-b/"))
        .run_in_origin(
            origin("http://site-b:80"),
            vec![Command::AssertText(
                AssertSpec::new("h1", TextExpectation::contains("Never There"))
                    .with_timeout(Duration::from_millis(100))
                    .with_poll_interval(Duration::from_millis(20)),
            )],
        )
        .command(Command::query("h1"));

    let report = runner.run(test, &mut browser, &mut reporter).await;

    let diagnostic = report.outcome.diagnostic().expect("must fail");
    assert_eq!(diagnostic.command_index, 1);
    assert!(matches!(
        diagnostic.error,
        CommandError::AssertionTimeout { .. }
    ));
    let nested = diagnostic.nested.as_deref().expect("nested diagnostic");
    assert_eq!(nested.command_index, 0);

    // The caller's queue short-circuits on the relayed failure.
    assert_eq!(report.executed, 1);
    assert_eq!(report.remaining, 1);
}

#[tokio::test]
async fn test_first_failure_keeps_partial_execution_visible() {
    let mut browser = two_origin_browser();
    let mut runner = TestRunner::new();
    let mut reporter = CollectingReporter::new();

    let test = TestDefinition::new("fails in the middle")
        .navigate(url("http://site-a/"))
        .command(Command::query("#missing"))
        .navigate(url("http://site-b/"))
        .command(Command::query("h1"));

    let report = runner.run(test, &mut browser, &mut reporter).await;

    assert!(!report.passed());
    assert_eq!(report.executed, 1);
    assert_eq!(report.remaining, 2);
    let diagnostic = report.outcome.diagnostic().expect("must fail");
    assert_eq!(diagnostic.command_index, 1);
}

#[tokio::test]
async fn test_unreachable_navigation_reports_navigation_failure() {
    let mut browser = two_origin_browser();
    let mut runner = TestRunner::new();
    let mut reporter = CollectingReporter::new();

    let test = TestDefinition::new("navigates nowhere").navigate(url("http://nowhere/"));
    let report = runner.run(test, &mut browser, &mut reporter).await;

    let diagnostic = report.outcome.diagnostic().expect("must fail");
    assert!(matches!(
        diagnostic.error,
        CommandError::NavigationFailure { .. }
    ));
    assert_eq!(runner.state(), RunnerState::TornDown);
}
