//! Global timeout propagation into polls and crossings.

use std::time::Duration;

use crate::support::{two_origin_browser, CollectingReporter};
use crosswave_driver::{
    Command, Origin, Outcome, RunnerState, TestDefinition, TestRunner,
    TextExpectation,
};
use crosswave_engine::AssertSpec;
use url::Url;

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_global_timeout_cancels_a_pending_poll() {
    let mut browser = two_origin_browser();
    let mut runner = TestRunner::builder()
        .global_timeout(Duration::from_millis(30))
        .build();
    let mut reporter = CollectingReporter::new();

    let test = TestDefinition::new("polls forever")
        .navigate(url("http://site-a/"))
        .command(Command::AssertText(
            AssertSpec::new("h1", TextExpectation::contains("Never There"))
                .with_timeout(Duration::from_secs(600))
                .with_poll_interval(Duration::from_millis(100)),
        ));

    let report = runner.run(test, &mut browser, &mut reporter).await;

    assert_eq!(report.outcome, Outcome::Cancelled);
    // Teardown still happened.
    assert_eq!(runner.state(), RunnerState::TornDown);
    assert_eq!(reporter.reports.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_global_timeout_reaches_into_a_crossing() {
    let mut browser = two_origin_browser();
    let mut runner = TestRunner::builder()
        .global_timeout(Duration::from_millis(30))
        .build();
    let mut reporter = CollectingReporter::new();

    let test = TestDefinition::new("crossing is abandoned")
        .navigate(url("http://site-b/"))
        .run_in_origin(
            Origin::parse("http://site-b:80").unwrap(),
            vec![Command::AssertText(
                AssertSpec::new("h1", TextExpectation::contains("Never There"))
                    .with_timeout(Duration::from_secs(600))
                    .with_poll_interval(Duration::from_millis(100)),
            )],
        );

    let report = runner.run(test, &mut browser, &mut reporter).await;

    assert_eq!(report.outcome, Outcome::Cancelled);
    assert_eq!(runner.state(), RunnerState::TornDown);
}

#[tokio::test(start_paused = true)]
async fn test_fast_test_beats_the_global_timeout() {
    let mut browser = two_origin_browser();
    let mut runner = TestRunner::builder()
        .global_timeout(Duration::from_secs(60))
        .build();
    let mut reporter = CollectingReporter::new();

    let test = TestDefinition::new("finishes quickly")
        .navigate(url("http://site-a/"))
        .assert_text("h1", TextExpectation::contains("Site A"));

    let report = runner.run(test, &mut browser, &mut reporter).await;
    assert_eq!(report.outcome, Outcome::Passed);
}
