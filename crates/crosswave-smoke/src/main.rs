//! Crosswave Smoke Harness
//!
//! Exercises the executor end-to-end against the scripted headless browser:
//! a two-origin scenario that must pass, and an origin-mismatch scenario
//! that must fail with exactly the expected diagnostic. Exits non-zero if
//! either scenario deviates.

use std::time::Duration;

use anyhow::bail;
use crosswave_driver::{
    Command, LogReporter, Origin, Outcome, TestDefinition, TestRunner, TextExpectation,
};
use crosswave_engine::{AssertSpec, CommandError};
use crosswave_headless::{HeadlessBrowser, ScriptedPage};
use tracing::info;
use url::Url;

/// Parse command line arguments
struct Args {
    global_timeout_ms: u64,
    poll_ms: u64,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut global_timeout_ms = 10_000u64;
        let mut poll_ms = 50u64;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--global-timeout-ms" => {
                    if let Some(val) = args.next() {
                        global_timeout_ms = val.parse().unwrap_or(10_000);
                    }
                }
                "--poll-ms" => {
                    if let Some(val) = args.next() {
                        poll_ms = val.parse().unwrap_or(50);
                    }
                }
                _ => {}
            }
        }

        Self {
            global_timeout_ms,
            poll_ms,
        }
    }
}

/// The scripted sites the scenarios run against. The docs heading only
/// renders on the third query, so the passing scenario has to poll.
fn scripted_browser() -> HeadlessBrowser {
    HeadlessBrowser::new()
        .with_page(ScriptedPage::new("http://localhost:3000/").element("h1", "Local App"))
        .with_page(
            ScriptedPage::new("https://docs.crosswave.dev/")
                .element_visible_from("h1", "Why Crosswave?", 3),
        )
}

fn docs_origin() -> Origin {
    Origin::parse("https://docs.crosswave.dev:443").expect("static origin must parse")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let poll = Duration::from_millis(args.poll_ms);

    let mut runner = TestRunner::builder()
        .global_timeout(Duration::from_millis(args.global_timeout_ms))
        .poll_interval(poll)
        .build();
    let mut reporter = LogReporter;

    // Scenario 1: navigate across two origins and assert inside the second
    // origin's isolated context.
    let mut browser = scripted_browser();
    let passing = TestDefinition::new("cross-origin heading assertion")
        .navigate(Url::parse("http://localhost:3000/")?)
        .navigate(Url::parse("https://docs.crosswave.dev/")?)
        .run_in_origin(
            docs_origin(),
            vec![Command::AssertText(
                AssertSpec::new("h1", TextExpectation::contains("Why Crosswave?"))
                    .with_timeout(Duration::from_secs(4))
                    .with_poll_interval(poll),
            )],
        );

    let report = runner.run(passing, &mut browser, &mut reporter).await;
    if report.outcome != Outcome::Passed {
        bail!("passing scenario deviated: {:?}", report.outcome);
    }

    // Scenario 2: the crossing targets an origin the session never
    // navigated to; the bridge must refuse without navigating.
    let mut browser = scripted_browser();
    let mismatched = TestDefinition::new("crossing without prior navigation")
        .navigate(Url::parse("http://localhost:3000/")?)
        .navigate(Url::parse("https://docs.crosswave.dev/")?)
        .run_in_origin(
            Origin::parse("https://elsewhere.example:443").expect("static origin must parse"),
            vec![Command::query("h1")],
        );

    let report = runner.run(mismatched, &mut browser, &mut reporter).await;
    match report.outcome.diagnostic() {
        Some(diagnostic)
            if matches!(diagnostic.error, CommandError::OriginMismatch { .. }) =>
        {
            info!("mismatch scenario failed with the expected diagnostic");
        }
        other => bail!("mismatch scenario deviated: {:?}", other),
    }

    info!("smoke harness complete");
    Ok(())
}
