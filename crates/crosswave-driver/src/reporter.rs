//! Reporting seam.
//!
//! The driver hands each finished test to a [`Reporter`]; formatting and
//! output live behind this trait, outside the core.

use tracing::{error, info, warn};

use crate::runner::TestReport;
use crosswave_engine::Outcome;

/// Receives one report per finished test.
pub trait Reporter {
    fn report(&mut self, report: &TestReport);
}

/// Reporter that logs through `tracing`.
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, report: &TestReport) {
        match &report.outcome {
            Outcome::Passed => {
                info!(test = %report.name, executed = report.executed, "Test passed");
            }
            Outcome::Failed(diagnostic) => {
                error!(
                    test = %report.name,
                    executed = report.executed,
                    remaining = report.remaining,
                    diagnostic = %diagnostic.render(),
                    "Test failed"
                );
            }
            Outcome::Cancelled => {
                warn!(test = %report.name, executed = report.executed, "Test cancelled");
            }
        }
    }
}

/// Reporter that discards everything.
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _report: &TestReport) {}
}
