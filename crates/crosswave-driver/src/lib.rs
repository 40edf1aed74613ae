//! # Crosswave Driver
//!
//! Owns the session lifecycle for one test: create the session, build the
//! command queue from a test definition, drain it, tear the session down,
//! and report pass/fail with the first failure's diagnostic.
//!
//! The runner's states are `Created -> Running -> (Passed | Failed) ->
//! TornDown`; teardown is unconditional, so a failing test never leaks its
//! session.

mod config;
mod reporter;
mod runner;

pub use config::{RunnerBuilder, RunnerConfig};
pub use reporter::{LogReporter, NullReporter, Reporter};
pub use runner::{RunnerState, TestDefinition, TestReport, TestRunner};

// Re-exported so test authors can write a whole test against one crate.
pub use crosswave_core::Origin;
pub use crosswave_engine::{Command, Outcome, TextExpectation};
