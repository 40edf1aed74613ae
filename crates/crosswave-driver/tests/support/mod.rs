//! Test support utilities for Crosswave integration tests
//!
//! This module provides helpers for writing integration tests:
//! - Scripted two-origin browsers
//! - CollectingReporter: captures reports for assertions

mod sites;

pub use sites::{two_origin_browser, CollectingReporter};
