//! Crosswave Integration Tests
//!
//! End-to-end tests for the command executor: full test definitions driven
//! through the runner against the scripted headless browser.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test --package crosswave-driver --test integration_tests
//!
//! # Run specific test category
//! cargo test --package crosswave-driver --test integration_tests end_to_end
//! cargo test --package crosswave-driver --test integration_tests cancellation
//!
//! # Run single test
//! cargo test --package crosswave-driver --test integration_tests test_cross_origin_assertion_passes
//! ```
//!
//! ## Test Categories
//!
//! - **end_to_end**: whole test definitions, pass and fail paths, crossing
//!   semantics
//! - **cancellation**: global timeout propagation into polls and crossings

// Test support utilities
mod support;

// Test modules
mod integration;
