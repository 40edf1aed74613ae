//! Integration tests for the Crosswave executor
//!
//! These tests verify end-to-end behavior of the runner, queue, retry
//! engine, and boundary bridge working together.
//!
//! ## Test Categories
//!
//! - `end_to_end`: full test definitions, crossing semantics, failure paths
//! - `cancellation`: global timeout propagation

mod cancellation;
mod end_to_end;
