//! Runner configuration.

use std::time::Duration;

use crosswave_engine::{DEFAULT_ASSERT_TIMEOUT, DEFAULT_POLL_INTERVAL};

use crate::runner::TestRunner;

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Deadline for assertions that carry no per-assertion override.
    pub assert_timeout: Duration,
    /// Pause between assertion polls.
    pub poll_interval: Duration,
    /// Whole-test deadline; elapsing it cancels the drain.
    pub global_timeout: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            assert_timeout: DEFAULT_ASSERT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            global_timeout: None,
        }
    }
}

/// Builder for [`TestRunner`].
pub struct RunnerBuilder {
    config: RunnerConfig,
}

impl RunnerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: RunnerConfig::default(),
        }
    }

    /// Set the default assertion timeout.
    pub fn assert_timeout(mut self, timeout: Duration) -> Self {
        self.config.assert_timeout = timeout;
        self
    }

    /// Set the pause between assertion polls.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.config.poll_interval = poll_interval;
        self
    }

    /// Set a whole-test deadline.
    pub fn global_timeout(mut self, timeout: Duration) -> Self {
        self.config.global_timeout = Some(timeout);
        self
    }

    /// Build the runner.
    pub fn build(self) -> TestRunner {
        TestRunner::with_config(self.config)
    }
}

impl Default for RunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
