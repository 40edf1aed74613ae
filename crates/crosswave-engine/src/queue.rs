//! Strict, in-order, single-flight command execution.

use std::collections::VecDeque;
use std::time::Duration;

use crosswave_core::{BrowserSurface, Session, SessionError};
use tracing::{debug, info, warn};
use url::Url;

use crate::bridge;
use crate::cancel::CancelSignal;
use crate::command::{Command, CommandOutput};
use crate::error::{CommandError, Diagnostic, Outcome};
use crate::retry;

/// Default deadline for a retried assertion.
pub const DEFAULT_ASSERT_TIMEOUT: Duration = Duration::from_secs(4);

/// Default pause between assertion polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Timing defaults applied to assertions that carry no overrides.
#[derive(Debug, Clone, Copy)]
pub struct ExecDefaults {
    pub assert_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ExecDefaults {
    fn default() -> Self {
        Self {
            assert_timeout: DEFAULT_ASSERT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Everything a command needs to execute: the session it mutates, the
/// browser it drives, the cancellation signal it observes, and timing
/// defaults.
pub struct ExecContext<'a> {
    pub session: &'a mut Session,
    pub browser: &'a mut dyn BrowserSurface,
    pub cancel: CancelSignal,
    pub defaults: ExecDefaults,
}

impl<'a> ExecContext<'a> {
    pub fn new(session: &'a mut Session, browser: &'a mut dyn BrowserSurface) -> Self {
        Self {
            session,
            browser,
            cancel: CancelSignal::never(),
            defaults: ExecDefaults::default(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_defaults(mut self, defaults: ExecDefaults) -> Self {
        self.defaults = defaults;
        self
    }
}

/// What a drain produced: one output per executed command, the count of
/// commands short-circuited by the first failure, and that failure, if any.
///
/// Partial execution stays visible: `outputs` keeps the results of every
/// command that completed before the failure.
#[derive(Debug, Clone, PartialEq)]
pub struct DrainReport {
    pub outputs: Vec<CommandOutput>,
    pub remaining: usize,
    pub failure: Option<Diagnostic>,
}

impl DrainReport {
    pub fn executed(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_passed(&self) -> bool {
        self.failure.is_none()
    }

    /// Collapse the report to a terminal outcome.
    pub fn outcome(&self) -> Outcome {
        match &self.failure {
            None => Outcome::Passed,
            Some(diag) if matches!(diag.error, CommandError::Cancelled) => Outcome::Cancelled,
            Some(diag) => Outcome::Failed(diag.clone()),
        }
    }
}

/// Holds commands and executes them strictly in insertion order.
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: VecDeque<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_commands(commands: Vec<Command>) -> Self {
        Self {
            commands: commands.into(),
        }
    }

    /// Append a command at the tail. Any kind ordering is legal.
    pub fn enqueue(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Execute all commands in insertion order, at most one in flight.
    ///
    /// The first failure short-circuits the remainder; queue state is not
    /// rolled back.
    pub async fn drain(&mut self, ctx: &mut ExecContext<'_>) -> DrainReport {
        let mut outputs = Vec::new();
        let mut index = 0usize;

        while let Some(command) = self.commands.pop_front() {
            if ctx.cancel.is_cancelled() {
                let remaining = self.commands.len() + 1;
                self.commands.clear();
                warn!(index, remaining, "Drain cancelled before command start");
                return DrainReport {
                    outputs,
                    remaining,
                    failure: Some(Diagnostic::new(
                        index,
                        command.describe(),
                        CommandError::Cancelled,
                    )),
                };
            }

            debug!(index, kind = %command.kind(), "Executing command");
            match execute_command(&command, index, ctx).await {
                Ok(output) => {
                    info!(index, kind = %command.kind(), "Command complete");
                    outputs.push(output);
                    index += 1;
                }
                Err(diagnostic) => {
                    let remaining = self.commands.len();
                    self.commands.clear();
                    warn!(
                        index,
                        kind = %command.kind(),
                        error = %diagnostic.error,
                        remaining,
                        "Command failed, aborting queue"
                    );
                    return DrainReport {
                        outputs,
                        remaining,
                        failure: Some(diagnostic),
                    };
                }
            }
        }

        info!(executed = outputs.len(), "Queue drained");
        DrainReport {
            outputs,
            remaining: 0,
            failure: None,
        }
    }
}

async fn execute_command(
    command: &Command,
    index: usize,
    ctx: &mut ExecContext<'_>,
) -> Result<CommandOutput, Diagnostic> {
    match command {
        // The bridge attaches nested diagnostics itself.
        Command::RunInOrigin { origin, program } => {
            bridge::run_in_origin(ctx, index, origin, program).await
        }
        Command::Navigate { url } => execute_navigate(url, ctx)
            .map_err(|error| Diagnostic::new(index, command.describe(), error)),
        Command::Query { selector } => execute_query(selector, ctx)
            .map_err(|error| Diagnostic::new(index, command.describe(), error)),
        Command::AssertText(spec) => retry::assert_eventually(ctx, spec)
            .await
            .map(|pass| CommandOutput::AssertionHeld {
                observed: pass.observed,
                attempts: pass.attempts,
            })
            .map_err(|error| Diagnostic::new(index, command.describe(), error)),
    }
}

fn execute_navigate(url: &Url, ctx: &mut ExecContext<'_>) -> Result<CommandOutput, CommandError> {
    ctx.session
        .navigate(&mut *ctx.browser, url.clone())
        .map_err(|err| CommandError::NavigationFailure {
            url: url.clone(),
            reason: navigation_reason(err),
        })?;
    Ok(CommandOutput::Navigated { url: url.clone() })
}

fn navigation_reason(err: SessionError) -> String {
    match err {
        SessionError::NavigationFailed { reason, .. } => reason,
        other => other.to_string(),
    }
}

fn execute_query(selector: &str, ctx: &mut ExecContext<'_>) -> Result<CommandOutput, CommandError> {
    let document = ctx
        .session
        .current_document()
        .cloned()
        .ok_or_else(|| CommandError::QueryFailure {
            selector: selector.to_string(),
            reason: "no document loaded".to_string(),
        })?;

    let set = ctx
        .browser
        .query_dom(&document, selector)
        .map_err(|err| CommandError::QueryFailure {
            selector: selector.to_string(),
            reason: err.to_string(),
        })?;

    // A bare query is not retried; an empty result is an immediate failure.
    if set.is_empty() {
        return Err(CommandError::QueryFailure {
            selector: selector.to_string(),
            reason: "no elements matched".to_string(),
        });
    }

    Ok(CommandOutput::Matched {
        selector: selector.to_string(),
        count: set.len(),
    })
}
