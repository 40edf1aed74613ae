//! Retry-until-success assertions.
//!
//! Assertions poll instead of failing on first read, which is what makes
//! them robust against asynchronous rendering. The loop is an explicit
//! bounded wait with a monotonic deadline, so timeout and cancellation
//! behave the same on every host runtime.

use crosswave_core::BrowserError;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace, warn};

use crate::command::AssertSpec;
use crate::error::CommandError;
use crate::queue::ExecContext;

/// Per-assertion bookkeeping. Created when the assertion begins, gone when
/// it reaches a terminal state.
struct RetryState {
    deadline: Instant,
    start_epoch: u64,
    attempts: u32,
    last_observed: Option<String>,
    last_error: Option<String>,
}

/// A successful assertion: the matching text and how many attempts it took.
#[derive(Debug)]
pub(crate) struct AssertionPass {
    pub(crate) observed: String,
    pub(crate) attempts: u32,
}

/// Repeatedly evaluate `spec` against the current document until the
/// predicate holds, the deadline passes, the document is replaced, or the
/// drain is cancelled.
///
/// "Element not found" and transient query errors are non-matches: the loop
/// keeps polling. A predicate that holds on the first attempt makes zero
/// additional polls.
pub(crate) async fn assert_eventually(
    ctx: &mut ExecContext<'_>,
    spec: &AssertSpec,
) -> Result<AssertionPass, CommandError> {
    let timeout = spec.timeout.unwrap_or(ctx.defaults.assert_timeout);
    let poll_interval = spec.poll_interval.unwrap_or(ctx.defaults.poll_interval);

    let document = ctx
        .session
        .current_document()
        .cloned()
        .ok_or_else(|| CommandError::QueryFailure {
            selector: spec.selector.clone(),
            reason: "no document loaded".to_string(),
        })?;

    let start = Instant::now();
    let mut state = RetryState {
        deadline: start + timeout,
        start_epoch: ctx.session.document_epoch(),
        attempts: 0,
        last_observed: None,
        last_error: None,
    };

    debug!(
        selector = %spec.selector,
        predicate = %spec.expect,
        timeout_ms = timeout.as_millis() as u64,
        poll_ms = poll_interval.as_millis() as u64,
        "Assertion started"
    );

    loop {
        if ctx.cancel.is_cancelled() {
            return Err(CommandError::Cancelled);
        }

        // A navigation invalidates the pending assertion; re-querying the
        // new document would risk a false positive.
        if ctx.session.document_epoch() != state.start_epoch {
            return Err(CommandError::StaleContext);
        }

        state.attempts += 1;
        match ctx.browser.query_dom(&document, &spec.selector) {
            Ok(set) => {
                let mut first_text = None;
                for handle in set.iter() {
                    match ctx.browser.read_text(handle) {
                        Ok(text) => {
                            if first_text.is_none() {
                                first_text = Some(text.clone());
                            }
                            if spec.expect.matches(&text) {
                                debug!(
                                    selector = %spec.selector,
                                    attempts = state.attempts,
                                    "Assertion held"
                                );
                                return Ok(AssertionPass {
                                    observed: text,
                                    attempts: state.attempts,
                                });
                            }
                        }
                        Err(BrowserError::NoSuchDocument { .. })
                        | Err(BrowserError::DetachedElement) => {
                            return Err(CommandError::StaleContext);
                        }
                        Err(other) => {
                            state.last_error = Some(other.to_string());
                        }
                    }
                }
                if let Some(text) = first_text {
                    state.last_observed = Some(text);
                }
            }
            Err(BrowserError::NoSuchDocument { .. }) => {
                return Err(CommandError::StaleContext);
            }
            Err(other) => {
                // Transient query errors poll through, like a missing element.
                state.last_error = Some(other.to_string());
            }
        }

        if Instant::now() >= state.deadline {
            return Err(timeout_error(spec, &mut state, start));
        }

        trace!(attempt = state.attempts, "No match yet, polling");
        tokio::select! {
            _ = ctx.cancel.cancelled() => return Err(CommandError::Cancelled),
            _ = sleep(poll_interval) => {}
        }

        // Checked again after the pause so a poll interval at or above the
        // timeout degenerates to a single attempt.
        if Instant::now() >= state.deadline {
            return Err(timeout_error(spec, &mut state, start));
        }
    }
}

fn timeout_error(spec: &AssertSpec, state: &mut RetryState, start: Instant) -> CommandError {
    let waited_ms = Instant::now().duration_since(start).as_millis() as u64;
    warn!(
        selector = %spec.selector,
        predicate = %spec.expect,
        attempts = state.attempts,
        waited_ms,
        last_observed = ?state.last_observed,
        last_error = ?state.last_error,
        "Assertion timed out"
    );
    CommandError::AssertionTimeout {
        predicate: spec.expect.to_string(),
        last_observed: state.last_observed.take(),
        waited_ms,
    }
}
