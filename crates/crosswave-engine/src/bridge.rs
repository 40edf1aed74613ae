//! Origin boundary bridge.
//!
//! Runs a sub-program inside a browsing context whose origin differs from
//! the caller's, honoring the isolation boundary between origins: the
//! sub-program crosses as serialized bytes, executes against a fresh
//! sub-session, and only a serialized outcome crosses back. The calling
//! context is suspended for the duration; control transfers serially.
//!
//! The bridge never navigates. A crossing is only legal once a prior
//! command has already put the session at the target origin.

use std::future::Future;
use std::pin::Pin;

use crosswave_core::{Origin, Session};
use tracing::{debug, info, warn};

use crate::command::{Command, CommandOutput};
use crate::error::{CommandError, Diagnostic, Outcome};
use crate::queue::{CommandQueue, DrainReport, ExecContext};
use crate::wire::{self, WireCodecError};

pub(crate) async fn run_in_origin(
    ctx: &mut ExecContext<'_>,
    index: usize,
    target: &Origin,
    program: &[Command],
) -> Result<CommandOutput, Diagnostic> {
    let label = format!("run_in_origin {} ({} commands)", target, program.len());

    let document = match ctx.session.current_document() {
        Some(document) => document.clone(),
        None => {
            return Err(Diagnostic::new(
                index,
                label,
                CommandError::OriginMismatch {
                    requested: target.clone(),
                    actual: None,
                },
            ));
        }
    };

    if document.origin() != target {
        return Err(Diagnostic::new(
            index,
            label,
            CommandError::OriginMismatch {
                requested: target.clone(),
                actual: Some(document.origin().clone()),
            },
        ));
    }

    // From here on, bytes are the only thing that crosses.
    let program_bytes = wire::encode_program(&document, program)
        .map_err(|err| bridge_failure(index, &label, err))?;

    info!(
        source = %document.origin(),
        target = %target,
        bytes = program_bytes.len(),
        "Crossing origin boundary"
    );

    let outcome_bytes = isolated_execute(&program_bytes, ctx)
        .await
        .map_err(|err| bridge_failure(index, &label, err))?;

    let (executed, outcome) =
        wire::decode_outcome(&outcome_bytes).map_err(|err| bridge_failure(index, &label, err))?;

    match outcome {
        Outcome::Passed => {
            debug!(target = %target, executed, "Crossing returned");
            Ok(CommandOutput::CrossingReturned {
                origin: target.clone(),
                executed,
            })
        }
        // The nested failure is relayed as this command's outcome, same
        // error kind, with the sub-program's diagnostic chain attached.
        Outcome::Failed(nested) => {
            warn!(target = %target, error = %nested.error, "Sub-program failed beyond the boundary");
            Err(Diagnostic {
                command_index: index,
                command: label,
                error: nested.error.clone(),
                nested: Some(Box::new(nested)),
            })
        }
        Outcome::Cancelled => Err(Diagnostic::new(index, label, CommandError::Cancelled)),
    }
}

fn bridge_failure(index: usize, label: &str, err: WireCodecError) -> Diagnostic {
    Diagnostic::new(
        index,
        label,
        CommandError::BridgeFailure {
            reason: err.to_string(),
        },
    )
}

/// Execute a serialized sub-program inside the isolated browsing context.
///
/// The sub-program is deserialized into fresh command values and drained
/// against a fresh sub-session reconstructed from wire data; no state is
/// shared with the calling session. Cancellation is the one signal that
/// reaches across: an external abort must be able to abandon the crossing.
async fn isolated_execute(
    program_bytes: &[u8],
    ctx: &mut ExecContext<'_>,
) -> Result<Vec<u8>, WireCodecError> {
    let (document, commands) = wire::decode_program(program_bytes)?;

    let mut sub_session = Session::resume(document);
    let mut sub_ctx = ExecContext::new(&mut sub_session, &mut *ctx.browser)
        .with_cancel(ctx.cancel.clone())
        .with_defaults(ctx.defaults);

    let mut queue = CommandQueue::from_commands(commands);

    // Boxed: the sub-program may itself contain a crossing.
    let report: DrainReport = {
        let drain: Pin<Box<dyn Future<Output = DrainReport> + '_>> =
            Box::pin(queue.drain(&mut sub_ctx));
        drain.await
    };

    wire::encode_outcome(&report)
}
