//! # Crosswave Engine
//!
//! The command executor at the center of Crosswave: a strict in-order
//! command queue, a retry-until-success assertion engine, and the origin
//! boundary bridge that relays serialized sub-programs into an isolated
//! browsing context.
//!
//! ## Design Goals
//!
//! 1. **Single flight**: one session, one command at a time; a command never
//!    begins before its predecessor reached a terminal state
//! 2. **Cooperative suspension**: waiting is always an `await` point, never
//!    a blocked thread, so the browsing context keeps rendering between
//!    assertion polls
//! 3. **Serialized isolation**: nothing but bytes crosses an origin
//!    boundary; command objects, element handles, and session references
//!    stay on their side
//! 4. **First failure wins**: a failed command aborts the rest of its queue
//!    and surfaces exactly one diagnostic chain

mod bridge;
mod cancel;
mod command;
mod error;
mod queue;
mod retry;
mod wire;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use command::{AssertSpec, Command, CommandKind, CommandOutput, TextExpectation};
pub use error::{CommandError, Diagnostic, Outcome};
pub use queue::{CommandQueue, DrainReport, ExecContext, ExecDefaults};
pub use queue::{DEFAULT_ASSERT_TIMEOUT, DEFAULT_POLL_INTERVAL};
