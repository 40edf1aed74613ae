//! # Crosswave Core
//!
//! Session runtime shared by every Crosswave component: origins, document
//! handles, the navigation state machine, and the browser control surface
//! the executor drives.
//!
//! ## Design Goals
//!
//! 1. **One session per test**: a `Session` is created at test start and
//!    torn down at test end, never shared between tests
//! 2. **Explicit state**: no global browser state; every component receives
//!    the `Session` it operates on
//! 3. **External browser**: the engine consumes a [`BrowserSurface`], it
//!    never implements rendering or networking itself

mod navigation;
mod origin;
mod session;
mod surface;

pub use navigation::{
    LoadEvent, NavigationRequest, NavigationState, NavigationStateError, NavigationStateMachine,
};
pub use origin::{Origin, OriginError};
pub use session::{DocumentHandle, Session, SessionError};
pub use surface::{BrowserError, BrowserSurface, ElementHandle, ElementSet};
