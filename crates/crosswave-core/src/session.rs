//! The single live browsing session a test drives.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};
use url::Url;

use crate::navigation::{
    LoadEvent, NavigationRequest, NavigationStateError, NavigationStateMachine,
};
use crate::origin::{Origin, OriginError};
use crate::surface::{BrowserError, BrowserSurface};

/// Errors raised by session operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("navigation to {url} failed: {reason}")]
    NavigationFailed { url: Url, reason: String },

    #[error("URL has no origin: {0}")]
    Origin(#[from] OriginError),

    #[error("navigation state error: {0}")]
    State(#[from] NavigationStateError),

    #[error("session is torn down")]
    TornDown,
}

/// A handle to a live document inside a browsing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    id: u64,
    origin: Origin,
}

impl DocumentHandle {
    pub fn new(id: u64, origin: Origin) -> Self {
        Self { id, origin }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }
}

/// The single live browsing context a test drives.
///
/// Invariant: `current_origin()` always equals the origin of the current
/// document handle; both change together, atomically, inside
/// [`Session::navigate`].
pub struct Session {
    current: Option<DocumentHandle>,
    history: Vec<Url>,
    epoch: u64,
    torn_down: bool,
    navigation: NavigationStateMachine,
    event_rx: Option<mpsc::UnboundedReceiver<LoadEvent>>,
}

impl Session {
    /// Create a fresh session with no document.
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            current: None,
            history: Vec::new(),
            epoch: 0,
            torn_down: false,
            navigation: NavigationStateMachine::new(event_tx),
            event_rx: Some(event_rx),
        }
    }

    /// Reconstruct a session around an already-loaded document.
    ///
    /// Used on the far side of a boundary crossing, where the browsing
    /// context exists but the calling session's state must not be shared.
    pub fn resume(document: DocumentHandle) -> Self {
        let mut session = Self::new();
        session.current = Some(document);
        session
    }

    /// Take the load-event receiver. Returns `None` after the first call.
    pub fn take_load_events(&mut self) -> Option<mpsc::UnboundedReceiver<LoadEvent>> {
        self.event_rx.take()
    }

    pub fn current_document(&self) -> Option<&DocumentHandle> {
        self.current.as_ref()
    }

    pub fn current_origin(&self) -> Option<&Origin> {
        self.current.as_ref().map(|doc| doc.origin())
    }

    /// Monotonic counter bumped every time the current document is replaced.
    pub fn document_epoch(&self) -> u64 {
        self.epoch
    }

    pub fn history(&self) -> &[Url] {
        &self.history
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Navigate the session to `url` through the given browser.
    ///
    /// On success the new document becomes current and the epoch is bumped.
    /// On failure the previous document stays current and the epoch is
    /// untouched.
    pub fn navigate(
        &mut self,
        browser: &mut dyn BrowserSurface,
        url: Url,
    ) -> Result<(), SessionError> {
        if self.torn_down {
            return Err(SessionError::TornDown);
        }

        // Validate the origin before touching navigation state.
        let expected_origin = Origin::from_url(&url)?;

        info!(%url, "Loading URL");
        self.navigation
            .start_navigation(NavigationRequest::new(url.clone()))?;

        let document = match browser.navigate(&url) {
            Ok(document) => document,
            Err(err) => {
                let reason = browser_failure_reason(&err);
                self.navigation.fail_navigation(reason.clone())?;
                return Err(SessionError::NavigationFailed { url, reason });
            }
        };

        self.navigation.commit_navigation()?;

        debug_assert_eq!(document.origin(), &expected_origin);
        self.current = Some(document);
        self.epoch += 1;
        self.history.push(url);

        self.navigation.finish_navigation()?;

        debug!(
            origin = %expected_origin,
            epoch = self.epoch,
            "Document replaced"
        );
        Ok(())
    }

    /// Tear the session down: the current document is released and every
    /// subsequent operation fails.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.current = None;
        info!(
            navigations = self.history.len(),
            "Session torn down"
        );
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn browser_failure_reason(err: &BrowserError) -> String {
    match err {
        BrowserError::Unreachable { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}
