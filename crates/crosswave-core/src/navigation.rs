//! Navigation lifecycle for a browsing session.
//!
//! Every document replacement runs through the same state machine:
//! `Idle -> Pending -> Committed -> Idle`, with a failure path back to
//! `Idle` from either in-flight state. Each transition emits a [`LoadEvent`]
//! on an unbounded channel so observers can follow the load without
//! participating in it.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

/// A request to replace the session's current document.
#[derive(Debug, Clone)]
pub struct NavigationRequest {
    url: Url,
}

impl NavigationRequest {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Load lifecycle events emitted to observers.
#[derive(Debug, Clone)]
pub enum LoadEvent {
    /// Navigation started.
    Started { url: Url },
    /// Navigation committed (the target is reachable, the old document is gone).
    Committed { url: Url },
    /// Navigation complete, the new document is current.
    Complete { url: Url },
    /// Navigation failed; the session keeps its previous document.
    Failed { url: Url, error: String },
}

/// Navigation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    Idle,
    Pending,
    Committed,
}

/// Errors raised on an illegal state transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationStateError {
    #[error("navigation already in flight (state: {0:?})")]
    AlreadyNavigating(NavigationState),

    #[error("no navigation in flight (state: {0:?})")]
    NotNavigating(NavigationState),
}

/// Drives one navigation at a time through its lifecycle.
pub struct NavigationStateMachine {
    state: NavigationState,
    in_flight: Option<Url>,
    event_tx: mpsc::UnboundedSender<LoadEvent>,
}

impl NavigationStateMachine {
    pub fn new(event_tx: mpsc::UnboundedSender<LoadEvent>) -> Self {
        Self {
            state: NavigationState::Idle,
            in_flight: None,
            event_tx,
        }
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    /// Begin a navigation. Only legal from `Idle`.
    pub fn start_navigation(
        &mut self,
        request: NavigationRequest,
    ) -> Result<(), NavigationStateError> {
        if self.state != NavigationState::Idle {
            return Err(NavigationStateError::AlreadyNavigating(self.state));
        }

        debug!(url = %request.url, "Navigation started");
        self.state = NavigationState::Pending;
        let _ = self.event_tx.send(LoadEvent::Started {
            url: request.url.clone(),
        });
        self.in_flight = Some(request.url);
        Ok(())
    }

    /// Commit the in-flight navigation. Only legal from `Pending`.
    pub fn commit_navigation(&mut self) -> Result<(), NavigationStateError> {
        if self.state != NavigationState::Pending {
            return Err(NavigationStateError::NotNavigating(self.state));
        }

        self.state = NavigationState::Committed;
        if let Some(url) = &self.in_flight {
            let _ = self.event_tx.send(LoadEvent::Committed { url: url.clone() });
        }
        Ok(())
    }

    /// Finish the in-flight navigation. Only legal from `Committed`.
    pub fn finish_navigation(&mut self) -> Result<(), NavigationStateError> {
        if self.state != NavigationState::Committed {
            return Err(NavigationStateError::NotNavigating(self.state));
        }

        self.state = NavigationState::Idle;
        if let Some(url) = self.in_flight.take() {
            debug!(%url, "Navigation complete");
            let _ = self.event_tx.send(LoadEvent::Complete { url });
        }
        Ok(())
    }

    /// Fail the in-flight navigation from either `Pending` or `Committed`.
    pub fn fail_navigation(&mut self, error: String) -> Result<(), NavigationStateError> {
        if self.state == NavigationState::Idle {
            return Err(NavigationStateError::NotNavigating(self.state));
        }

        self.state = NavigationState::Idle;
        if let Some(url) = self.in_flight.take() {
            warn!(%url, error, "Navigation failed");
            let _ = self.event_tx.send(LoadEvent::Failed { url, error });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> (NavigationStateMachine, mpsc::UnboundedReceiver<LoadEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (NavigationStateMachine::new(tx), rx)
    }

    #[test]
    fn test_successful_navigation_emits_events_in_order() {
        let (mut nav, mut rx) = machine();
        let url = Url::parse("http://site-a/").unwrap();

        nav.start_navigation(NavigationRequest::new(url.clone())).unwrap();
        nav.commit_navigation().unwrap();
        nav.finish_navigation().unwrap();
        assert_eq!(nav.state(), NavigationState::Idle);

        assert!(matches!(rx.try_recv().unwrap(), LoadEvent::Started { .. }));
        assert!(matches!(rx.try_recv().unwrap(), LoadEvent::Committed { .. }));
        assert!(matches!(rx.try_recv().unwrap(), LoadEvent::Complete { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_failed_navigation_emits_started_then_failed() {
        let (mut nav, mut rx) = machine();
        let url = Url::parse("http://unreachable/").unwrap();

        nav.start_navigation(NavigationRequest::new(url)).unwrap();
        nav.fail_navigation("connection refused".into()).unwrap();
        assert_eq!(nav.state(), NavigationState::Idle);

        assert!(matches!(rx.try_recv().unwrap(), LoadEvent::Started { .. }));
        assert!(matches!(
            rx.try_recv().unwrap(),
            LoadEvent::Failed { error, .. } if error == "connection refused"
        ));
    }

    #[test]
    fn test_double_start_is_rejected() {
        let (mut nav, _rx) = machine();
        let url = Url::parse("http://site-a/").unwrap();

        nav.start_navigation(NavigationRequest::new(url.clone())).unwrap();
        let err = nav.start_navigation(NavigationRequest::new(url)).unwrap_err();
        assert_eq!(
            err,
            NavigationStateError::AlreadyNavigating(NavigationState::Pending)
        );
    }

    #[test]
    fn test_commit_without_start_is_rejected() {
        let (mut nav, _rx) = machine();
        assert!(nav.commit_navigation().is_err());
        assert!(nav.finish_navigation().is_err());
        assert!(nav.fail_navigation("x".into()).is_err());
    }
}
