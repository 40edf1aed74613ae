//! External cancellation for a running drain.
//!
//! A watch channel carries a single flag; the executor observes it at every
//! suspension point, so cancellation interrupts an in-flight poll loop and
//! propagates into an active boundary crossing.

use tokio::sync::watch;

/// Create a connected cancellation pair.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// The caller-side handle. Dropping it without cancelling leaves the signal
/// permanently un-cancelled.
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// The executor-side signal. Cloneable; clones observe the same flag.
#[derive(Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires, for callers that do not cancel.
    pub fn never() -> Self {
        let (_handle, signal) = cancel_pair();
        signal
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation fires. Never resolves if the handle was
    /// dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Handle gone; cancellation can never arrive.
                std::future::pending::<()>().await;
            }
        }
    }
}
