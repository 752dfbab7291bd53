//! Cooperative cancellation for a search.
//!
//! A [`CancelSignal`] is shared by every stage of one search. Firing it is
//! idempotent and wakes every task currently waiting in [`CancelSignal::cancelled`].

use std::sync::Arc;
use tokio::sync::watch;


/// Broadcast, idempotent cancellation flag.
///
/// # Examples
///
/// ```
/// use libscout::cancel::CancelSignal;
///
/// let signal = CancelSignal::new();
/// let observer = signal.clone();
/// assert!(!observer.is_cancelled());
///
/// signal.cancel();
/// signal.cancel(); // firing twice is harmless
/// assert!(observer.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    /// Creates a signal that has not fired.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fires the signal.
    pub fn cancel(&self) {
        let was_cancelled = self.tx.send_replace(true);
        if !was_cancelled {
            tracing::debug!("cancellation signal fired");
        }
    }

    /// Returns true once the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the signal has fired; immediately if it already has.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}
