//! Run-wide cancellation.

use std::sync::Arc;
use tokio::sync::watch;

/// Cancels an extraction run as a unit.
///
/// Clones share state: cancelling any clone cancels them all. A cancelled run
/// aborts its in-flight page tasks and returns [`crate::SieveError::Cancelled`];
/// no partially built stream is handed out.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // The sender lives in `self`, so this is unreachable in practice.
                std::future::pending::<()>().await;
            }
        }
    }
}
