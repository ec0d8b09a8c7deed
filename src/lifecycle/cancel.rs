//! Caller-driven cancellation for in-flight operations.

use std::future::pending;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

/// Owner side of a cancellation signal.
///
/// Hand out [`Cancellation`] tokens with [`CancelHandle::token`]; calling
/// [`CancelHandle::cancel`] fires every token, including ones created later.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Create a new, untriggered handle.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Get a token observing this handle.
    pub fn token(&self) -> Cancellation {
        Cancellation {
            rx: Some(self.tx.subscribe()),
            deadline: None,
        }
    }

    /// Fire the signal.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether the signal has been fired.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Token passed into operations. Fires on an explicit cancel or once its deadline passes.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A token that never fires.
    pub fn never() -> Self {
        Self::default()
    }

    /// Also fire at `deadline`. An earlier existing deadline wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Also fire `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Non-blocking check.
    pub fn is_cancelled(&self) -> bool {
        let signalled = self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false);
        let expired = self.deadline.map(|d| Instant::now() >= d).unwrap_or(false);
        signalled || expired
    }

    /// Resolve once the token fires. Pending forever for [`Cancellation::never`].
    pub async fn cancelled(&self) {
        let signal = async {
            match self.rx.clone() {
                Some(mut rx) => {
                    // A dropped handle can no longer cancel.
                    let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
                    if closed {
                        pending::<()>().await;
                    }
                }
                None => pending::<()>().await,
            }
        };

        let deadline = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            _ = signal => {}
            _ = deadline => {}
        }
    }
}
