//! Cancellable timed sequences.
//!
//! A [`Sequence`] is the state a multi-step task carries between its
//! waits. Every wait goes through [`Sequence::park`], which names the
//! suspension point and checks for cancellation both before and after
//! sleeping. Side-effecting steps that follow a wait therefore only run
//! if nobody cancelled in the meantime.
//!
//! ```text
//!   park("settle") ──→ side effect ──→ park("attempt") ──→ side effect
//!        │                                  │
//!        └──── cancel() ──→ Err(Cancelled) ─┘   (nothing after runs)
//! ```

use std::time::Duration;

use tokio::sync::watch;
use tracing::trace;

/// Returned by a suspension point once the sequence was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("sequence cancelled at `{point}`")]
pub struct Cancelled {
    /// Name of the suspension point that observed the cancellation.
    pub point: &'static str,
}

/// Cancels the paired [`Sequence`].
///
/// Dropping the handle cancels too, so a sequence can never outlive the
/// owner that is supposed to be able to stop it.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel the sequence. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// The waiting side of a cancellable task.
#[derive(Debug)]
pub struct Sequence {
    rx: watch::Receiver<bool>,
}

impl Sequence {
    /// Creates a sequence and the handle that cancels it.
    pub fn new() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (Self { rx }, CancelHandle { tx })
    }

    /// Whether the sequence has been cancelled (explicitly or by dropping
    /// its handle).
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Checks for cancellation without waiting.
    pub fn checkpoint(&self, point: &'static str) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            trace!(point, "sequence cancelled");
            Err(Cancelled { point })
        } else {
            Ok(())
        }
    }

    /// Suspends for `duration` at the named point.
    ///
    /// Returns early with [`Cancelled`] as soon as the handle fires.
    pub async fn park(
        &mut self,
        point: &'static str,
        duration: Duration,
    ) -> Result<(), Cancelled> {
        self.checkpoint(point)?;
        trace!(point, wait_ms = duration.as_millis() as u64, "sequence parked");

        let rx = &mut self.rx;
        tokio::select! {
            biased;
            // Resolves on `true` or when the handle is dropped.
            _ = rx.wait_for(|cancelled| *cancelled) => {
                trace!(point, "sequence cancelled while parked");
                return Err(Cancelled { point });
            }
            _ = tokio::time::sleep(duration) => {}
        }

        self.checkpoint(point)
    }
}
