//! Trailing-edge debouncer driven by tokio timers

use std::time::Duration;

use tokio::time::Instant;

/// Holds the latest pushed value until `window` passes without another push.
///
/// The debouncer never sleeps by itself: callers wait on [`until`] with the
/// current [`Debouncer::deadline`] (typically as one branch of a
/// `tokio::select!`) and then call [`Debouncer::take_due`].
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Replace the pending value and restart the quiet window.
    pub fn push(&mut self, value: T) {
        self.pending = Some((value, Instant::now() + self.window));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Drop the pending value without emitting it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    /// The pending value, if its window has elapsed.
    pub fn take_due(&mut self) -> Option<T> {
        let due = matches!(self.deadline(), Some(deadline) if deadline <= Instant::now());
        if due {
            self.cancel()
        } else {
            None
        }
    }
}

/// Sleep until `deadline`; never completes for `None`.
pub async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
