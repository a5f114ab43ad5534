use crate::errors::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Carries a deadline and a cancellation signal through a lookup.
///
/// Cloning a `Context` is cheap; clones share the same cancellation flag.
///
/// # Example
///
/// ```rust
/// use rootwalk::clients::Context;
/// use std::time::Duration;
///
/// let (ctx, cancel) = Context::cancellable();
/// let ctx = ctx.child_with_timeout(Duration::from_secs(10));
/// assert!(ctx.check().is_ok());
///
/// cancel.cancel();
/// assert!(ctx.is_cancelled());
/// assert!(ctx.check().is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Option<Arc<AtomicBool>>,
}

/// Cancels every [`Context`] derived from the one it was created with.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Context {
        Context::default()
    }

    pub fn with_timeout(timeout: Duration) -> Context {
        Context::background().child_with_timeout(timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Context {
        Context {
            deadline: Some(deadline),
            cancelled: None,
        }
    }

    /// A context that is cancelled when the returned handle says so.
    pub fn cancellable() -> (Context, CancelHandle) {
        let cancelled = Arc::new(AtomicBool::new(false));
        let ctx = Context {
            deadline: None,
            cancelled: Some(cancelled.clone()),
        };
        (ctx, CancelHandle { cancelled })
    }

    /// Returns a context sharing this one's cancellation, whose deadline is
    /// the earlier of this one's and `timeout` from now.
    pub fn child_with_timeout(&self, timeout: Duration) -> Context {
        let deadline = match Instant::now().checked_add(timeout) {
            Some(deadline) => Some(deadline),
            None => self.deadline,
        };
        let deadline = match (self.deadline, deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        Context {
            deadline,
            cancelled: self.cancelled.clone(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, or None if there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.cancelled {
            Some(cancelled) => cancelled.load(Ordering::SeqCst),
            None => false,
        }
    }

    /// Returns an error if the context has been cancelled or has expired.
    pub fn check(&self) -> Result<(), Error> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.remaining() == Some(Duration::from_secs(0)) {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }
}
