//! Cancellable request context passed to every core primitive.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{KvError, KvResult};

/// Cancellation and deadline carried through one logical operation.
///
/// Cloning a `Context` shares its cancellation token: cancelling any clone
/// cancels all of them. Use [`Context::child`] for a scope that can be
/// cancelled on its own without affecting the parent.
#[derive(Clone, Debug, Default)]
pub struct Context {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context driven by an existing cancellation token.
    pub fn with_cancel(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            deadline: None,
        }
    }

    /// A child scope: cancelled when the parent is, but cancellable alone.
    /// The deadline is inherited.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    /// A child scope that also expires `timeout` from now, or at the
    /// parent's deadline if that comes first.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        let mut child = self.child();
        child.deadline = Some(self.deadline.map_or(deadline, |d| d.min(deadline)));
        child
    }

    /// A context with neither cancellation nor deadline.
    ///
    /// Cleanup that must run even after the caller gave up (releasing a
    /// held lock) uses this.
    pub fn detached(&self) -> Self {
        Self::background()
    }

    /// Cancel this context and every child derived from it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` once the context is cancelled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.check().is_err()
    }

    /// Fail with `Cancelled` or `DeadlineExceeded` if the context is done.
    pub fn check(&self) -> KvResult<()> {
        if self.cancel.is_cancelled() {
            return Err(KvError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(KvError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
