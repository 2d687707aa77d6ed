//! Caller-supplied cancellation and deadlines.
//!
//! Every repository operation takes a [`Context`]. A context may carry a deadline and a
//! cancellation signal; when either fires, the pending operation is dropped and the call returns
//! [`DocumentStoreError::DeadlineExceeded`] or [`DocumentStoreError::Cancelled`].
//!
//! ```ignore
//! let (ctx, cancel) = Context::with_timeout(Duration::from_secs(5)).with_cancel();
//! tokio::spawn(async move { shutdown_signal().await; cancel.cancel(); });
//! let users = helper.find_many(&ctx, "active", true, None, SortDirection::Ascending).await?;
//! ```

use std::{future::Future, time::Duration};
use tokio::{sync::watch, time::Instant};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Deadline and cancellation state threaded through every operation.
///
/// Cloning a context is cheap; clones observe the same cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Option<watch::Receiver<bool>>,
}

/// Cancels the [`Context`] it was created with, and every clone of it.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signals cancellation. Pending operations return promptly.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl Context {
    /// A context that never expires and cannot be cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self { deadline: Some(deadline), cancelled: None }
    }

    /// Derives a cancellable context, keeping this context's deadline.
    pub fn with_cancel(self) -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);

        (
            Self { deadline: self.deadline, cancelled: Some(receiver) },
            CancelHandle { sender },
        )
    }

    /// Returns the deadline of this context, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns an error if this context is already cancelled or past its deadline.
    pub fn check(&self) -> DocumentStoreResult<()> {
        if self.cancelled.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Err(DocumentStoreError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(DocumentStoreError::DeadlineExceeded);
        }

        Ok(())
    }

    /// Drives `operation` until it completes or this context is done.
    ///
    /// The operation future is dropped when the context fires first.
    pub async fn run<T, F>(&self, operation: F) -> DocumentStoreResult<T>
    where
        F: Future<Output = DocumentStoreResult<T>>,
    {
        self.check()?;

        let cancelled = async {
            match self.cancelled.clone() {
                Some(mut rx) => {
                    // A dropped handle can no longer cancel.
                    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(DocumentStoreError::Cancelled),
            _ = expired => Err(DocumentStoreError::DeadlineExceeded),
            result = operation => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_runs_to_completion() {
        let ctx = Context::background();

        assert_eq!(ctx.run(async { Ok(7) }).await.unwrap(), 7);
        assert!(ctx.deadline().is_none());
    }

    #[tokio::test]
    async fn cancelled_context_fails_before_running() {
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();

        let result = ctx.run(async { Ok(()) }).await;
        assert!(matches!(result, Err(DocumentStoreError::Cancelled)));
        assert!(matches!(ctx.clone().check(), Err(DocumentStoreError::Cancelled)));
    }

    #[tokio::test]
    async fn cancellation_interrupts_pending_operation() {
        let (ctx, cancel) = Context::background().with_cancel();

        let pending = ctx.run(async {
            std::future::pending::<()>().await;
            Ok(())
        });
        let trigger = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        };

        let (result, ()) = tokio::join!(pending, trigger);
        assert!(matches!(result, Err(DocumentStoreError::Cancelled)));
    }

    #[tokio::test]
    async fn deadline_interrupts_pending_operation() {
        let ctx = Context::with_timeout(Duration::from_millis(10));

        let result = ctx
            .run(async {
                std::future::pending::<()>().await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(DocumentStoreError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn dropped_handle_never_cancels() {
        let (ctx, cancel) = Context::background().with_cancel();
        drop(cancel);

        assert_eq!(ctx.run(async { Ok("done") }).await.unwrap(), "done");
    }
}
