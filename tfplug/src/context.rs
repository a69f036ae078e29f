//! Cancellation handle passed to every provider, resource and data source call
//!
//! The gRPC server owns one root context and cancels it on StopProvider.
//! Long-running operations (network delete polling) sleep through it so a
//! stop request interrupts them.

use crate::error::{Result, TfplugError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time;

#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    deadline: Option<Instant>,
    cancelled: watch::Sender<bool>,
}

impl Context {
    pub fn new() -> Self {
        let (cancelled, _) = watch::channel(false);
        Self {
            inner: Arc::new(ContextInner {
                deadline: None,
                cancelled,
            }),
        }
    }

    /// Child context cancelled when `timeout` elapses or when this context is
    /// cancelled, whichever happens first. Must be called inside a runtime.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        let deadline = match self.inner.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };

        let (cancelled, _) = watch::channel(false);
        let child = Self {
            inner: Arc::new(ContextInner {
                deadline: Some(deadline),
                cancelled,
            }),
        };

        let parent = self.clone();
        let weak = Arc::downgrade(&child.inner);
        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep_until(deadline.into()) => {}
                _ = parent.cancelled() => {}
            }
            if let Some(inner) = weak.upgrade() {
                inner.cancelled.send_replace(true);
            }
        });

        child
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    pub fn cancel(&self) {
        self.inner.cancelled.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.borrow()
    }

    /// Resolves once the context is cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.inner.cancelled.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Sleeps for `duration` unless cancelled first
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        if self.is_cancelled() {
            return Err(TfplugError::Cancelled);
        }
        tokio::select! {
            _ = time::sleep(duration) => Ok(()),
            _ = self.cancelled() => Err(TfplugError::Cancelled),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn timeout_cancels() {
        let ctx = Context::new().with_timeout(Duration::from_millis(50));
        assert!(!ctx.is_cancelled());
        assert!(ctx.deadline().is_some());

        sleep(Duration::from_millis(120)).await;

        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn cancelling_parent_cancels_child() {
        let root = Context::new();
        let child = root.with_timeout(Duration::from_secs(60));

        root.cancel();
        tokio::time::timeout(Duration::from_secs(1), child.cancelled())
            .await
            .unwrap();

        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn child_keeps_the_earlier_deadline() {
        let parent = Context::new().with_timeout(Duration::from_millis(10));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[tokio::test]
    async fn manual_cancel() {
        let ctx = Context::new();
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_cancelled());

        ctx.cancel();

        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn sleep_returns_early_on_cancel() {
        let ctx = Context::new();
        let sleeper = ctx.clone();
        let handle = tokio::spawn(async move { sleeper.sleep(Duration::from_secs(30)).await });

        sleep(Duration::from_millis(20)).await;
        ctx.cancel();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(TfplugError::Cancelled)));
    }

    #[tokio::test]
    async fn sleep_completes_without_cancel() {
        let ctx = Context::new();
        assert!(ctx.sleep(Duration::from_millis(5)).await.is_ok());
    }
}
