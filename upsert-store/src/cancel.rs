//! Cooperative cancellation for ingestion jobs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Cloneable handle that lets a caller stop a running job between batches.
///
/// The scheduler checks the flag at every batch boundary; pacing and backoff
/// sleeps return early when the token fires. Nothing in flight is interrupted
/// mid-call.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_one();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Sleeps for `dur` unless the token fires first.
    ///
    /// Returns `true` after a full sleep, `false` when cancelled (including a
    /// token that was already cancelled on entry).
    pub async fn sleep(&self, dur: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        tokio::select! {
            _ = self.inner.notify.notified() => false,
            _ = tokio::time::sleep(dur) => true,
        }
    }
}
