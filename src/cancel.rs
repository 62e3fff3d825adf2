use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Something a cancel token can rouse out of a blocking wait
pub(crate) trait Wake: Send + Sync {
    fn wake(&self);
}

/// Cooperative cancellation for blocked queue operations
///
/// Cancelling sets a sticky flag and wakes every queue this token has been
/// used to wait on, so a thread parked in `put_with`/`take_with` returns
/// [`QueueError::Cancelled`](crate::QueueError::Cancelled) promptly.
/// Clones share the same flag.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    wakers: Mutex<Vec<Weak<dyn Wake>>>,
}

impl CancelToken {
    /// Create a token that has not fired
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token. Idempotent.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        // Collect first so no token lock is held while taking queue locks
        let targets: Vec<Arc<dyn Wake>> = {
            let mut wakers = self.inner.wakers.lock();
            wakers.retain(|w| w.strong_count() > 0);
            wakers.iter().filter_map(Weak::upgrade).collect()
        };

        log::debug!("cancel token fired, waking {} queue(s)", targets.len());
        for target in targets {
            target.wake();
        }
    }

    /// Check if `cancel` has been called on this token or a clone
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Register a queue to be woken on cancel. Must happen before the waiter
    /// checks the flag under the queue lock.
    pub(crate) fn register(&self, target: Weak<dyn Wake>) {
        let mut wakers = self.inner.wakers.lock();
        wakers.retain(|w| w.strong_count() > 0);
        if !wakers.iter().any(|w| Weak::ptr_eq(w, &target)) {
            wakers.push(target);
        }
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
