use crate::cancel::{CancelToken, Wake};
use crate::error::{QueueError, Result};
use crate::metrics::QueueMetrics;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

struct Shared<T> {
    items: Mutex<VecDeque<T>>,
    /// Broadcast on every put and take; producers and consumers share it
    changed: Condvar,
    capacity: usize,
    metrics: QueueMetrics,
}

impl<T: Send> Wake for Shared<T> {
    fn wake(&self) {
        // Taking the lock orders this broadcast after any waiter's flag check
        let _items = self.items.lock();
        self.changed.notify_all();
    }
}

/// A fixed-capacity FIFO with blocking `put` and `take`
///
/// `put` waits while the queue is full and `take` waits while it is empty.
/// Every successful mutation wakes all waiters and every waiter re-checks its
/// own condition before proceeding, so a freed slot or a new item is claimed
/// by exactly one thread.
///
/// Cloning yields another handle to the same queue.
pub struct BoundedQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.shared.items.lock().len())
            .field("capacity", &self.shared.capacity)
            .finish()
    }
}

#[derive(Clone, Copy)]
enum Side {
    Put,
    Take,
}

impl<T: Send + 'static> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < 1 {
            return Err(QueueError::InvalidCapacity(capacity));
        }

        Ok(Self {
            shared: Arc::new(Shared {
                items: Mutex::new(VecDeque::with_capacity(capacity)),
                changed: Condvar::new(),
                capacity,
                metrics: QueueMetrics::new(),
            }),
        })
    }

    /// Append `item`, blocking while the queue is full
    pub fn put(&self, item: T) {
        let mut items = self.shared.items.lock();
        self.wait_ready(&mut items, Side::Put);
        self.push_locked(items, item);
    }

    /// Append `item`, blocking while the queue is full, unless `cancel` fires
    ///
    /// On cancellation the item is not enqueued and the queue is unchanged.
    pub fn put_with(&self, item: T, cancel: &CancelToken) -> Result<()> {
        self.register(cancel);
        let mut items = self.shared.items.lock();
        self.wait_while(&mut items, Side::Put, Some(cancel), None)?;
        self.push_locked(items, item);
        Ok(())
    }

    /// Append `item`, waiting at most `timeout` for a free slot
    pub fn put_timeout(&self, item: T, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut items = self.shared.items.lock();
        self.wait_while(&mut items, Side::Put, None, Some(deadline))?;
        self.push_locked(items, item);
        Ok(())
    }

    /// Remove and return the head item, blocking while the queue is empty
    pub fn take(&self) -> T {
        let mut items = self.shared.items.lock();
        self.wait_ready(&mut items, Side::Take);
        self.pop_locked(items)
    }

    /// Remove and return the head item unless `cancel` fires while waiting
    pub fn take_with(&self, cancel: &CancelToken) -> Result<T> {
        self.register(cancel);
        let mut items = self.shared.items.lock();
        self.wait_while(&mut items, Side::Take, Some(cancel), None)?;
        Ok(self.pop_locked(items))
    }

    /// Remove and return the head item, waiting at most `timeout` for one
    pub fn take_timeout(&self, timeout: Duration) -> Result<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.shared.items.lock();
        self.wait_while(&mut items, Side::Take, None, Some(deadline))?;
        Ok(self.pop_locked(items))
    }

    fn register(&self, cancel: &CancelToken) {
        let shared: Arc<dyn Wake> = self.shared.clone();
        let weak: Weak<dyn Wake> = Arc::downgrade(&shared);
        cancel.register(weak);
    }

    /// Park until `side` may proceed, with no way out but the queue changing
    fn wait_ready(&self, items: &mut MutexGuard<'_, VecDeque<T>>, side: Side) {
        let mut counted = false;
        while self.blocked(&**items, side) {
            if !counted {
                counted = true;
                self.note_wait(items.len(), side);
            }
            self.shared.changed.wait(items);
        }
    }

    /// Park on the condition variable until `side` may proceed. Holds the lock
    /// on return so the caller's mutation is atomic with the final check.
    fn wait_while(
        &self,
        items: &mut MutexGuard<'_, VecDeque<T>>,
        side: Side,
        cancel: Option<&CancelToken>,
        deadline: Option<Instant>,
    ) -> Result<()> {
        let mut counted = false;
        while self.blocked(&**items, side) {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                self.shared.metrics.record_abandoned();
                return Err(QueueError::Cancelled);
            }

            if !counted {
                counted = true;
                self.note_wait(items.len(), side);
            }

            match deadline {
                Some(deadline) => {
                    let result = self.shared.changed.wait_until(items, deadline);
                    if result.timed_out() && self.blocked(&**items, side) {
                        self.shared.metrics.record_abandoned();
                        return Err(QueueError::Timeout);
                    }
                }
                None => self.shared.changed.wait(items),
            }
        }

        Ok(())
    }

    fn blocked(&self, items: &VecDeque<T>, side: Side) -> bool {
        match side {
            Side::Put => items.len() >= self.shared.capacity,
            Side::Take => items.is_empty(),
        }
    }

    fn note_wait(&self, depth: usize, side: Side) {
        match side {
            Side::Put => {
                self.shared.metrics.record_put_wait();
                log::debug!("queue full ({}/{}), producer waiting", depth, self.shared.capacity);
            }
            Side::Take => {
                self.shared.metrics.record_take_wait();
                log::debug!("queue empty, consumer waiting");
            }
        }
    }

    fn push_locked(&self, mut items: MutexGuard<'_, VecDeque<T>>, item: T) {
        debug_assert!(items.len() < self.shared.capacity);
        items.push_back(item);
        let depth = items.len();
        self.shared.metrics.record_put(depth);
        log::trace!("put, depth now {}", depth);
        drop(items);
        self.shared.changed.notify_all();
    }

    fn pop_locked(&self, mut items: MutexGuard<'_, VecDeque<T>>) -> T {
        let item = match items.pop_front() {
            Some(item) => item,
            None => unreachable!("take proceeded on an empty queue"),
        };
        self.shared.metrics.record_take();
        log::trace!("take, depth now {}", items.len());
        drop(items);
        self.shared.changed.notify_all();
        item
    }
}

impl<T> BoundedQueue<T> {
    /// Number of items currently held
    pub fn len(&self) -> usize {
        self.shared.items.lock().len()
    }

    /// Check if the queue holds no items
    pub fn is_empty(&self) -> bool {
        self.shared.items.lock().is_empty()
    }

    /// Check if the queue is at capacity
    pub fn is_full(&self) -> bool {
        self.shared.items.lock().len() >= self.shared.capacity
    }

    /// Get the fixed capacity of the queue
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Get the queue's counters
    pub fn metrics(&self) -> &QueueMetrics {
        &self.shared.metrics
    }
}
