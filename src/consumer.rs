use crate::error::{QueueError, Result};
use crate::queue::BoundedQueue;
use crate::unit::{Role, Unit, UnitHandle, UnitReport};
use parking_lot::Mutex;
use std::sync::Arc;

/// Destination collection that any number of consumers may append to
///
/// Appends are serialized by the sink's own lock. With several consumers the
/// relative order of their appends is unspecified.
#[derive(Debug)]
pub struct Sink<T> {
    items: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for Sink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Sink<T> {
    /// Create an empty sink
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Append one item
    pub fn push(&self, item: T) {
        self.items.lock().push(item);
    }

    /// Number of items collected
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Check if nothing has been collected
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Remove and return everything collected so far
    pub fn drain(&self) -> Vec<T> {
        std::mem::take(&mut *self.items.lock())
    }
}

impl<T: Clone> Sink<T> {
    /// Copy of the current contents
    pub fn snapshot(&self) -> Vec<T> {
        self.items.lock().clone()
    }
}

/// Pulls items from a queue into a [`Sink`], optionally up to a fixed count
pub struct Consumer<T> {
    queue: BoundedQueue<T>,
    sink: Sink<T>,
    consumed: usize,
    limit: Option<usize>,
    control: UnitHandle,
}

impl<T: Send + 'static> Consumer<T> {
    /// Consumer with no item limit; it runs until stopped or cancelled
    pub fn new(name: impl AsRef<str>, queue: BoundedQueue<T>, sink: Sink<T>) -> Self {
        Self {
            queue,
            sink,
            consumed: 0,
            limit: None,
            control: UnitHandle::new(name.as_ref()),
        }
    }

    /// Finish after `limit` items
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Items taken so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Get the sink this consumer appends to
    pub fn sink(&self) -> &Sink<T> {
        &self.sink
    }

    fn wants_more(&self) -> bool {
        self.limit.map_or(true, |limit| self.consumed < limit)
    }
}

impl<T: Send + 'static> Unit for Consumer<T> {
    fn run(&mut self) -> Result<UnitReport> {
        self.control.begin()?;
        log::info!(
            "consumer [{}] started, limit {:?}",
            self.control.name(),
            self.limit
        );

        while self.control.is_running() && self.wants_more() {
            if self.control.is_cancelled() {
                return Err(self.control.stopped_early(Role::Consumer, self.consumed));
            }

            match self.queue.take_with(self.control.token()) {
                Ok(item) => {
                    self.sink.push(item);
                    self.consumed += 1;
                    self.control.advance();
                }
                Err(QueueError::Cancelled) => {
                    return Err(self.control.stopped_early(Role::Consumer, self.consumed));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(self.control.finish(Role::Consumer, self.consumed))
    }

    fn handle(&self) -> UnitHandle {
        self.control.clone()
    }

    fn role(&self) -> Role {
        Role::Consumer
    }

    fn name(&self) -> &str {
        self.control.name()
    }
}
