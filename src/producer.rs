use crate::error::{QueueError, Result};
use crate::queue::BoundedQueue;
use crate::unit::{Role, Unit, UnitHandle, UnitReport};
use std::sync::Arc;

/// Pushes every item of a fixed source sequence into a queue, in order
///
/// The cursor only advances after a successful `put`, so a cancelled producer
/// reports exactly the items that reached the queue.
pub struct Producer<T> {
    queue: BoundedQueue<T>,
    source: Arc<[T]>,
    cursor: usize,
    control: UnitHandle,
}

impl<T: Clone + Send + Sync + 'static> Producer<T> {
    /// Create a producer that will put every item of `source` into `queue`
    pub fn new(name: impl AsRef<str>, queue: BoundedQueue<T>, source: impl Into<Arc<[T]>>) -> Self {
        Self {
            queue,
            source: source.into(),
            cursor: 0,
            control: UnitHandle::new(name.as_ref()),
        }
    }

    /// Items successfully put so far
    pub fn produced(&self) -> usize {
        self.cursor
    }

    /// Get the full source sequence
    pub fn source(&self) -> &[T] {
        &self.source
    }
}

impl<T: Clone + Send + Sync + 'static> Unit for Producer<T> {
    fn run(&mut self) -> Result<UnitReport> {
        self.control.begin()?;
        log::info!(
            "producer [{}] started with {} items",
            self.control.name(),
            self.source.len()
        );

        while self.control.is_running() && self.cursor < self.source.len() {
            if self.control.is_cancelled() {
                return Err(self.control.stopped_early(Role::Producer, self.cursor));
            }

            let item = self.source[self.cursor].clone();
            match self.queue.put_with(item, self.control.token()) {
                Ok(()) => {
                    self.cursor += 1;
                    self.control.advance();
                }
                Err(QueueError::Cancelled) => {
                    return Err(self.control.stopped_early(Role::Producer, self.cursor));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(self.control.finish(Role::Producer, self.cursor))
    }

    fn handle(&self) -> UnitHandle {
        self.control.clone()
    }

    fn role(&self) -> Role {
        Role::Producer
    }

    fn name(&self) -> &str {
        self.control.name()
    }
}
