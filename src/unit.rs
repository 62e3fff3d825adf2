use crate::cancel::CancelToken;
use crate::error::{QueueError, Result};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Lifecycle of a producer or consumer unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Created,
    Running,
    /// Ran to completion, or honored a stop request between items
    Finished,
    /// Cancelled while blocked on the queue, or its thread panicked
    StoppedEarly,
}

/// Which side of the queue a unit works
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Producer,
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => f.pad("producer"),
            Role::Consumer => f.pad("consumer"),
        }
    }
}

/// What a unit reports to whoever ran it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub name: String,
    pub role: Role,
    pub state: UnitState,
    /// Items produced or consumed
    pub items: usize,
    /// Why the unit ended, when it did not finish normally
    pub error: Option<QueueError>,
}

/// A unit of work that runs on its own thread against a shared queue
pub trait Unit: Send + 'static {
    /// Run until finished, stopped or cancelled. Blocks the calling thread.
    ///
    /// A cancellation surfaces as [`QueueError::UnitCancelled`].
    fn run(&mut self) -> Result<UnitReport>;

    /// Control handle usable from other threads
    fn handle(&self) -> UnitHandle;

    fn role(&self) -> Role;

    fn name(&self) -> &str {
        "unit"
    }
}

/// Thread-safe control and observation of a running unit
///
/// Cloning shares the same flags.
#[derive(Debug, Clone)]
pub struct UnitHandle {
    name: Arc<str>,
    running: Arc<AtomicBool>,
    cancel: CancelToken,
    state: Arc<Mutex<UnitState>>,
    items: Arc<AtomicUsize>,
}

impl UnitHandle {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            running: Arc::new(AtomicBool::new(true)),
            cancel: CancelToken::new(),
            state: Arc::new(Mutex::new(UnitState::Created)),
            items: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the unit's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the unit to stop after its in-flight operation completes
    ///
    /// A unit parked in `put`/`take` stays parked until the queue lets it
    /// through; use [`UnitHandle::cancel`] to abandon the blocked call.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        log::info!("unit [{}] stop requested", self.name);
    }

    /// Interrupt the unit, including a blocked `put`/`take`
    pub fn cancel(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.cancel.cancel();
    }

    /// Get the unit's current lifecycle state
    pub fn state(&self) -> UnitState {
        *self.state.lock()
    }

    /// Items produced or consumed so far
    pub fn items(&self) -> usize {
        self.items.load(Ordering::SeqCst)
    }

    pub(crate) fn advance(&self) {
        self.items.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Move `Created` to `Running`
    pub(crate) fn begin(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state != UnitState::Created {
            return Err(QueueError::AlreadyStarted);
        }
        *state = UnitState::Running;
        Ok(())
    }

    pub(crate) fn finish(&self, role: Role, items: usize) -> UnitReport {
        *self.state.lock() = UnitState::Finished;
        log::info!("{} [{}] finished with {} items", role, self.name, items);
        UnitReport {
            name: self.name.to_string(),
            role,
            state: UnitState::Finished,
            items,
            error: None,
        }
    }

    pub(crate) fn stopped_early(&self, role: Role, completed: usize) -> QueueError {
        *self.state.lock() = UnitState::StoppedEarly;
        log::warn!(
            "{} [{}] cancelled after {} items",
            role,
            self.name,
            completed
        );
        QueueError::UnitCancelled {
            unit: self.name.to_string(),
            completed,
        }
    }

    /// The unit's thread died mid-run
    pub(crate) fn panicked(&self, role: Role, message: &str) -> UnitReport {
        *self.state.lock() = UnitState::StoppedEarly;
        let items = self.items();
        log::error!(
            "{} [{}] panicked after {} items: {}",
            role,
            self.name,
            items,
            message
        );
        UnitReport {
            name: self.name.to_string(),
            role,
            state: UnitState::StoppedEarly,
            items,
            error: Some(QueueError::UnitPanicked(message.to_string())),
        }
    }
}
