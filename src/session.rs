use crate::consumer::{Consumer, Sink};
use crate::error::{QueueError, Result};
use crate::producer::Producer;
use crate::queue::BoundedQueue;
use crate::unit::{Role, Unit, UnitHandle, UnitReport, UnitState};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A consumer configuration in the session builder
struct ConsumerSpec<T> {
    name: String,
    sink: Sink<T>,
    limit: Option<usize>,
}

/// Builder for a producer/consumer session around one queue
pub struct SessionBuilder<T> {
    capacity: usize,
    producers: Vec<(String, Arc<[T]>)>,
    consumers: Vec<ConsumerSpec<T>>,
}

impl<T: Clone + Send + Sync + 'static> SessionBuilder<T> {
    /// Start a session whose queue holds at most `capacity` items
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            producers: Vec::new(),
            consumers: Vec::new(),
        }
    }

    /// Add a producer that will put every item of `source`
    pub fn add_producer(mut self, name: impl Into<String>, source: impl Into<Arc<[T]>>) -> Self {
        self.producers.push((name.into(), source.into()));
        self
    }

    /// Add a consumer appending into `sink`; `limit` of `None` means run
    /// until stopped or cancelled
    pub fn add_consumer(
        mut self,
        name: impl Into<String>,
        sink: Sink<T>,
        limit: Option<usize>,
    ) -> Self {
        self.consumers.push(ConsumerSpec {
            name: name.into(),
            sink,
            limit,
        });
        self
    }

    /// Build the session
    pub fn build(self) -> Result<Session<T>> {
        if self.producers.is_empty() && self.consumers.is_empty() {
            return Err(QueueError::NoUnits);
        }

        let queue = BoundedQueue::new(self.capacity)?;
        let mut units: Vec<Box<dyn Unit>> = Vec::new();
        let mut sources = Vec::new();
        let mut sinks = Vec::new();

        for (name, source) in self.producers {
            sources.push(Arc::clone(&source));
            units.push(Box::new(Producer::new(name, queue.clone(), source)));
        }

        for spec in self.consumers {
            sinks.push(spec.sink.clone());
            let consumer = Consumer::new(spec.name, queue.clone(), spec.sink);
            units.push(Box::new(match spec.limit {
                Some(limit) => consumer.with_limit(limit),
                None => consumer,
            }));
        }

        Ok(Session {
            queue,
            units,
            sources,
            sinks,
        })
    }
}

/// A configured but not yet started session
pub struct Session<T> {
    queue: BoundedQueue<T>,
    units: Vec<Box<dyn Unit>>,
    sources: Vec<Arc<[T]>>,
    sinks: Vec<Sink<T>>,
}

impl<T: Clone + Send + Sync + 'static> Session<T> {
    /// Get the queue shared by every unit
    pub fn queue(&self) -> &BoundedQueue<T> {
        &self.queue
    }

    /// Control handles, in producer-then-consumer order
    pub fn handles(&self) -> Vec<UnitHandle> {
        self.units.iter().map(|u| u.handle()).collect()
    }

    /// Start every unit on its own named thread
    pub fn start(self) -> Result<RunningSession<T>> {
        let (done_tx, done_rx) = channel::unbounded();
        let mut workers = Vec::with_capacity(self.units.len());

        for (index, mut unit) in self.units.into_iter().enumerate() {
            let name = unit.name().to_string();
            let role = unit.role();
            let handle = unit.handle();
            let guard = DoneGuard {
                tx: done_tx.clone(),
                index,
            };

            let spawned = thread::Builder::new()
                .name(format!("{}-{}", role, name))
                .spawn(move || {
                    let _guard = guard;
                    unit.run()
                });

            match spawned {
                Ok(thread) => workers.push(Worker {
                    name,
                    role,
                    handle,
                    thread,
                }),
                Err(e) => {
                    log::error!("could not spawn {} [{}]: {}", role, name, e);
                    for worker in workers {
                        worker.handle.cancel();
                        let _ = worker.thread.join();
                    }
                    return Err(QueueError::Spawn(e.to_string()));
                }
            }
        }

        log::info!("session started with {} units", workers.len());
        Ok(RunningSession {
            queue: self.queue,
            workers,
            done: done_rx,
            sources: self.sources,
            sinks: self.sinks,
        })
    }
}

/// Signals completion when a unit's thread exits, panics included
struct DoneGuard {
    tx: Sender<usize>,
    index: usize,
}

impl Drop for DoneGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(self.index);
    }
}

struct Worker {
    name: String,
    role: Role,
    handle: UnitHandle,
    thread: JoinHandle<Result<UnitReport>>,
}

/// A running session that can be stopped, cancelled and joined
pub struct RunningSession<T> {
    queue: BoundedQueue<T>,
    workers: Vec<Worker>,
    done: Receiver<usize>,
    sources: Vec<Arc<[T]>>,
    sinks: Vec<Sink<T>>,
}

impl<T> RunningSession<T> {
    /// Get the queue shared by every unit
    pub fn queue(&self) -> &BoundedQueue<T> {
        &self.queue
    }

    /// Control handles, in producer-then-consumer order
    pub fn handles(&self) -> Vec<UnitHandle> {
        self.workers.iter().map(|w| w.handle.clone()).collect()
    }

    /// Ask every unit to stop after its in-flight operation
    pub fn stop(&self) {
        for worker in &self.workers {
            worker.handle.stop();
        }
    }

    /// Interrupt every unit, including blocked ones
    pub fn cancel(&self) {
        for worker in &self.workers {
            worker.handle.cancel();
        }
    }

    /// Wait for every unit to reach a terminal state
    pub fn wait(self) -> SessionReport<T> {
        self.join_all()
    }

    /// Wait up to `timeout` for the units, then cancel whatever is left
    pub fn wait_timeout(self, timeout: Duration) -> SessionReport<T> {
        let deadline = Instant::now() + timeout;
        let mut finished = 0;

        while finished < self.workers.len() {
            match self.done.recv_deadline(deadline) {
                Ok(_) => finished += 1,
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!(
                        "session timed out with {} of {} units finished, cancelling",
                        finished,
                        self.workers.len()
                    );
                    self.cancel();
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.join_all()
    }

    fn join_all(self) -> SessionReport<T> {
        let mut units = Vec::with_capacity(self.workers.len());

        for worker in self.workers {
            let report = match worker.thread.join() {
                Ok(Ok(report)) => report,
                Ok(Err(error)) => {
                    let items = match &error {
                        QueueError::UnitCancelled { completed, .. } => *completed,
                        _ => worker.handle.items(),
                    };
                    UnitReport {
                        name: worker.name,
                        role: worker.role,
                        state: worker.handle.state(),
                        items,
                        error: Some(error),
                    }
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    worker.handle.panicked(worker.role, &message)
                }
            };
            units.push(report);
        }

        SessionReport {
            units,
            sources: self.sources,
            sinks: self.sinks,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Outcome of a finished session
pub struct SessionReport<T> {
    pub units: Vec<UnitReport>,
    sources: Vec<Arc<[T]>>,
    sinks: Vec<Sink<T>>,
}

impl<T> SessionReport<T> {
    /// True when every unit finished without error
    pub fn is_clean(&self) -> bool {
        self.units
            .iter()
            .all(|u| u.error.is_none() && u.state == UnitState::Finished)
    }

    /// Units that ended with an error
    pub fn failures(&self) -> impl Iterator<Item = &UnitReport> {
        self.units.iter().filter(|u| u.error.is_some())
    }

    /// Total items put by producers
    pub fn produced(&self) -> usize {
        self.total(Role::Producer)
    }

    /// Total items taken by consumers
    pub fn consumed(&self) -> usize {
        self.total(Role::Consumer)
    }

    fn total(&self, role: Role) -> usize {
        self.units
            .iter()
            .filter(|u| u.role == role)
            .map(|u| u.items)
            .sum()
    }

    /// Get the consumer sinks, in the order they were added
    pub fn sinks(&self) -> &[Sink<T>] {
        &self.sinks
    }
}

impl<T: Clone + Eq + Hash> SessionReport<T> {
    /// Compare everything the sinks received against everything the sources held
    pub fn verify(&self) -> Verification<T> {
        Verification::compare(
            self.sources.iter().flat_map(|s| s.iter().cloned()),
            self.sinks.iter().flat_map(|s| s.snapshot()),
        )
    }
}

/// Multiset comparison of expected against actual items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification<T> {
    pub expected: usize,
    pub actual: usize,
    /// Items short in `actual`, with how many are missing
    pub missing: Vec<(T, usize)>,
    /// Items in surplus in `actual`, with how many extra
    pub unexpected: Vec<(T, usize)>,
}

impl<T: Clone + Eq + Hash> Verification<T> {
    /// Count each distinct item on both sides and keep the differences
    pub fn compare(
        expected: impl IntoIterator<Item = T>,
        actual: impl IntoIterator<Item = T>,
    ) -> Self {
        // Keep first-seen order so reports are stable
        let mut order: Vec<T> = Vec::new();
        let mut balance: HashMap<T, i64> = HashMap::new();
        let mut expected_count = 0;
        let mut actual_count = 0;

        for item in expected {
            expected_count += 1;
            let entry = balance.entry(item.clone()).or_insert_with(|| {
                order.push(item);
                0
            });
            *entry += 1;
        }
        for item in actual {
            actual_count += 1;
            let entry = balance.entry(item.clone()).or_insert_with(|| {
                order.push(item);
                0
            });
            *entry -= 1;
        }

        let mut missing = Vec::new();
        let mut unexpected = Vec::new();
        for item in order {
            let diff = balance[&item];
            if diff > 0 {
                missing.push((item, diff as usize));
            } else if diff < 0 {
                unexpected.push((item, diff.unsigned_abs() as usize));
            }
        }

        Self {
            expected: expected_count,
            actual: actual_count,
            missing,
            unexpected,
        }
    }
}

impl<T> Verification<T> {
    /// Check that nothing is missing and nothing is extra
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}
