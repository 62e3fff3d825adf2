//! A bounded blocking queue for coordinating producer and consumer threads,
//! with a small in-memory query layer over CSV sales records.
//!
//! # Features
//!
//! - Fixed-capacity FIFO with blocking `put`/`take` built on a mutex and a
//!   broadcast condition variable
//! - Cooperative cancellation of blocked calls through [`CancelToken`]
//! - Producer and consumer units with stop/cancel handles and terminal reports
//! - Session builder that runs units on their own threads and verifies that
//!   every produced item was consumed exactly once
//! - CSV record reader that skips malformed rows, and pure sales queries
//!
//! # Example
//!
//! ```no_run
//! use queue_relay::{SessionBuilder, Sink};
//!
//! let source: Vec<String> = (1..=10).map(|i| format!("Item-{}", i)).collect();
//! let sink = Sink::new();
//!
//! let session = SessionBuilder::new(5)
//!     .add_producer("Producer-1", source.clone())
//!     .add_consumer("Consumer-1", sink.clone(), Some(source.len()))
//!     .build()?;
//!
//! let report = session.start()?.wait();
//! assert!(report.verify().is_ok());
//! # Ok::<(), queue_relay::QueueError>(())
//! ```

pub mod cancel;
pub mod consumer;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod producer;
pub mod query;
pub mod queue;
pub mod reader;
pub mod record;
pub mod session;
pub mod unit;

// Re-exports for convenience
pub use cancel::CancelToken;
pub use consumer::{Consumer, Sink};
pub use error::{QueueError, RecordError, Result, RowError};
pub use metrics::{MetricsSnapshot, QueueMetrics};
pub use producer::Producer;
pub use query::SalesQuery;
pub use queue::BoundedQueue;
pub use reader::{read_path, read_records, ReadSummary};
pub use record::{Money, SalesRecord};
pub use session::{RunningSession, Session, SessionBuilder, SessionReport, Verification};
pub use unit::{Role, Unit, UnitHandle, UnitReport, UnitState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
