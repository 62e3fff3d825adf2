use thiserror::Error;

/// Result type for queue and unit operations
pub type Result<T> = std::result::Result<T, QueueError>;

/// Errors raised by the queue, the producer/consumer units and the session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Queue was asked for a capacity below one
    #[error("Queue capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),

    /// A blocked put/take was interrupted through its cancel token
    #[error("Blocked queue operation was cancelled")]
    Cancelled,

    /// A bounded put/take ran past its deadline
    #[error("Timed out waiting on the queue")]
    Timeout,

    /// A unit was cancelled while blocked and stopped early
    #[error("Unit {unit} was cancelled after {completed} items")]
    UnitCancelled { unit: String, completed: usize },

    /// A unit's thread panicked
    #[error("Unit thread panicked: {0}")]
    UnitPanicked(String),

    /// The OS refused to start a unit thread
    #[error("Failed to spawn unit thread: {0}")]
    Spawn(String),

    /// Unit or session has already been started
    #[error("Unit has already been started")]
    AlreadyStarted,

    /// Session has no producers and no consumers
    #[error("Cannot start a session with no producers or consumers")]
    NoUnits,
}

/// Why a single CSV row was rejected. Rows failing this way are skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("expected at least {expected} columns, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("invalid sale date '{0}'")]
    Date(String),

    #[error("invalid amount '{0}'")]
    Amount(String),

    #[error("invalid quantity '{0}'")]
    Quantity(String),

    #[error("invalid {field}: {reason}")]
    Field { field: &'static str, reason: String },
}

/// Errors that abort a whole record read
#[derive(Error, Debug)]
pub enum RecordError {
    /// Underlying stream could not be opened or read
    #[error("I/O error reading records: {0}")]
    Io(#[from] std::io::Error),

    /// Stream could not be decoded as CSV at all
    #[error("CSV error reading records: {0}")]
    Csv(csv::Error),
}

impl From<csv::Error> for RecordError {
    fn from(err: csv::Error) -> Self {
        if !err.is_io_error() {
            return RecordError::Csv(err);
        }
        match err.into_kind() {
            csv::ErrorKind::Io(io) => RecordError::Io(io),
            other => RecordError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{:?}", other),
            )),
        }
    }
}
