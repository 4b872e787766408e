//! Error types for the engine.

use thiserror::Error;
use tickbar_store::SinkError;
use tokio::task::JoinError;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while running the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The persistence store could not be reached at start-up.
    #[error("Failed to connect to bar store: {0}")]
    Connect(#[source] SinkError),

    /// The worker pool has been shut down.
    #[error("Worker pool is closed")]
    PoolClosed,

    /// A worker job panicked or was aborted.
    #[error("Worker job failed: {0}")]
    Worker(#[source] JoinError),

    /// A background task panicked or was aborted.
    #[error("Engine task '{task}' failed: {source}")]
    Task {
        /// Name of the task.
        task: &'static str,
        /// The underlying join error.
        source: JoinError,
    },

    /// The engine configuration cannot be used.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Unknown IANA timezone name.
    #[error("Unknown timezone: {0}")]
    Timezone(String),

    /// The clock reported an instant that cannot be represented.
    #[error("Clock reading {0}ms is out of range")]
    ClockOutOfRange(i64),
}
