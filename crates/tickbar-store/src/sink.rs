//! Persistence sink abstraction.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::BarDocument;

/// Errors raised by persistence sinks.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The store could not be reached at start-up.
    #[error("Store unreachable at {target}: {reason}")]
    Unreachable {
        /// The path or URL that was probed.
        target: String,
        /// Why the probe failed.
        reason: String,
    },

    /// Filesystem error while writing a collection file.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("Store returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A window start cannot be represented as a calendar instant.
    #[error("Window start {0}ms is out of range")]
    InvalidTimestamp(i64),

    /// The sink was already closed.
    #[error("Sink is closed")]
    Closed,

    /// Failure injected by a test sink.
    #[error("Injected failure: {0}")]
    Injected(String),
}

/// Bulk-write interface to the bar store.
///
/// One `insert_many` call is issued per flush cycle. Implementations should
/// not retry internally; a failed write is reported and the batch dropped.
#[async_trait]
pub trait BarSink: Send + Sync + std::fmt::Debug {
    /// Checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn ping(&self) -> Result<(), SinkError>;

    /// Writes a batch of documents, returning how many were stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn insert_many(&self, docs: &[BarDocument]) -> Result<usize, SinkError>;

    /// Releases the connection. Further writes fail with [`SinkError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns an error if pending data cannot be flushed.
    async fn close(&self) -> Result<(), SinkError>;

    /// Returns a short description of the destination for logging.
    fn describe(&self) -> String;
}
