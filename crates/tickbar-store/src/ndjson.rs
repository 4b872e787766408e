//! Newline-delimited JSON collection files.

use async_trait::async_trait;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{BarDocument, BarSink, SinkError};

/// Collection name used when none is given.
pub const DEFAULT_COLLECTION: &str = "bars_1m";

/// Sink that appends one JSON document per line to `<dir>/<collection>.ndjson`.
#[derive(Debug)]
pub struct NdjsonSink {
    path: PathBuf,
    /// Serializes appends so batches never interleave.
    write_lock: Mutex<()>,
    closed: AtomicBool,
}

impl NdjsonSink {
    /// Creates a sink writing `collection` under `dir`.
    ///
    /// Nothing is touched on disk until [`BarSink::ping`] is called.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>, collection: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{collection}.ndjson")),
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the default data directory for bar files.
    ///
    /// Uses the platform data directory (e.g. `~/.local/share/tickbar/bars`
    /// on Linux), falling back to `~/.tickbar/bars`.
    #[must_use]
    pub fn default_dir() -> PathBuf {
        ProjectDirs::from("", "", "tickbar")
            .map_or_else(dirs_fallback, |proj_dirs| proj_dirs.data_dir().to_path_buf())
            .join("bars")
    }

    /// Returns the collection file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl BarSink for NdjsonSink {
    async fn ping(&self) -> Result<(), SinkError> {
        let unreachable = |reason: String| SinkError::Unreachable {
            target: self.path.display().to_string(),
            reason,
        };

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| unreachable(e.to_string()))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| unreachable(e.to_string()))?;
        Ok(())
    }

    async fn insert_many(&self, docs: &[BarDocument]) -> Result<usize, SinkError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SinkError::Closed);
        }

        let mut buf = Vec::with_capacity(docs.len() * 192);
        for doc in docs {
            serde_json::to_writer(&mut buf, doc)?;
            buf.push(b'\n');
        }

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(&buf).await.map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), docs = docs.len(), bytes = buf.len(), "Appended documents");
        Ok(docs.len())
    }

    async fn close(&self) -> Result<(), SinkError> {
        // Wait for an in-flight append before marking closed.
        let _guard = self.write_lock.lock().await;
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("ndjson:{}", self.path.display())
    }
}

fn dirs_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".tickbar")
}
