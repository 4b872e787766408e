//! In-memory sink.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::{BarDocument, BarSink, SinkError};

/// Sink that keeps documents in memory.
///
/// Clones share the same collection, so a test can hand one clone to the
/// engine and inspect the other. Failures can be injected for the next
/// `n` writes or for `ping`.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    docs: Mutex<Vec<BarDocument>>,
    batches: AtomicUsize,
    fail_writes: AtomicUsize,
    unreachable: AtomicBool,
    closed: AtomicBool,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink whose `ping` fails.
    #[must_use]
    pub fn unreachable() -> Self {
        let sink = Self::default();
        sink.inner.unreachable.store(true, Ordering::SeqCst);
        sink
    }

    /// Makes the next `n` calls to `insert_many` fail.
    pub fn fail_next_writes(&self, n: usize) {
        self.inner.fail_writes.store(n, Ordering::SeqCst);
    }

    /// Returns a copy of every stored document, in write order.
    #[must_use]
    pub fn documents(&self) -> Vec<BarDocument> {
        self.inner
            .docs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of successful `insert_many` calls.
    #[must_use]
    pub fn batches(&self) -> usize {
        self.inner.batches.load(Ordering::SeqCst)
    }

    /// Returns true once `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BarSink for MemorySink {
    async fn ping(&self) -> Result<(), SinkError> {
        if self.inner.unreachable.load(Ordering::SeqCst) {
            return Err(SinkError::Unreachable {
                target: self.describe(),
                reason: "ping refused".to_string(),
            });
        }
        Ok(())
    }

    async fn insert_many(&self, docs: &[BarDocument]) -> Result<usize, SinkError> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        let failing = self
            .inner
            .fail_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SinkError::Injected(format!("dropped {} bars", docs.len())));
        }

        self.inner
            .docs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(docs);
        self.inner.batches.fetch_add(1, Ordering::SeqCst);
        Ok(docs.len())
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.inner.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
