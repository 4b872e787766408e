//! Engine counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters shared by the engine tasks.
#[derive(Debug, Default)]
pub struct EngineStats {
    submitted: AtomicU64,
    enqueue_failures: AtomicU64,
    accepted: AtomicU64,
    rejected_late: AtomicU64,
    rejected_before_start: AtomicU64,
    malformed: AtomicU64,
    apply_failures: AtomicU64,
    bars_flushed: AtomicU64,
    bars_persisted: AtomicU64,
    write_failures: AtomicU64,
    flush_failures: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Ticks handed to the queue.
    pub submitted: u64,
    /// Ticks dropped because the queue was closed.
    pub enqueue_failures: u64,
    /// Ticks applied to a bucket.
    pub accepted: u64,
    /// Ticks rejected by the late-arrival watermark.
    pub rejected_late: u64,
    /// Ticks rejected for predating the service start.
    pub rejected_before_start: u64,
    /// Ticks that failed validation.
    pub malformed: u64,
    /// Ticks lost to a worker failure while applying.
    pub apply_failures: u64,
    /// Buckets removed from the store for persistence.
    pub bars_flushed: u64,
    /// Bars the sink confirmed as written.
    pub bars_persisted: u64,
    /// Failed bulk writes.
    pub write_failures: u64,
    /// Flush cycles that failed and triggered a backoff.
    pub flush_failures: u64,
}

impl EngineStats {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_enqueue_failure(&self) {
        self.enqueue_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected_late(&self) {
        self.rejected_late.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected_before_start(&self) {
        self.rejected_before_start.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_apply_failure(&self) {
        self.apply_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_flushed(&self, bars: usize) {
        self.bars_flushed.fetch_add(bars as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_persisted(&self, bars: usize) {
        self.bars_persisted.fetch_add(bars as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_flush_failure(&self) {
        self.flush_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a copy of the current counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            enqueue_failures: self.enqueue_failures.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected_late: self.rejected_late.load(Ordering::Relaxed),
            rejected_before_start: self.rejected_before_start.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            apply_failures: self.apply_failures.load(Ordering::Relaxed),
            bars_flushed: self.bars_flushed.load(Ordering::Relaxed),
            bars_persisted: self.bars_persisted.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            flush_failures: self.flush_failures.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Returns the total number of rejected ticks.
    #[must_use]
    pub const fn rejected(&self) -> u64 {
        self.rejected_late + self.rejected_before_start
    }

    /// Returns the number of dequeued ticks the coordinator has finished with.
    #[must_use]
    pub const fn processed(&self) -> u64 {
        self.accepted + self.rejected() + self.malformed + self.apply_failures
    }
}
