//! Acceptance policy for incoming ticks.

use thiserror::Error;
use tickbar_types::{WINDOW_WIDTH_MS, window_end_ms};

/// Default grace period after a window closes, in milliseconds.
pub const DEFAULT_LATE_THRESHOLD_MS: i64 = 5_000;

/// Why a tick was not aggregated.
///
/// These are policy outcomes rather than failures; callers drop the tick.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The tick's window closed at least `late_threshold_ms` ago.
    #[error("window ending at {window_end_ms} closed {lateness_ms}ms ago")]
    Late {
        /// Exclusive end of the tick's window.
        window_end_ms: i64,
        /// How long ago (wall clock) the window closed.
        lateness_ms: i64,
    },

    /// The tick predates the service start boundary.
    #[error("timestamp {timestamp_ms} predates service start {service_start_ms}")]
    BeforeStart {
        /// The tick's timestamp.
        timestamp_ms: i64,
        /// First timestamp the service aggregates.
        service_start_ms: i64,
    },
}

/// Late-arrival watermark and start boundary checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptancePolicy {
    late_threshold_ms: i64,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_LATE_THRESHOLD_MS)
    }
}

impl AcceptancePolicy {
    /// Creates a policy with the given late threshold.
    #[must_use]
    pub const fn new(late_threshold_ms: i64) -> Self {
        Self { late_threshold_ms }
    }

    /// Returns the late threshold in milliseconds.
    #[must_use]
    pub const fn late_threshold_ms(&self) -> i64 {
        self.late_threshold_ms
    }

    /// Checks a tick timestamp against the watermark and the start boundary.
    ///
    /// The late check runs first and compares wall-clock `now_ms` with the
    /// end of the tick's window, so a tick for a window that never received
    /// any data is still rejected once the grace period has passed.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] that applies, if any.
    pub const fn check(
        &self,
        timestamp_ms: i64,
        service_start_ms: i64,
        now_ms: i64,
    ) -> Result<(), Rejection> {
        let window_end_ms = window_end_ms(timestamp_ms);
        let lateness_ms = now_ms.saturating_sub(window_end_ms);
        if lateness_ms >= self.late_threshold_ms {
            return Err(Rejection::Late {
                window_end_ms,
                lateness_ms,
            });
        }
        if timestamp_ms < service_start_ms {
            return Err(Rejection::BeforeStart {
                timestamp_ms,
                service_start_ms,
            });
        }
        Ok(())
    }

    /// Returns the cutoff at or before which a window end is safe to flush.
    #[must_use]
    pub const fn flush_cutoff_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.late_threshold_ms)
    }

    /// Returns true if a window starting at `window_start_ms` can be flushed.
    #[must_use]
    pub const fn is_closed(&self, window_start_ms: i64, now_ms: i64) -> bool {
        window_start_ms.saturating_add(WINDOW_WIDTH_MS) <= self.flush_cutoff_ms(now_ms)
    }
}
