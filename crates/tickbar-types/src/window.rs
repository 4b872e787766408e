//! Epoch-aligned one-minute windows.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Width of every aggregation window in milliseconds.
pub const WINDOW_WIDTH_MS: i64 = 60_000;

/// Returns the start of the window containing `timestamp_ms`.
///
/// Saturates at `i64::MIN` for the first window of the range.
#[must_use]
pub const fn window_start_ms(timestamp_ms: i64) -> i64 {
    timestamp_ms.saturating_sub(timestamp_ms.rem_euclid(WINDOW_WIDTH_MS))
}

/// Returns the exclusive end of the window containing `timestamp_ms`.
///
/// Saturates at `i64::MAX` for the last window of the range.
#[must_use]
pub const fn window_end_ms(timestamp_ms: i64) -> i64 {
    window_start_ms(timestamp_ms).saturating_add(WINDOW_WIDTH_MS)
}

/// Identifies one bucket: a symbol and the start of its window.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[display("{symbol}@{window_start_ms}")]
pub struct WindowKey {
    /// Instrument symbol.
    pub symbol: String,
    /// Window start in Unix epoch milliseconds.
    pub window_start_ms: i64,
}

impl WindowKey {
    /// Creates a new window key.
    ///
    /// `window_start_ms` is expected to be aligned already; see [`window_start_ms`].
    #[must_use]
    pub fn new(symbol: impl Into<String>, window_start_ms: i64) -> Self {
        Self {
            symbol: symbol.into(),
            window_start_ms,
        }
    }

    /// Returns the exclusive end of this key's window.
    #[must_use]
    pub const fn window_end_ms(&self) -> i64 {
        self.window_start_ms.saturating_add(WINDOW_WIDTH_MS)
    }
}
