//! Trade tick representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TickError, WindowKey, window_start_ms};

/// A single trade tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Instrument symbol (e.g., "AAPL", "NIFTY 50").
    pub symbol: String,
    /// Traded price.
    pub price: f64,
    /// Traded quantity.
    pub size: f64,
    /// Exchange timestamp in Unix epoch milliseconds.
    #[serde(alias = "ts", alias = "ts_ms")]
    pub timestamp_ms: i64,
}

impl Tick {
    /// Creates a new tick.
    #[must_use]
    pub fn new(symbol: impl Into<String>, price: f64, size: f64, timestamp_ms: i64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            size,
            timestamp_ms,
        }
    }

    /// Returns the start of the one-minute window this tick belongs to.
    #[must_use]
    pub const fn window_start_ms(&self) -> i64 {
        window_start_ms(self.timestamp_ms)
    }

    /// Returns the bucket key for this tick.
    #[must_use]
    pub fn window_key(&self) -> WindowKey {
        WindowKey::new(self.symbol.clone(), self.window_start_ms())
    }

    /// Checks that the tick is well formed.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is blank, the price or size is not a
    /// finite non-negative number, or the timestamp is negative or beyond the
    /// last representable calendar instant.
    pub fn validate(&self) -> Result<(), TickError> {
        if self.symbol.trim().is_empty() {
            return Err(TickError::EmptySymbol);
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(TickError::InvalidPrice {
                symbol: self.symbol.clone(),
                price: self.price,
            });
        }
        if !self.size.is_finite() || self.size < 0.0 {
            return Err(TickError::InvalidSize {
                symbol: self.symbol.clone(),
                size: self.size,
            });
        }
        if self.timestamp_ms < 0 || DateTime::<Utc>::from_timestamp_millis(self.timestamp_ms).is_none() {
            return Err(TickError::InvalidTimestamp {
                symbol: self.symbol.clone(),
                timestamp_ms: self.timestamp_ms,
            });
        }
        Ok(())
    }
}
