//! Error types for tick validation.

use thiserror::Error;

/// Reasons a tick cannot be aggregated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TickError {
    /// The symbol is empty or whitespace.
    #[error("Tick has an empty symbol")]
    EmptySymbol,

    /// The price is NaN, infinite, or negative.
    #[error("Invalid price {price} for {symbol}")]
    InvalidPrice {
        /// The offending symbol.
        symbol: String,
        /// The rejected price.
        price: f64,
    },

    /// The size is NaN, infinite, or negative.
    #[error("Invalid size {size} for {symbol}")]
    InvalidSize {
        /// The offending symbol.
        symbol: String,
        /// The rejected size.
        size: f64,
    },

    /// The timestamp predates the Unix epoch.
    #[error("Invalid timestamp {timestamp_ms} for {symbol}")]
    InvalidTimestamp {
        /// The offending symbol.
        symbol: String,
        /// The rejected timestamp in epoch milliseconds.
        timestamp_ms: i64,
    },
}
