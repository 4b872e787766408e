//! OHLCV accumulator for a single window.

use serde::{Deserialize, Serialize};

/// Accumulating OHLCV record for one (symbol, window) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Window start in Unix epoch milliseconds.
    pub window_start_ms: i64,
    /// Price of the first applied tick.
    pub open: f64,
    /// Highest applied price.
    pub high: f64,
    /// Lowest applied price.
    pub low: f64,
    /// Price of the most recently applied tick.
    pub close: f64,
    /// Sum of applied sizes.
    pub volume: f64,
    /// Number of ticks applied.
    pub count: u64,
}

impl Bucket {
    /// Creates a bucket from the first accepted tick of a window.
    #[must_use]
    pub const fn open_with(window_start_ms: i64, price: f64, size: f64) -> Self {
        Self {
            window_start_ms,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: size,
            count: 1,
        }
    }

    /// Folds another accepted tick into the bucket.
    ///
    /// `close` follows application order, not event time.
    pub fn update(&mut self, price: f64, size: f64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        self.volume += size;
        self.count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_open_with() {
        let bucket = Bucket::open_with(60_000, 101.0, 3.0);
        assert_eq!(bucket.count, 1);
        assert_relative_eq!(bucket.open, 101.0);
        assert_relative_eq!(bucket.high, 101.0);
        assert_relative_eq!(bucket.low, 101.0);
        assert_relative_eq!(bucket.close, 101.0);
        assert_relative_eq!(bucket.volume, 3.0);
    }

    #[test]
    fn test_update_keeps_extremes() {
        let mut bucket = Bucket::open_with(0, 100.0, 10.0);
        bucket.update(105.0, 5.0);
        bucket.update(95.0, 20.0);

        assert_relative_eq!(bucket.open, 100.0);
        assert_relative_eq!(bucket.high, 105.0);
        assert_relative_eq!(bucket.low, 95.0);
        assert_relative_eq!(bucket.close, 95.0);
        assert_relative_eq!(bucket.volume, 35.0);
        assert_eq!(bucket.count, 3);
    }

    #[test]
    fn test_high_low_bound_open_close() {
        let prices = [10.0, 12.5, 9.0, 11.0, 11.0, 8.5, 13.0, 10.5];
        let mut bucket = Bucket::open_with(0, prices[0], 1.0);
        for price in &prices[1..] {
            bucket.update(*price, 1.0);
            assert!(bucket.high >= bucket.open.max(bucket.close));
            assert!(bucket.low <= bucket.open.min(bucket.close));
        }
    }
}
