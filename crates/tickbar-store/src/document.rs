//! Persisted bar document.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tickbar_aggregate::Bucket;
use tickbar_types::WindowKey;

use crate::SinkError;

/// Timezone used for the local-time label when none is configured.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Kolkata;

/// Format of [`BarDocument::window_start_local`].
pub const LOCAL_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One persisted OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarDocument {
    /// Instrument symbol.
    pub symbol: String,
    /// Window start as a UTC instant.
    pub window_start: DateTime<Utc>,
    /// Window start rendered in the configured local timezone.
    pub window_start_local: String,
    /// Opening price.
    pub open: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Total traded size.
    pub volume: f64,
    /// Number of ticks aggregated.
    pub count: u64,
}

impl BarDocument {
    /// Formats a flushed bucket.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::InvalidTimestamp`] if the window start is out of
    /// range for a calendar date.
    pub fn from_bucket(key: &WindowKey, bucket: &Bucket, tz: Tz) -> Result<Self, SinkError> {
        let window_start = DateTime::<Utc>::from_timestamp_millis(bucket.window_start_ms)
            .ok_or(SinkError::InvalidTimestamp(bucket.window_start_ms))?;
        let window_start_local = window_start
            .with_timezone(&tz)
            .format(LOCAL_LABEL_FORMAT)
            .to_string();

        Ok(Self {
            symbol: key.symbol.clone(),
            window_start,
            window_start_local,
            open: bucket.open,
            high: bucket.high,
            low: bucket.low,
            close: bucket.close,
            volume: bucket.volume,
            count: bucket.count,
        })
    }

    /// Formats a batch of flushed buckets, skipping any that fail.
    ///
    /// Returns the documents and the keys that could not be formatted.
    #[must_use]
    pub fn from_buckets(
        buckets: &[(WindowKey, Bucket)],
        tz: Tz,
    ) -> (Vec<Self>, Vec<WindowKey>) {
        let mut docs = Vec::with_capacity(buckets.len());
        let mut skipped = Vec::new();
        for (key, bucket) in buckets {
            match Self::from_bucket(key, bucket, tz) {
                Ok(doc) => docs.push(doc),
                Err(_) => skipped.push(key.clone()),
            }
        }
        (docs, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    #[test]
    fn test_from_bucket_local_label() {
        // 2024-01-15 03:46:00 UTC is 09:16:00 in Asia/Kolkata.
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 3, 46, 0).unwrap();
        let ms = start.timestamp_millis();
        let mut bucket = Bucket::open_with(ms, 22_000.0, 50.0);
        bucket.update(22_010.0, 25.0);

        let doc = BarDocument::from_bucket(&WindowKey::new("NIFTY", ms), &bucket, DEFAULT_TIMEZONE)
            .unwrap();

        assert_eq!(doc.symbol, "NIFTY");
        assert_eq!(doc.window_start, start);
        assert_eq!(doc.window_start_local, "2024-01-15 09:16:00");
        assert_eq!(doc.count, 2);
        assert_relative_eq!(doc.open, 22_000.0);
        assert_relative_eq!(doc.high, 22_010.0);
        assert_relative_eq!(doc.low, 22_000.0);
        assert_relative_eq!(doc.close, 22_010.0);
        assert_relative_eq!(doc.volume, 75.0);
    }

    #[test]
    fn test_document_schema() {
        let bucket = Bucket::open_with(0, 1.0, 2.0);
        let doc = BarDocument::from_bucket(&WindowKey::new("AAPL", 0), &bucket, chrono_tz::UTC)
            .unwrap();
        let value = serde_json::to_value(&doc).unwrap();

        for field in [
            "symbol",
            "window_start",
            "window_start_local",
            "open",
            "high",
            "low",
            "close",
            "volume",
            "count",
        ] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
        assert_eq!(value["window_start_local"], "1970-01-01 00:00:00");
    }

    #[test]
    fn test_from_buckets_skips_out_of_range() {
        let good = (WindowKey::new("AAPL", 0), Bucket::open_with(0, 1.0, 1.0));
        let bad = (
            WindowKey::new("AAPL", i64::MAX),
            Bucket::open_with(i64::MAX, 1.0, 1.0),
        );

        let (docs, skipped) = BarDocument::from_buckets(&[good, bad], chrono_tz::UTC);
        assert_eq!(docs.len(), 1);
        assert_eq!(skipped, vec![WindowKey::new("AAPL", i64::MAX)]);
    }
}
