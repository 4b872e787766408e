//! Persistence handoff: formats flushed buckets and writes them in bulk.

use chrono_tz::Tz;
use std::sync::Arc;
use tickbar_aggregate::Bucket;
use tickbar_store::{BarDocument, BarSink};
use tickbar_types::WindowKey;
use tracing::{error, info};

use crate::{EngineStats, Result, WorkerPool};

/// Turns removed buckets into documents and issues one bulk write.
#[derive(Debug, Clone)]
pub(crate) struct Handoff {
    sink: Arc<dyn BarSink>,
    pool: WorkerPool,
    timezone: Tz,
    preview_bars: usize,
    stats: Arc<EngineStats>,
}

impl Handoff {
    pub(crate) fn new(
        sink: Arc<dyn BarSink>,
        pool: WorkerPool,
        timezone: Tz,
        preview_bars: usize,
        stats: Arc<EngineStats>,
    ) -> Self {
        Self {
            sink,
            pool,
            timezone,
            preview_bars,
            stats,
        }
    }

    /// Persists a batch of removed buckets, returning the bars written.
    ///
    /// A failed write is logged and the batch discarded; it is not an error
    /// for the caller. Only a worker failure while formatting is returned.
    pub(crate) async fn persist(&self, buckets: Vec<(WindowKey, Bucket)>) -> Result<usize> {
        if buckets.is_empty() {
            return Ok(0);
        }

        let timezone = self.timezone;
        let (docs, skipped) = self
            .pool
            .run(move || BarDocument::from_buckets(&buckets, timezone))
            .await?;

        for key in &skipped {
            error!(key = %key, "Dropping bar with out-of-range window start");
        }
        if docs.is_empty() {
            return Ok(0);
        }

        self.log_preview(&docs);

        match self.sink.insert_many(&docs).await {
            Ok(written) => {
                self.stats.record_persisted(written);
                info!(bars = written, sink = %self.sink.describe(), "Inserted bars");
                Ok(written)
            }
            Err(e) => {
                self.stats.record_write_failure();
                error!(
                    bars = docs.len(),
                    first_window = %docs[0].window_start_local,
                    last_window = %docs[docs.len() - 1].window_start_local,
                    error = %e,
                    "Bulk write failed, discarding bars"
                );
                Ok(0)
            }
        }
    }

    fn log_preview(&self, docs: &[BarDocument]) {
        info!(bars = docs.len(), "Preparing to insert bars");
        for doc in docs.iter().take(self.preview_bars) {
            info!(
                symbol = %doc.symbol,
                window = %doc.window_start_local,
                open = doc.open,
                high = doc.high,
                low = doc.low,
                close = doc.close,
                volume = doc.volume,
                count = doc.count,
                "Bar"
            );
        }
        if docs.len() > self.preview_bars {
            info!(more = docs.len() - self.preview_bars, "Further bars not shown");
        }
    }
}
