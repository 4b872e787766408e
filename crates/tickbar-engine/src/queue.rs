//! Unbounded ingestion queue between producers and the coordinator.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tickbar_types::Tick;
use tokio::sync::mpsc;
use tracing::warn;

use crate::EngineStats;

/// Creates a connected sender/receiver pair.
#[must_use]
pub fn tick_channel(stats: Arc<EngineStats>) -> (TickSender, TickReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let depth = Arc::new(AtomicUsize::new(0));
    (
        TickSender {
            tx,
            depth: Arc::clone(&depth),
            stats,
        },
        TickReceiver { rx, depth },
    )
}

/// Producer handle onto the ingestion queue.
///
/// Cheap to clone; every feed task can hold its own.
#[derive(Debug, Clone)]
pub struct TickSender {
    tx: mpsc::UnboundedSender<Tick>,
    depth: Arc<AtomicUsize>,
    stats: Arc<EngineStats>,
}

impl TickSender {
    /// Enqueues a tick without waiting.
    ///
    /// Returns `false` if the engine is shutting down and the tick was
    /// dropped; the drop is logged.
    pub fn submit(&self, tick: Tick) -> bool {
        // Count before sending so the receiver never decrements below zero.
        self.depth.fetch_add(1, Ordering::SeqCst);
        match self.tx.send(tick) {
            Ok(()) => {
                self.stats.record_submitted();
                true
            }
            Err(mpsc::error::SendError(tick)) => {
                self.depth.fetch_sub(1, Ordering::SeqCst);
                self.stats.record_enqueue_failure();
                warn!(
                    symbol = %tick.symbol,
                    timestamp_ms = tick.timestamp_ms,
                    "Tick queue closed, dropping tick"
                );
                false
            }
        }
    }

    /// Enqueues a tick built from its parts.
    pub fn submit_tick(
        &self,
        symbol: impl Into<String>,
        price: f64,
        size: f64,
        timestamp_ms: i64,
    ) -> bool {
        self.submit(Tick::new(symbol, price, size, timestamp_ms))
    }

    /// Returns the number of ticks waiting to be processed.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    /// Returns true if the receiving side has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the ingestion queue.
#[derive(Debug)]
pub struct TickReceiver {
    rx: mpsc::UnboundedReceiver<Tick>,
    depth: Arc<AtomicUsize>,
}

impl TickReceiver {
    /// Waits for the next tick.
    ///
    /// Returns `None` once every sender is dropped and the queue is empty.
    pub async fn recv(&mut self) -> Option<Tick> {
        let tick = self.rx.recv().await?;
        self.depth.fetch_sub(1, Ordering::SeqCst);
        Some(tick)
    }

    /// Closes the queue and discards whatever is still in it.
    ///
    /// Returns the number of ticks discarded. Later submits fail.
    pub fn close_and_discard(&mut self) -> usize {
        self.rx.close();
        let mut discarded = 0;
        while self.rx.try_recv().is_ok() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            discarded += 1;
        }
        discarded
    }
}
