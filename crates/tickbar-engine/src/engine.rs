//! Lifecycle controller: start-up, drain, and shutdown.

use serde::Serialize;
use std::sync::Arc;
use tickbar_aggregate::BucketStore;
use tickbar_store::BarSink;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::coordinator::{CoordinatorExit, run_coordinator};
use crate::handoff::Handoff;
use crate::scheduler::run_scheduler;
use crate::{
    Clock, EngineConfig, EngineError, EngineStats, Result, ServiceStart, StatsSnapshot,
    SystemClock, TickSender, WorkerPool, align_service_start, tick_channel,
};

/// State shared by the coordinator, the scheduler, and the controller.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) config: EngineConfig,
    pub(crate) store: Arc<Mutex<BucketStore>>,
    pub(crate) pool: WorkerPool,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) stats: Arc<EngineStats>,
    pub(crate) service_start_ms: i64,
}

impl Shared {
    pub(crate) fn new(config: EngineConfig, clock: Arc<dyn Clock>, service_start_ms: i64) -> Self {
        Self {
            store: Arc::new(Mutex::new(BucketStore::new(config.policy()))),
            pool: WorkerPool::new(config.workers),
            stats: Arc::new(EngineStats::default()),
            config,
            clock,
            service_start_ms,
        }
    }
}

/// Outcome of draining the bucket store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Buckets removed from the store.
    pub drained: usize,
    /// Bars the sink confirmed as written.
    pub persisted: usize,
}

/// Outcome of a full shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    /// Bars removed by the final drain.
    pub drained_bars: usize,
    /// Bars from the final drain that were written.
    pub persisted_bars: usize,
    /// Ticks submitted but never applied because the coordinator stopped.
    pub dropped_ticks: usize,
    /// Counters at the end of the run.
    pub stats: StatsSnapshot,
}

/// A running aggregation engine.
///
/// Dropping an engine without calling [`shutdown`](Self::shutdown) stops
/// its tasks but does not persist resident buckets.
#[derive(Debug)]
pub struct Engine {
    shared: Arc<Shared>,
    handoff: Handoff,
    sink: Arc<dyn BarSink>,
    service_start: ServiceStart,
    cancel: CancellationToken,
    coordinator: Option<JoinHandle<CoordinatorExit>>,
    scheduler: Option<JoinHandle<()>>,
    dropped_ticks: usize,
}

impl Engine {
    /// Connects to the sink and starts the coordinator and flush scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for an unusable configuration
    /// and [`EngineError::Connect`] if the sink is unreachable; nothing is
    /// started in either case.
    pub async fn start(
        config: EngineConfig,
        sink: Arc<dyn BarSink>,
    ) -> Result<(Self, TickSender)> {
        Self::start_with_clock(config, sink, Arc::new(SystemClock)).await
    }

    /// Like [`start`](Self::start), reading wall-clock time from `clock`.
    ///
    /// # Errors
    ///
    /// Same as [`start`](Self::start).
    pub async fn start_with_clock(
        config: EngineConfig,
        sink: Arc<dyn BarSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, TickSender)> {
        config.validate()?;

        let target = sink.describe();
        if let Err(e) = sink.ping().await {
            error!(sink = %target, error = %e, "Bar store connection failed");
            return Err(EngineError::Connect(e));
        }
        info!(sink = %target, "Connected to bar store");

        let now = clock.now();
        let service_start = align_service_start(now, config.timezone)?;
        info!(
            local_now = %now.with_timezone(&config.timezone).format("%Y-%m-%d %H:%M:%S"),
            start = %service_start.local.format("%Y-%m-%d %H:%M:%S %Z"),
            "Will start processing ticks from"
        );

        let shared = Arc::new(Shared::new(config, clock, service_start.utc_ms));
        let handoff = Handoff::new(
            Arc::clone(&sink),
            shared.pool.clone(),
            shared.config.timezone,
            shared.config.preview_bars,
            Arc::clone(&shared.stats),
        );

        let (sender, receiver) = tick_channel(Arc::clone(&shared.stats));
        let cancel = CancellationToken::new();

        let coordinator = tokio::spawn(run_coordinator(
            receiver,
            Arc::clone(&shared),
            cancel.child_token(),
        ));
        let scheduler = tokio::spawn(run_scheduler(
            Arc::clone(&shared),
            handoff.clone(),
            cancel.child_token(),
        ));

        let engine = Self {
            shared,
            handoff,
            sink,
            service_start,
            cancel,
            coordinator: Some(coordinator),
            scheduler: Some(scheduler),
            dropped_ticks: 0,
        };
        Ok((engine, sender))
    }

    /// Returns the first instant this engine aggregates.
    #[must_use]
    pub const fn service_start(&self) -> &ServiceStart {
        &self.service_start
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Returns a snapshot of the engine counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Returns the number of buckets currently held in memory.
    pub async fn resident_buckets(&self) -> usize {
        self.shared.store.lock().await.len()
    }

    /// Stops tick processing and flushing, then persists every resident
    /// bucket, closed or not.
    ///
    /// Once drained the engine accepts no more ticks, so no window can be
    /// reopened and flushed a second time. Calling this again persists
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool fails while formatting.
    pub async fn drain(&mut self) -> Result<DrainReport> {
        self.stop_tasks().await;
        self.drain_store().await
    }

    /// Drains, then releases the sink and the worker pool.
    ///
    /// Ticks still in the queue are not processed; they are counted in
    /// [`ShutdownReport::dropped_ticks`].
    ///
    /// # Errors
    ///
    /// Returns an error if the final drain fails. The sink and pool are
    /// released either way.
    pub async fn shutdown(mut self) -> Result<ShutdownReport> {
        info!("Shutdown initiated");
        let drain = self.drain().await;

        if let Err(e) = self.sink.close().await {
            error!(error = %e, "Failed to close bar store");
        } else {
            info!("Bar store connection closed");
        }
        self.shared.pool.shutdown().await;
        info!("Worker pool shut down");

        let drain = drain?;
        Ok(ShutdownReport {
            drained_bars: drain.drained,
            persisted_bars: drain.persisted,
            dropped_ticks: self.dropped_ticks,
            stats: self.shared.stats.snapshot(),
        })
    }

    /// Cancels and joins the coordinator and scheduler. Idempotent.
    async fn stop_tasks(&mut self) {
        self.cancel.cancel();

        if let Some(handle) = self.coordinator.take() {
            match handle.await {
                Ok(CoordinatorExit {
                    mut receiver,
                    abandoned,
                }) => {
                    let dropped = receiver.close_and_discard() + abandoned;
                    if dropped > 0 {
                        warn!(ticks = dropped, "Discarded unprocessed ticks");
                    }
                    self.dropped_ticks += dropped;
                }
                Err(source) => error!(
                    error = %EngineError::Task { task: "coordinator", source },
                    "Coordinator did not stop cleanly"
                ),
            }
        }
        if let Some(handle) = self.scheduler.take()
            && let Err(source) = handle.await
        {
            error!(
                error = %EngineError::Task { task: "scheduler", source },
                "Scheduler did not stop cleanly"
            );
        }
    }

    async fn drain_store(&self) -> Result<DrainReport> {
        let drained = self.shared.store.lock().await.drain_all();
        let count = drained.len();
        if count == 0 {
            info!("No resident bars to drain");
            return Ok(DrainReport::default());
        }

        info!(bars = count, "Draining resident bars");
        self.shared.stats.record_flushed(count);
        let persisted = self.handoff.persist(drained).await?;
        Ok(DrainReport {
            drained: count,
            persisted,
        })
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
