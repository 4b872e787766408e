//! Periodic flush of closed windows.

use std::sync::Arc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::Result;
use crate::engine::Shared;
use crate::handoff::Handoff;

/// Result of one flush cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CycleOutcome {
    pub(crate) removed: usize,
    pub(crate) persisted: usize,
}

/// Runs flush cycles on a fixed period until cancelled.
///
/// Cycles never overlap: a slow write delays the next tick instead of
/// bursting to catch up.
pub(crate) async fn run_scheduler(shared: Arc<Shared>, handoff: Handoff, cancel: CancellationToken) {
    let period = shared.config.flush_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
        late_threshold_ms = shared.config.late_threshold_ms,
        "Flush scheduler started"
    );

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match flush_cycle(&shared, &handoff, &cancel).await {
            Ok(Some(outcome)) if outcome.removed > 0 => {
                debug!(
                    removed = outcome.removed,
                    persisted = outcome.persisted,
                    "Flush cycle complete"
                );
            }
            Ok(_) => {}
            Err(e) => {
                shared.stats.record_flush_failure();
                let backoff = shared.config.error_backoff;
                error!(
                    error = %e,
                    backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                    "Flush cycle failed"
                );
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(backoff) => {}
                }
            }
        }
    }

    info!("Flush scheduler shutting down");
}

/// Removes every bucket past its grace period and persists it.
///
/// Returns `None` if cancelled before anything was removed. Once buckets
/// have been removed the cycle runs to completion so they reach the sink.
pub(crate) async fn flush_cycle(
    shared: &Shared,
    handoff: &Handoff,
    cancel: &CancellationToken,
) -> Result<Option<CycleOutcome>> {
    let cutoff_ms = shared.config.policy().flush_cutoff_ms(shared.clock.now_ms());

    let snapshot = tokio::select! {
        biased;
        () = cancel.cancelled() => return Ok(None),
        guard = Arc::clone(&shared.store).lock_owned() => guard,
    };
    let keys = shared
        .pool
        .run(move || snapshot.closed_keys(cutoff_ms))
        .await?;
    if keys.is_empty() {
        return Ok(Some(CycleOutcome::default()));
    }

    // Another remover may have taken some of these since the scan.
    let removed = shared.store.lock().await.remove_keys(&keys);
    shared.stats.record_flushed(removed.len());

    let removed_count = removed.len();
    let persisted = handoff.persist(removed).await?;

    Ok(Some(CycleOutcome {
        removed: removed_count,
        persisted,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EngineConfig, ManualClock};
    use std::time::Duration;
    use tickbar_store::MemorySink;
    use tickbar_types::Tick;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_cycle_backs_off_and_keeps_running() {
        let config = EngineConfig::default()
            .with_flush_interval(Duration::from_millis(10))
            .with_error_backoff(Duration::from_secs(30));
        let clock = ManualClock::new(70_000);
        let shared = Arc::new(Shared::new(config, Arc::new(clock), 0));
        shared
            .store
            .lock()
            .await
            .apply(&Tick::new("AAPL", 1.0, 1.0, 1_000), 0, 1_000)
            .unwrap();

        // A closed pool makes every cycle fail at discovery.
        shared.pool.shutdown().await;
        let handoff = Handoff::new(
            Arc::new(MemorySink::new()),
            shared.pool.clone(),
            chrono_tz::UTC,
            5,
            Arc::clone(&shared.stats),
        );
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_scheduler(
            Arc::clone(&shared),
            handoff,
            cancel.child_token(),
        ));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!task.is_finished());
        // Still inside the first backoff: exactly one failed cycle.
        assert_eq!(shared.stats.snapshot().flush_failures, 1);
        assert_eq!(shared.store.lock().await.len(), 1);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("scheduler stops during backoff")
            .unwrap();
    }
}
