//! Aggregation coordinator: drains the queue into the bucket store.

use std::sync::Arc;
use tickbar_aggregate::{Applied, Rejection};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::TickReceiver;
use crate::engine::Shared;

/// How the coordinator left its loop.
#[derive(Debug)]
pub(crate) struct CoordinatorExit {
    /// The queue, holding ticks that were never dequeued.
    pub(crate) receiver: TickReceiver,
    /// Ticks dequeued but abandoned before reaching the store.
    pub(crate) abandoned: usize,
}

/// Consumes ticks until cancelled or until every producer is gone.
///
/// Each tick is applied while holding the store lock for the whole worker
/// dispatch. A dispatched tick is always recorded before the loop checks
/// for cancellation again.
pub(crate) async fn run_coordinator(
    mut rx: TickReceiver,
    shared: Arc<Shared>,
    cancel: CancellationToken,
) -> CoordinatorExit {
    let mut abandoned = 0;

    info!(
        service_start_ms = shared.service_start_ms,
        "Tick coordinator started"
    );

    loop {
        let tick = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = rx.recv() => match next {
                Some(tick) => tick,
                None => {
                    info!("All tick producers dropped");
                    break;
                }
            },
        };

        if let Err(e) = tick.validate() {
            shared.stats.record_malformed();
            warn!(
                symbol = %tick.symbol,
                timestamp_ms = tick.timestamp_ms,
                error = %e,
                "Discarding malformed tick"
            );
            continue;
        }

        let store = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                abandoned += 1;
                break;
            }
            guard = Arc::clone(&shared.store).lock_owned() => guard,
        };

        let clock = Arc::clone(&shared.clock);
        let service_start_ms = shared.service_start_ms;
        let job = move || {
            let mut store = store;
            let outcome = store.apply(&tick, service_start_ms, clock.now_ms());
            (tick, outcome)
        };

        // The guard moves into the job and is dropped on the worker once
        // `apply` returns, never earlier.
        let dispatched = shared.pool.run(job).await;

        match dispatched {
            Ok((tick, Ok(applied))) => {
                shared.stats.record_accepted();
                if applied == Applied::Opened {
                    debug!(key = %tick.window_key(), "Opened bucket");
                }
            }
            Ok((tick, Err(rejection))) => {
                match rejection {
                    Rejection::Late { .. } => shared.stats.record_rejected_late(),
                    Rejection::BeforeStart { .. } => shared.stats.record_rejected_before_start(),
                }
                trace!(
                    symbol = %tick.symbol,
                    timestamp_ms = tick.timestamp_ms,
                    reason = %rejection,
                    "Tick rejected"
                );
            }
            Err(e) => {
                shared.stats.record_apply_failure();
                error!(error = %e, "Failed to apply tick");
            }
        }
    }

    info!("Tick coordinator shutting down");
    CoordinatorExit {
        receiver: rx,
        abandoned,
    }
}
