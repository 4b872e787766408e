//! End-to-end tests driving the engine through its public API.

use approx::assert_relative_eq;
use std::sync::Arc;
use std::time::Duration;
use tickbar_engine::{Engine, EngineConfig, EngineError, ManualClock};
use tickbar_store::{MemorySink, NdjsonSink};

/// 2024-01-15 09:16:00 IST, a minute boundary.
const START_MS: i64 = 1_705_290_360_000;

fn config() -> EngineConfig {
    EngineConfig::default()
        .with_flush_interval(Duration::from_millis(20))
        .with_workers(2)
}

async fn start(sink: &MemorySink, clock: &ManualClock) -> (Engine, tickbar_engine::TickSender) {
    Engine::start_with_clock(config(), Arc::new(sink.clone()), Arc::new(clock.clone()))
        .await
        .unwrap()
}

async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..250 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_closed_window_is_flushed_as_one_bar() {
    let sink = MemorySink::new();
    let clock = ManualClock::new(START_MS);
    let (engine, ticks) = start(&sink, &clock).await;
    assert_eq!(engine.service_start().utc_ms, START_MS);

    clock.set(START_MS + 2_000);
    ticks.submit_tick("AAPL", 100.0, 10.0, START_MS + 1_000);
    ticks.submit_tick("AAPL", 105.0, 5.0, START_MS + 20_000);
    ticks.submit_tick("AAPL", 95.0, 20.0, START_MS + 59_999);
    assert!(eventually(|| engine.stats().accepted == 3).await);

    // Window end has passed but the grace period has not.
    clock.set(START_MS + 64_999);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(sink.documents().is_empty());
    assert_eq!(engine.resident_buckets().await, 1);

    clock.set(START_MS + 65_000);
    assert!(eventually(|| sink.documents().len() == 1).await);

    let bar = &sink.documents()[0];
    assert_eq!(bar.symbol, "AAPL");
    assert_eq!(bar.window_start.timestamp_millis(), START_MS);
    assert_eq!(bar.window_start_local, "2024-01-15 09:16:00");
    assert_relative_eq!(bar.open, 100.0);
    assert_relative_eq!(bar.high, 105.0);
    assert_relative_eq!(bar.low, 95.0);
    assert_relative_eq!(bar.close, 95.0);
    assert_relative_eq!(bar.volume, 35.0);
    assert_eq!(bar.count, 3);
    assert_eq!(engine.resident_buckets().await, 0);

    let report = engine.shutdown().await.unwrap();
    assert_eq!(report.drained_bars, 0);
    assert_eq!(report.stats.bars_persisted, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ticks_before_service_start_are_rejected() {
    let sink = MemorySink::new();
    let clock = ManualClock::new(START_MS - 30_000);
    let (engine, ticks) = start(&sink, &clock).await;
    assert_eq!(engine.service_start().utc_ms, START_MS);

    ticks.submit_tick("AAPL", 100.0, 1.0, START_MS - 1);
    ticks.submit_tick("AAPL", 101.0, 1.0, START_MS);
    assert!(eventually(|| engine.stats().accepted + engine.stats().rejected() == 2).await);

    let stats = engine.stats();
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.rejected_before_start, 1);

    let report = engine.shutdown().await.unwrap();
    assert_eq!(report.drained_bars, 1);
    assert_relative_eq!(sink.documents()[0].open, 101.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_late_ticks_are_rejected() {
    let sink = MemorySink::new();
    let clock = ManualClock::new(START_MS);
    let (engine, ticks) = start(&sink, &clock).await;

    // 4.999s past window end is still accepted, 5s is not.
    clock.set(START_MS + 64_999);
    ticks.submit_tick("MSFT", 10.0, 1.0, START_MS + 1_000);
    assert!(eventually(|| engine.stats().accepted == 1).await);

    clock.set(START_MS + 65_000);
    ticks.submit_tick("MSFT", 11.0, 1.0, START_MS + 2_000);
    assert!(eventually(|| engine.stats().rejected_late == 1).await);

    let report = engine.shutdown().await.unwrap();
    let bars = sink.documents();
    assert_eq!(bars.len(), 1);
    assert_relative_eq!(bars[0].close, 10.0);
    assert_eq!(bars[0].count, 1);
    assert_eq!(report.stats.rejected_late, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_drain_is_idempotent() {
    let sink = MemorySink::new();
    let clock = ManualClock::new(START_MS);
    let (mut engine, ticks) = start(&sink, &clock).await;

    ticks.submit_tick("AAPL", 1.0, 1.0, START_MS);
    ticks.submit_tick("MSFT", 2.0, 1.0, START_MS + 60_000);
    assert!(eventually(|| engine.stats().accepted == 2).await);

    let first = engine.drain().await.unwrap();
    assert_eq!(first.drained, 2);
    assert_eq!(first.persisted, 2);

    let second = engine.drain().await.unwrap();
    assert_eq!(second.drained, 0);
    assert_eq!(second.persisted, 0);
    assert_eq!(sink.documents().len(), 2);

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_persists_open_windows_and_closes_sink() {
    let sink = MemorySink::new();
    let clock = ManualClock::new(START_MS);
    let (engine, ticks) = start(&sink, &clock).await;

    for (i, symbol) in ["AAPL", "MSFT", "GOOG"].into_iter().enumerate() {
        ticks.submit_tick(symbol, 50.0, 2.0, START_MS + i as i64 * 1_000);
    }
    assert!(eventually(|| engine.stats().accepted == 3).await);

    let report = engine.shutdown().await.unwrap();
    assert_eq!(report.drained_bars, 3);
    assert_eq!(report.persisted_bars, 3);
    assert_eq!(report.dropped_ticks, 0);
    assert!(sink.is_closed());

    // The queue is closed once the engine is gone.
    assert!(!ticks.submit_tick("AAPL", 1.0, 1.0, START_MS));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreachable_sink_fails_start() {
    let sink = MemorySink::unreachable();
    let clock = ManualClock::new(START_MS);

    let result =
        Engine::start_with_clock(config(), Arc::new(sink), Arc::new(clock)).await;

    assert!(matches!(result, Err(EngineError::Connect(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_write_discards_bars() {
    let sink = MemorySink::new();
    sink.fail_next_writes(1);
    let clock = ManualClock::new(START_MS);
    let (engine, ticks) = start(&sink, &clock).await;

    ticks.submit_tick("AAPL", 1.0, 1.0, START_MS);
    assert!(eventually(|| engine.stats().accepted == 1).await);

    clock.set(START_MS + 65_000);
    assert!(eventually(|| engine.stats().write_failures == 1).await);
    assert_eq!(engine.resident_buckets().await, 0);

    let report = engine.shutdown().await.unwrap();
    assert_eq!(report.drained_bars, 0);
    assert!(sink.documents().is_empty());
    assert_eq!(report.stats.bars_flushed, 1);
    assert_eq!(report.stats.bars_persisted, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bars_land_in_ndjson_file() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(NdjsonSink::new(dir.path(), "bars_1m"));
    let clock = ManualClock::new(START_MS);
    let (engine, ticks) =
        Engine::start_with_clock(config(), sink.clone(), Arc::new(clock.clone()))
            .await
            .unwrap();

    ticks.submit_tick("AAPL", 100.0, 1.0, START_MS + 500);
    ticks.submit_tick("AAPL", 100.5, 1.0, START_MS + 61_000);
    assert!(eventually(|| engine.stats().accepted == 2).await);

    clock.set(START_MS + 65_000);
    assert!(eventually(|| engine.stats().bars_persisted == 1).await);

    let report = engine.shutdown().await.unwrap();
    assert_eq!(report.persisted_bars, 1);

    let contents = std::fs::read_to_string(sink.path()).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["window_start_local"], "2024-01-15 09:16:00");
    assert_eq!(first["count"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_drained_window_is_never_written_twice() {
    let sink = MemorySink::new();
    let clock = ManualClock::new(START_MS);
    let (mut engine, ticks) = start(&sink, &clock).await;

    ticks.submit_tick("AAPL", 100.0, 1.0, START_MS + 1_000);
    assert!(eventually(|| engine.stats().accepted == 1).await);

    assert_eq!(engine.drain().await.unwrap().drained, 1);

    // Same window, still open by the clock, but the engine is drained.
    assert!(!ticks.submit_tick("AAPL", 101.0, 1.0, START_MS + 2_000));

    engine.shutdown().await.unwrap();
    let bars = sink.documents();
    assert_eq!(bars.len(), 1);
    assert_relative_eq!(bars[0].open, 100.0);
    assert_eq!(bars[0].count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_zero_flush_interval_fails_start() {
    let sink = MemorySink::new();
    let clock = ManualClock::new(START_MS);
    let config = config().with_flush_interval(Duration::ZERO);

    let result = Engine::start_with_clock(config, Arc::new(sink), Arc::new(clock)).await;

    assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_malformed_ticks_do_not_stop_processing() {
    let sink = MemorySink::new();
    let clock = ManualClock::new(START_MS);
    let (engine, ticks) = start(&sink, &clock).await;

    ticks.submit_tick("AAPL", f64::NAN, 1.0, START_MS + 1_000);
    ticks.submit_tick("   ", 100.0, 1.0, START_MS + 1_000);
    ticks.submit_tick("AAPL", 100.0, -3.0, START_MS + 1_000);
    ticks.submit_tick("AAPL", 100.0, 1.0, i64::MAX);
    ticks.submit_tick("AAPL", 100.0, 2.0, START_MS + 2_000);
    assert!(eventually(|| engine.stats().processed() == 5).await);

    let stats = engine.stats();
    assert_eq!(stats.malformed, 4);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.apply_failures, 0);

    let report = engine.shutdown().await.unwrap();
    assert_eq!(report.drained_bars, 1);
    assert_relative_eq!(sink.documents()[0].volume, 2.0);
}
