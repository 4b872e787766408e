//! Real-time aggregation of trade ticks into one-minute OHLCV bars.
//!
//! This is a facade crate that re-exports functionality from the tickbar
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tickbar_lib::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sink = Arc::new(NdjsonSink::new(NdjsonSink::default_dir(), DEFAULT_COLLECTION));
//!     let (engine, ticks) = Engine::start(EngineConfig::default(), sink).await?;
//!
//!     ticks.submit_tick("RELIANCE", 2_950.5, 10.0, chrono::Utc::now().timestamp_millis());
//!
//!     let report = engine.shutdown().await?;
//!     println!("Persisted {} bars on shutdown", report.persisted_bars);
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tickbar/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use tickbar_types::*;

// Re-export bucket aggregation
pub use tickbar_aggregate::{
    AcceptancePolicy, Applied, Bucket, BucketStore, DEFAULT_LATE_THRESHOLD_MS, Rejection,
};

// Re-export sinks
#[cfg(feature = "store")]
pub use tickbar_store::{
    BarDocument, BarSink, DEFAULT_COLLECTION, DEFAULT_TIMEZONE, HttpSink, HttpSinkConfig,
    LOCAL_LABEL_FORMAT, MemorySink, NdjsonSink, SinkError,
};

// Re-export the engine
#[cfg(feature = "engine")]
pub use tickbar_engine::{
    Clock, DrainReport, Engine, EngineConfig, EngineError, EngineStats, ManualClock,
    ServiceStart, ShutdownReport, StatsSnapshot, SystemClock, TickReceiver, TickSender,
    WorkerPool, align_service_start, tick_channel,
};

/// Prelude module for convenient imports.
///
/// ```
/// use tickbar_lib::prelude::*;
/// ```
pub mod prelude {
    pub use tickbar_types::{Tick, TickError, WINDOW_WIDTH_MS, WindowKey};

    pub use tickbar_aggregate::{AcceptancePolicy, Bucket, BucketStore, Rejection};

    #[cfg(feature = "store")]
    pub use tickbar_store::{
        BarDocument, BarSink, DEFAULT_COLLECTION, HttpSink, HttpSinkConfig, MemorySink,
        NdjsonSink, SinkError,
    };

    #[cfg(feature = "engine")]
    pub use tickbar_engine::{
        Engine, EngineConfig, EngineError, ShutdownReport, StatsSnapshot, TickSender,
    };
}
