//! Windowed tick aggregation engine for tickbar.
//!
//! - [`Engine`] - Lifecycle controller: start, drain, shutdown
//! - [`EngineConfig`] - Late threshold, flush period, worker count, timezone
//! - [`TickSender`] - Non-blocking producer handle onto the ingestion queue
//! - [`WorkerPool`] - Bounded pool for CPU-bound bucket work
//! - [`Clock`] - Wall-clock source ([`SystemClock`], [`ManualClock`])
//! - [`align_service_start`] - First whole minute the engine aggregates

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tickbar/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod align;
mod clock;
mod config;
mod coordinator;
mod engine;
mod error;
mod handoff;
mod pool;
mod queue;
mod scheduler;
mod stats;

pub use align::{ServiceStart, align_service_start};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{DrainReport, Engine, ShutdownReport};
pub use error::{EngineError, Result};
pub use pool::WorkerPool;
pub use queue::{TickReceiver, TickSender, tick_channel};
pub use stats::{EngineStats, StatsSnapshot};
