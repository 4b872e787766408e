//! Core types for the tickbar OHLCV aggregation engine.
//!
//! This crate provides the fundamental data structures used throughout tickbar:
//!
//! - [`Tick`] - A single trade with symbol, price, size, and timestamp
//! - [`WindowKey`] - The (symbol, window start) pair a tick aggregates into
//! - [`window_start_ms`] / [`window_end_ms`] - Epoch-aligned window arithmetic
//! - [`TickError`] - Reasons a tick is malformed

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tickbar/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod tick;
mod window;

pub use error::TickError;
pub use tick::Tick;
pub use window::{WINDOW_WIDTH_MS, WindowKey, window_end_ms, window_start_ms};
