//! Bar documents and persistence sinks for tickbar.
//!
//! - [`BarDocument`] - Persisted form of a flushed bucket
//! - [`BarSink`] - Async bulk-write interface to the time-series store
//! - [`NdjsonSink`], [`HttpSink`], [`MemorySink`] - Sink implementations

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tickbar/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod document;
mod http;
mod memory;
mod ndjson;
mod sink;

pub use document::{BarDocument, DEFAULT_TIMEZONE, LOCAL_LABEL_FORMAT};
pub use http::{HttpSink, HttpSinkConfig};
pub use memory::MemorySink;
pub use ndjson::{DEFAULT_COLLECTION, NdjsonSink};
pub use sink::{BarSink, SinkError};
