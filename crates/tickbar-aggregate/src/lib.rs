//! In-memory OHLCV bucket store for tickbar.
//!
//! This crate provides the pure aggregation core:
//!
//! - [`Bucket`] - Accumulating OHLCV record for one window
//! - [`AcceptancePolicy`] - Late-arrival and service-start checks
//! - [`BucketStore`] - Map from [`WindowKey`](tickbar_types::WindowKey) to [`Bucket`]

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tickbar/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bucket;
mod policy;
mod store;

pub use bucket::Bucket;
pub use policy::{AcceptancePolicy, DEFAULT_LATE_THRESHOLD_MS, Rejection};
pub use store::{Applied, BucketStore};
