//! Bucket store keyed by (symbol, window start).

use std::collections::HashMap;

use tickbar_types::{Tick, WindowKey};

use crate::{AcceptancePolicy, Bucket, Rejection};

/// How an accepted tick changed the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The tick opened a new bucket.
    Opened,
    /// The tick updated an existing bucket.
    Updated,
}

/// In-memory map from [`WindowKey`] to its accumulating [`Bucket`].
///
/// The store holds at most one bucket per key. It never reads the clock;
/// callers supply `now_ms` so the same store can be driven by a test clock.
#[derive(Debug, Default)]
pub struct BucketStore {
    policy: AcceptancePolicy,
    buckets: HashMap<WindowKey, Bucket>,
}

impl BucketStore {
    /// Creates an empty store using the given acceptance policy.
    #[must_use]
    pub fn new(policy: AcceptancePolicy) -> Self {
        Self {
            policy,
            buckets: HashMap::new(),
        }
    }

    /// Returns the acceptance policy.
    #[must_use]
    pub const fn policy(&self) -> &AcceptancePolicy {
        &self.policy
    }

    /// Applies a tick, creating or updating its bucket.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] without touching the store if the tick's
    /// window is past the late threshold or the tick predates
    /// `service_start_ms`.
    pub fn apply(
        &mut self,
        tick: &Tick,
        service_start_ms: i64,
        now_ms: i64,
    ) -> Result<Applied, Rejection> {
        self.policy
            .check(tick.timestamp_ms, service_start_ms, now_ms)?;

        let key = tick.window_key();
        match self.buckets.get_mut(&key) {
            Some(bucket) => {
                bucket.update(tick.price, tick.size);
                Ok(Applied::Updated)
            }
            None => {
                let bucket = Bucket::open_with(key.window_start_ms, tick.price, tick.size);
                self.buckets.insert(key, bucket);
                Ok(Applied::Opened)
            }
        }
    }

    /// Returns the keys whose windows ended at or before `cutoff_ms`.
    ///
    /// Read-only; the result is sorted so flushes persist in window order.
    #[must_use]
    pub fn closed_keys(&self, cutoff_ms: i64) -> Vec<WindowKey> {
        let mut keys: Vec<WindowKey> = self
            .buckets
            .keys()
            .filter(|key| key.window_end_ms() <= cutoff_ms)
            .cloned()
            .collect();
        keys.sort_by(|a, b| {
            a.window_start_ms
                .cmp(&b.window_start_ms)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        keys
    }

    /// Removes the given keys, skipping any that are no longer present.
    #[must_use]
    pub fn remove_keys(&mut self, keys: &[WindowKey]) -> Vec<(WindowKey, Bucket)> {
        keys.iter()
            .filter_map(|key| self.buckets.remove_entry(key))
            .collect()
    }

    /// Removes and returns every resident bucket, regardless of window state.
    #[must_use]
    pub fn drain_all(&mut self) -> Vec<(WindowKey, Bucket)> {
        let mut drained: Vec<(WindowKey, Bucket)> = self.buckets.drain().collect();
        drained.sort_by(|(a, _), (b, _)| {
            a.window_start_ms
                .cmp(&b.window_start_ms)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        drained
    }

    /// Returns the bucket for a key, if resident.
    #[must_use]
    pub fn get(&self, key: &WindowKey) -> Option<&Bucket> {
        self.buckets.get(key)
    }

    /// Returns the number of resident buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns true if no buckets are resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
