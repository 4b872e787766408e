//! Service start alignment.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use tickbar_types::{WINDOW_WIDTH_MS, window_start_ms};

use crate::{EngineError, Result};

/// First instant the engine aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStart {
    /// Start boundary in Unix epoch milliseconds.
    pub utc_ms: i64,
    /// The same boundary in the configured local timezone.
    pub local: DateTime<Tz>,
}

/// Computes the service start for an engine started at `now`.
///
/// Starting exactly on a minute boundary begins processing immediately;
/// otherwise processing begins at the next boundary, so the first window
/// aggregated is always complete. Boundaries are epoch-aligned minutes,
/// which coincide with local minutes for every whole-minute UTC offset.
///
/// # Errors
///
/// Returns [`EngineError::ClockOutOfRange`] if the boundary cannot be
/// represented as a calendar instant.
pub fn align_service_start(now: DateTime<Utc>, tz: Tz) -> Result<ServiceStart> {
    let now_ms = now.timestamp_millis();
    let on_boundary = now.second() == 0 && now.nanosecond() == 0;
    let utc_ms = if on_boundary {
        now_ms
    } else {
        window_start_ms(now_ms) + WINDOW_WIDTH_MS
    };

    let local = DateTime::<Utc>::from_timestamp_millis(utc_ms)
        .ok_or(EngineError::ClockOutOfRange(utc_ms))?
        .with_timezone(&tz);

    Ok(ServiceStart { utc_ms, local })
}
