//! Engine configuration.

use chrono_tz::Tz;
use std::time::Duration;
use tickbar_aggregate::{AcceptancePolicy, DEFAULT_LATE_THRESHOLD_MS};
use tickbar_store::DEFAULT_TIMEZONE;

use crate::{EngineError, Result};

/// Configuration for the aggregation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Grace period after a window closes during which ticks are still
    /// accepted and before which the window cannot be flushed.
    pub late_threshold_ms: i64,
    /// Period of the flush scheduler.
    pub flush_interval: Duration,
    /// Pause after a failed flush cycle before the next one.
    pub error_backoff: Duration,
    /// Number of worker threads for bucket computation.
    pub workers: usize,
    /// Timezone for local-time labels and start-up logging.
    pub timezone: Tz,
    /// Number of bars logged per write as a preview.
    pub preview_bars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            late_threshold_ms: DEFAULT_LATE_THRESHOLD_MS,
            flush_interval: Duration::from_secs(1),
            error_backoff: Duration::from_secs(2),
            workers: 4,
            timezone: DEFAULT_TIMEZONE,
            preview_bars: 5,
        }
    }
}

impl EngineConfig {
    /// Sets the late threshold.
    #[must_use]
    pub const fn with_late_threshold_ms(mut self, late_threshold_ms: i64) -> Self {
        self.late_threshold_ms = late_threshold_ms;
        self
    }

    /// Sets the flush period.
    #[must_use]
    pub const fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    /// Sets the worker count. Zero is treated as one.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the local timezone.
    #[must_use]
    pub const fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Sets the local timezone from an IANA name such as `Asia/Kolkata`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Timezone`] if the name is unknown.
    pub fn with_timezone_name(self, name: &str) -> Result<Self> {
        let timezone = name
            .parse::<Tz>()
            .map_err(|_| EngineError::Timezone(name.to_string()))?;
        Ok(self.with_timezone(timezone))
    }

    /// Sets the pause after a failed flush cycle.
    #[must_use]
    pub const fn with_error_backoff(mut self, error_backoff: Duration) -> Self {
        self.error_backoff = error_backoff;
        self
    }

    /// Checks that the configuration can drive an engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the flush interval is zero
    /// or the late threshold is negative.
    pub fn validate(&self) -> Result<()> {
        if self.flush_interval.is_zero() {
            return Err(EngineError::InvalidConfig(
                "flush interval must be non-zero".to_string(),
            ));
        }
        if self.late_threshold_ms < 0 {
            return Err(EngineError::InvalidConfig(format!(
                "late threshold must not be negative, got {}ms",
                self.late_threshold_ms
            )));
        }
        Ok(())
    }

    /// Returns the acceptance policy for this configuration.
    #[must_use]
    pub const fn policy(&self) -> AcceptancePolicy {
        AcceptancePolicy::new(self.late_threshold_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.late_threshold_ms, 5_000);
        assert_eq!(config.flush_interval, Duration::from_secs(1));
        assert_eq!(config.error_backoff, Duration::from_secs(2));
        assert_eq!(config.workers, 4);
        assert_eq!(config.timezone, chrono_tz::Asia::Kolkata);
        assert_eq!(config.policy().late_threshold_ms(), 5_000);
    }

    #[test]
    fn test_validate() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(matches!(
            EngineConfig::default()
                .with_flush_interval(Duration::ZERO)
                .validate(),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::default()
                .with_late_threshold_ms(-1)
                .validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_timezone_name() {
        let config = EngineConfig::default()
            .with_timezone_name("America/New_York")
            .unwrap();
        assert_eq!(config.timezone, chrono_tz::America::New_York);

        assert!(matches!(
            EngineConfig::default().with_timezone_name("Mars/Olympus"),
            Err(EngineError::Timezone(_))
        ));
    }
}
