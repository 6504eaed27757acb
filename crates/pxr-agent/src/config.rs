//! Session tunables

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session configuration
///
/// Every field has a default, so a partial TOML table is enough:
///
/// ```toml
/// tick_period_ms = 500
/// confidence_threshold_secs = 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Scheduler tick period in milliseconds
    pub tick_period_ms: u64,
    /// Age after which an unacknowledged write is abandoned
    pub pending_timeout_secs: u64,
    /// Cooldown assumed right after a send, until the service reports its own
    pub provisional_cooldown_secs: u64,
    /// Lower bound applied to any service-reported wait
    pub min_cooldown_secs: u64,
    /// Random extra seconds added to each cooldown, drawn from `0..jitter_max_secs`
    pub jitter_max_secs: u64,
    /// Reported waits above this mean the last write landed
    pub confidence_threshold_secs: f64,
    /// While waiting on a captcha, remind the operator every this many ticks
    pub captcha_reminder_ticks: u32,
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_confidence_threshold(mut self, secs: f64) -> Self {
        self.confidence_threshold_secs = secs;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_jitter_max(mut self, secs: u64) -> Self {
        self.jitter_max_secs = secs;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_pending_timeout(mut self, secs: u64) -> Self {
        self.pending_timeout_secs = secs;
        self
    }

    #[inline]
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.max(1))
    }

    #[inline]
    #[must_use]
    pub fn pending_timeout(&self) -> Duration {
        Duration::from_secs(self.pending_timeout_secs)
    }

    #[inline]
    #[must_use]
    pub fn provisional_cooldown(&self) -> Duration {
        Duration::from_secs(self.provisional_cooldown_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 1000,
            pending_timeout_secs: 30,
            provisional_cooldown_secs: 60,
            min_cooldown_secs: 15,
            jitter_max_secs: 10,
            confidence_threshold_secs: 120.0,
            captcha_reminder_ticks: 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_tables_fill_from_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"confidence_threshold_secs": 100.0}"#).unwrap();
        assert!((config.confidence_threshold_secs - 100.0).abs() < f64::EPSILON);
        assert_eq!(config.pending_timeout(), Duration::from_secs(30));
        assert_eq!(config.tick_period(), Duration::from_secs(1));
    }

    #[test]
    fn zero_tick_period_is_clamped() {
        let config = SessionConfig::new().with_tick_period(Duration::ZERO);
        assert_eq!(config.tick_period(), Duration::from_millis(1));
    }
}
