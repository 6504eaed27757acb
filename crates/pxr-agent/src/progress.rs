//! Progress history and completion estimate
//!
//! Remaining-cell counts are noisy: other users paint over the template and
//! writes sometimes fail. The estimate uses a short sliding window and weights
//! each interval's rate by its duration, so a burst of closely spaced samples
//! cannot dominate.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Samples kept for the rate estimate
pub const HISTORY_CAPACITY: usize = 10;

/// One observation of the remaining mismatch count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSample {
    pub at: Instant,
    pub remaining: usize,
}

/// Sliding-window progress tracker
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    history: VecDeque<ProgressSample>,
    confirmed: u64,
    eta: Option<Instant>,
    rate_per_minute: Option<f64>,
}

impl ProgressTracker {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample, trim the window and recompute the estimate
    pub fn record(&mut self, remaining: usize, now: Instant) {
        self.history.push_back(ProgressSample { at: now, remaining });
        while self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.recompute(now);
    }

    /// Clear history, estimate and confirmed count
    pub fn reset(&mut self) {
        self.history.clear();
        self.confirmed = 0;
        self.eta = None;
        self.rate_per_minute = None;
    }

    /// Count one write the service confidently acknowledged
    #[inline]
    pub fn count_confirmed(&mut self) {
        self.confirmed += 1;
    }

    #[inline]
    #[must_use]
    pub fn confirmed(&self) -> u64 {
        self.confirmed
    }

    /// Estimated completion instant, if the count is shrinking
    #[inline]
    #[must_use]
    pub fn eta(&self) -> Option<Instant> {
        self.eta
    }

    /// Duration-weighted change in remaining cells per minute (negative while converging)
    #[inline]
    #[must_use]
    pub fn rate_per_minute(&self) -> Option<f64> {
        self.rate_per_minute
    }

    #[inline]
    #[must_use]
    pub fn history(&self) -> &VecDeque<ProgressSample> {
        &self.history
    }

    #[inline]
    #[must_use]
    pub fn latest(&self) -> Option<ProgressSample> {
        self.history.back().copied()
    }

    fn recompute(&mut self, now: Instant) {
        self.eta = None;
        self.rate_per_minute = None;

        if self.history.len() < 2 {
            return;
        }

        let mut weighted = 0.0;
        let mut total_minutes = 0.0;
        for (earlier, later) in self.history.iter().zip(self.history.iter().skip(1)) {
            let dt = later.at.saturating_duration_since(earlier.at).as_secs_f64() / 60.0;
            let rate = (later.remaining as f64 - earlier.remaining as f64) / dt;
            if !rate.is_finite() {
                continue;
            }
            weighted += rate * dt;
            total_minutes += dt;
        }

        if total_minutes <= 0.0 {
            return;
        }

        let rate = weighted / total_minutes;
        self.rate_per_minute = Some(rate);

        let remaining = self.history.back().map_or(0, |s| s.remaining);
        if rate >= 0.0 || remaining < 1 {
            return;
        }

        let minutes = remaining as f64 / rate.abs();
        self.eta = Duration::try_from_secs_f64(minutes * 60.0)
            .ok()
            .and_then(|left| now.checked_add(left));
        tracing::debug!(rate, minutes, "ETA recalculated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(n: u64) -> Duration {
        Duration::from_secs(n * 60)
    }

    #[test]
    fn single_sample_has_no_eta() {
        let mut tracker = ProgressTracker::new();
        tracker.record(100, Instant::now());
        assert_eq!(tracker.eta(), None);
    }

    #[test]
    fn growing_backlog_has_no_eta() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new();
        for (i, remaining) in [10, 12, 15, 40].into_iter().enumerate() {
            tracker.record(remaining, start + minutes(i as u64));
        }
        assert_eq!(tracker.eta(), None);
        assert!(tracker.rate_per_minute().unwrap() > 0.0);
    }

    #[test]
    fn constant_rate_predicts_analytic_eta() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new();
        // 5 cells per minute
        for step in 0..6u64 {
            tracker.record(100 - 5 * step as usize, start + minutes(step));
        }

        let now = start + minutes(5);
        let expected = now + minutes(75 / 5);
        let eta = tracker.eta().unwrap();
        let error = if eta > expected { eta - expected } else { expected - eta };
        assert!(error < Duration::from_millis(10), "off by {error:?}");
    }

    #[test]
    fn zero_interval_pairs_are_discarded() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new();
        tracker.record(50, start);
        tracker.record(40, start);
        assert_eq!(tracker.eta(), None);

        tracker.record(30, start + minutes(1));
        // only the 40 -> 30 pair over one minute counts
        assert!((tracker.rate_per_minute().unwrap() + 10.0).abs() < 1e-9);
        assert!(tracker.eta().is_some());
    }

    #[test]
    fn finished_job_has_no_eta() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new();
        tracker.record(3, start);
        tracker.record(0, start + minutes(1));
        assert_eq!(tracker.eta(), None);
    }

    #[test]
    fn history_is_capped_oldest_first() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new();
        for step in 0..25u64 {
            tracker.record(1000 - step as usize, start + minutes(step));
        }
        assert_eq!(tracker.history().len(), HISTORY_CAPACITY);
        assert_eq!(tracker.history().front().unwrap().remaining, 1000 - 15);
    }

    #[test]
    fn reset_clears_everything() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new();
        tracker.record(10, start);
        tracker.record(5, start + minutes(1));
        tracker.count_confirmed();
        tracker.reset();
        assert_eq!(tracker.confirmed(), 0);
        assert!(tracker.history().is_empty());
        assert_eq!(tracker.eta(), None);
    }
}
