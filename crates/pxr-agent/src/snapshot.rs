//! Read-only view of a session for presentation layers

use crate::state::SchedulerState;
use pxr_raster::{BoundingBox, PendingWrite};
use std::time::{Duration, Instant};

/// Point-in-time copy of everything an operator panel shows
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SchedulerState,
    /// Non-transparent template cells
    pub template_cells: usize,
    /// Mismatches found by the latest comparison
    pub remaining: Option<usize>,
    pub cooldown_remaining: Option<Duration>,
    /// Writes the service confidently acknowledged
    pub confirmed: u64,
    pub eta: Option<Instant>,
    pub pending: Option<PendingWrite>,
    pub bounds: Option<BoundingBox>,
    /// Frames handed to the transport
    pub sent: u64,
    /// Frames refused by the whitelist
    pub censored: u64,
    pub taken_at: Instant,
}

impl SessionSnapshot {
    /// Share of template cells already correct, `0.0..=100.0`
    #[must_use]
    pub fn progress_percent(&self) -> Option<f64> {
        let remaining = self.remaining?;
        if self.template_cells == 0 {
            return None;
        }
        let done = 1.0 - remaining as f64 / self.template_cells as f64;
        Some((done * 100.0).clamp(0.0, 100.0))
    }

    /// Time left until the estimated completion
    #[must_use]
    pub fn eta_in(&self) -> Option<Duration> {
        self.eta.map(|eta| eta.saturating_duration_since(self.taken_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(template_cells: usize, remaining: Option<usize>) -> SessionSnapshot {
        SessionSnapshot {
            state: SchedulerState::Ready,
            template_cells,
            remaining,
            cooldown_remaining: None,
            confirmed: 0,
            eta: None,
            pending: None,
            bounds: None,
            sent: 0,
            censored: 0,
            taken_at: Instant::now(),
        }
    }

    #[test]
    fn progress_is_share_of_correct_cells() {
        assert_eq!(snapshot(200, Some(50)).progress_percent(), Some(75.0));
        assert_eq!(snapshot(200, None).progress_percent(), None);
        assert_eq!(snapshot(0, Some(0)).progress_percent(), None);
    }
}
