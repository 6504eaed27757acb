//! Scheduler states
//!
//! Internally the session tracks a coarse [`Phase`] plus a cooldown deadline;
//! the public [`SchedulerState`] is derived from both at a given instant, so a
//! cooldown that elapses between ticks turns into `Ready` without any event.

use std::fmt;
use std::time::Instant;

/// Observable scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No writes are issued
    Stopped,
    /// The next tick may pick and send a write
    Ready,
    /// Service-imposed (or provisional) cooldown until `deadline`
    CooldownWait { deadline: Instant },
    /// Waiting for a human to solve a captcha
    CaptchaWait,
}

impl SchedulerState {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Ready => "ready",
            Self::CooldownWait { .. } => "cooldown",
            Self::CaptchaWait => "captcha",
        }
    }

    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse lifecycle position, independent of time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Stopped,
    Running,
    Captcha,
}

impl Phase {
    pub(crate) fn resolve(self, cooldown_until: Option<Instant>, now: Instant) -> SchedulerState {
        match self {
            Self::Stopped => SchedulerState::Stopped,
            Self::Captcha => SchedulerState::CaptchaWait,
            Self::Running => match cooldown_until {
                Some(deadline) if now <= deadline => SchedulerState::CooldownWait { deadline },
                _ => SchedulerState::Ready,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cooldown_holds_through_its_deadline() {
        let now = Instant::now();
        let deadline = now + Duration::from_secs(5);
        assert_eq!(
            Phase::Running.resolve(Some(deadline), now),
            SchedulerState::CooldownWait { deadline }
        );
        assert_eq!(
            Phase::Running.resolve(Some(deadline), deadline),
            SchedulerState::CooldownWait { deadline }
        );
        assert_eq!(
            Phase::Running.resolve(Some(deadline), deadline + Duration::from_millis(1)),
            SchedulerState::Ready
        );
    }

    #[test]
    fn stopped_and_captcha_ignore_cooldown() {
        let now = Instant::now();
        let deadline = Some(now + Duration::from_secs(60));
        assert_eq!(Phase::Stopped.resolve(deadline, now), SchedulerState::Stopped);
        assert_eq!(Phase::Captcha.resolve(deadline, now), SchedulerState::CaptchaWait);
        assert!(!SchedulerState::Stopped.is_running());
        assert_eq!(SchedulerState::CaptchaWait.to_string(), "captcha");
    }
}
