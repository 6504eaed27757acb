//! The robot session
//!
//! One owned object holds all mutable state: scheduler phase, cooldown
//! deadline, the single in-flight write, the cached template and the progress
//! history. It is driven by two kinds of input, periodic [`Session::tick`]
//! calls and inbound protocol events, which callers must deliver one at a time.
//!
//! Every outbound payload goes through the [`GuardedTransport`]. A payload the
//! whitelist refuses stops the session on the spot.

use crate::collab::{Clock, Collaborators, LiveSurfaceSource, Notifier};
use crate::config::SessionConfig;
use crate::error::{ConfigError, SurfaceError};
use crate::guard::{GuardedTransport, SendError};
use crate::progress::ProgressTracker;
use crate::snapshot::SessionSnapshot;
use crate::state::{Phase, SchedulerState};
use pxr_protocol::{InboundEvent, OutgoingCommand, Validator};
use pxr_raster::{
    diff, pick, BoundingBox, ImageSource, IndexedImage, MismatchSet, Origin, PendingWrite,
    Quantizer, RandomSource,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

// Longest cooldown honoured from a single rate-limit report.
const MAX_COOLDOWN_SECS: f64 = 86_400.0;

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session is stopped
    Idle,
    /// Waiting on a captcha
    AwaitingChallenge,
    /// Cooldown still running
    CoolingDown { remaining: Duration },
    /// A write is in flight and has not timed out
    InFlight(PendingWrite),
    /// Nothing left to paint
    Complete,
    /// A new write was sent
    Sent(PendingWrite),
    /// The whitelist refused the write; the session stopped
    Rejected,
    /// The transport failed; the next tick re-evaluates
    SendFailed,
    /// Live surface could not be sampled
    SurfaceUnavailable,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    write: PendingWrite,
    issued_at: Instant,
}

/// Robot session
pub struct Session {
    config: SessionConfig,
    quantizer: Arc<Quantizer>,
    outbound: GuardedTransport,
    surface: Box<dyn LiveSurfaceSource>,
    notifier: Box<dyn Notifier>,
    clock: Arc<dyn Clock>,
    random: Box<dyn RandomSource>,
    template: Option<Arc<IndexedImage>>,
    origin: Origin,
    bounds: Option<BoundingBox>,
    phase: Phase,
    cooldown_until: Option<Instant>,
    // Cooldown assumed after a send rather than reported by the service
    cooldown_provisional: bool,
    pending: Option<InFlight>,
    progress: ProgressTracker,
    remaining: Option<usize>,
    captcha_ticks: u32,
}

impl Session {
    /// Create a stopped session with the default whitelist
    #[must_use]
    pub fn new(config: SessionConfig, collaborators: Collaborators) -> Self {
        Self::with_validator(config, collaborators, Validator::default())
    }

    /// Create a stopped session with a custom whitelist
    #[must_use]
    pub fn with_validator(
        config: SessionConfig,
        collaborators: Collaborators,
        validator: Validator,
    ) -> Self {
        let Collaborators {
            transport,
            surface,
            notifier,
            clock,
            random,
        } = collaborators;

        Self {
            config,
            quantizer: Arc::new(Quantizer::new()),
            outbound: GuardedTransport::new(validator, transport),
            surface,
            notifier,
            clock,
            random,
            template: None,
            origin: Origin::default(),
            bounds: None,
            phase: Phase::Stopped,
            cooldown_until: None,
            cooldown_provisional: false,
            pending: None,
            progress: ProgressTracker::new(),
            remaining: None,
            captcha_ticks: 0,
        }
    }

    // ---------------------------------------------------------------------
    // Operator configuration

    /// Quantize and cache a new template
    ///
    /// # Errors
    /// `ConfigError::SessionRunning` unless the session is stopped.
    pub fn load_template(&mut self, source: &dyn ImageSource) -> Result<(), ConfigError> {
        self.ensure_stopped()?;

        let indexed = self.quantizer.index_image(source, true);
        tracing::info!(
            width = indexed.width(),
            height = indexed.height(),
            opaque = indexed.opaque_cells(),
            "template loaded"
        );

        self.template = Some(Arc::new(indexed));
        self.bounds = None;
        self.remaining = None;
        Ok(())
    }

    /// Place the template's top-left corner on the surface
    ///
    /// # Errors
    /// `ConfigError::SessionRunning` unless the session is stopped.
    pub fn set_origin(&mut self, left: u32, top: u32) -> Result<(), ConfigError> {
        self.ensure_stopped()?;
        self.origin = Origin::new(left, top);
        self.bounds = None;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Lifecycle

    /// Validate configuration, reset progress and begin issuing writes
    ///
    /// A cooldown reported by the service before the start is still honoured.
    ///
    /// # Errors
    /// `ConfigError::MissingTemplate` or `ConfigError::InvalidBoundings`.
    pub fn start(&mut self) -> Result<(), ConfigError> {
        let bounds = self.assure_configured("refusing to start")?;
        self.phase = Phase::Running;
        self.captcha_ticks = 0;

        tracing::info!(
            left = bounds.left(),
            top = bounds.top(),
            right = bounds.right(),
            bottom = bounds.bottom(),
            "robot started"
        );
        Ok(())
    }

    /// Stop issuing writes
    ///
    /// A write already handed to the transport stays pending and still
    /// resolves through its acknowledgment or timeout.
    pub fn stop(&mut self) {
        if self.phase != Phase::Stopped {
            tracing::info!("robot stopped");
        }
        self.phase = Phase::Stopped;
    }

    /// Tear down, returning the final state
    #[must_use]
    pub fn dispose(self) -> SessionSnapshot {
        let snapshot = self.snapshot();
        tracing::info!(
            confirmed = snapshot.confirmed,
            sent = snapshot.sent,
            censored = snapshot.censored,
            "session disposed"
        );
        snapshot
    }

    // ---------------------------------------------------------------------
    // Scheduling

    /// Advance the scheduler by one period
    pub fn tick(&mut self) -> TickOutcome {
        let now = self.clock.now();
        match self.phase {
            Phase::Stopped => TickOutcome::Idle,
            Phase::Captcha => {
                self.remind_captcha();
                TickOutcome::AwaitingChallenge
            }
            Phase::Running => match self.cooldown_until {
                Some(deadline) if now <= deadline => TickOutcome::CoolingDown {
                    remaining: deadline.saturating_duration_since(now),
                },
                _ => self.paint(now),
            },
        }
    }

    /// Drop any pending write and paint a fresh candidate right away
    ///
    /// Ignores cooldown, captcha and stopped state; the service decides
    /// whether to accept it. Progress history restarts as with [`Session::start`],
    /// and configuration errors reach the notifier.
    ///
    /// # Errors
    /// `ConfigError::MissingTemplate` or `ConfigError::InvalidBoundings`.
    pub fn force_pick(&mut self) -> Result<TickOutcome, ConfigError> {
        self.assure_configured("refusing to paint")?;
        self.pending = None;

        let now = self.clock.now();
        Ok(self.paint(now))
    }

    /// Resolve the bounding box, reset progress and tell the operator on failure
    fn assure_configured(&mut self, context: &str) -> Result<BoundingBox, ConfigError> {
        match self.resolve_bounds() {
            Ok(bounds) => {
                self.bounds = Some(bounds);
                self.progress.reset();
                Ok(bounds)
            }
            Err(err) => {
                tracing::warn!(%err, origin = ?self.origin, "{context}");
                self.notifier.notify(&err.to_string());
                Err(err)
            }
        }
    }

    fn paint(&mut self, now: Instant) -> TickOutcome {
        if let Some(in_flight) = self.pending {
            if now.saturating_duration_since(in_flight.issued_at) < self.config.pending_timeout() {
                return TickOutcome::InFlight(in_flight.write);
            }
            tracing::info!(
                x = in_flight.write.target_x,
                y = in_flight.write.target_y,
                "pending write timed out, picking again"
            );
        }

        let (template, bounds) = match (self.template.clone(), self.bounds) {
            (Some(template), Some(bounds)) => (template, bounds),
            _ => return TickOutcome::Idle,
        };

        let mismatch = match self.compare(&template, &bounds, now) {
            Ok(mismatch) => mismatch,
            Err(err) => {
                tracing::warn!(%err, "live surface unavailable, skipping tick");
                return TickOutcome::SurfaceUnavailable;
            }
        };

        let Some(write) = pick(&template, &mismatch, &bounds, self.random.as_mut()) else {
            self.pending = None;
            return TickOutcome::Complete;
        };

        self.pending = Some(InFlight {
            write,
            issued_at: now,
        });

        match self.dispatch(&OutgoingCommand::from_write(&write).to_value()) {
            Ok(()) => {
                self.cooldown_until = Some(now + self.config.provisional_cooldown());
                self.cooldown_provisional = true;
                tracing::info!(
                    color = %write.color,
                    x = write.target_x,
                    y = write.target_y,
                    source_x = write.source_x,
                    source_y = write.source_y,
                    "paint"
                );
                TickOutcome::Sent(write)
            }
            Err(err) => {
                // never reached the service, so nothing is in flight
                self.pending = None;
                match err {
                    SendError::Rejected(_) => TickOutcome::Rejected,
                    SendError::Transport(_) => TickOutcome::SendFailed,
                }
            }
        }
    }

    /// Sample the live region, diff it and record progress
    fn compare(
        &mut self,
        template: &IndexedImage,
        bounds: &BoundingBox,
        now: Instant,
    ) -> Result<MismatchSet, SurfaceError> {
        let raster = self
            .surface
            .snapshot(bounds.origin(), bounds.width(), bounds.height())?;

        if raster.width() != bounds.width() || raster.height() != bounds.height() {
            return Err(SurfaceError::WrongExtent {
                width: bounds.width(),
                height: bounds.height(),
                actual_width: raster.width(),
                actual_height: raster.height(),
            });
        }

        let snapshot = self.quantizer.index_image(&raster, false);
        let mismatch = diff(template, &snapshot)
            .map_err(|err| SurfaceError::Unavailable(err.to_string()))?;

        self.remaining = Some(mismatch.count());
        self.progress.record(mismatch.count(), now);
        Ok(mismatch)
    }

    // ---------------------------------------------------------------------
    // Inbound protocol

    /// Parse and apply one inbound text frame; unreadable frames are dropped
    pub fn handle_frame(&mut self, frame: &str) {
        match InboundEvent::parse(frame) {
            Ok(event) => self.handle_event(event),
            Err(err) => tracing::debug!(%err, frame, "ignoring unreadable inbound frame"),
        }
    }

    /// Apply one inbound protocol event
    pub fn handle_event(&mut self, event: InboundEvent) {
        let now = self.clock.now();
        match event {
            InboundEvent::ChallengeRequired => self.on_challenge_required(),
            InboundEvent::ChallengeStatus { success } => self.on_challenge_status(success, now),
            InboundEvent::RateLimit { wait } => self.on_rate_limit(wait, now),
            InboundEvent::Other { kind } => {
                tracing::debug!(kind, "ignoring inbound message");
            }
        }
    }

    fn on_challenge_required(&mut self) {
        if self.phase == Phase::Stopped {
            tracing::debug!("captcha requested while stopped");
            return;
        }

        tracing::info!("captcha challenged, pausing");
        self.phase = Phase::Captcha;
        // The service answered with a challenge, not a cooldown
        if self.cooldown_provisional {
            self.cooldown_until = None;
            self.cooldown_provisional = false;
        }
        self.captcha_ticks = 0;
        self.notifier.notify(
            "The drawing service is asking whether you are human. Robot paused, please solve the captcha.",
        );
    }

    fn on_challenge_status(&mut self, success: bool, now: Instant) {
        if self.phase == Phase::Stopped {
            tracing::debug!(success, "captcha status while stopped");
            return;
        }
        self.phase = Phase::Running;

        if !success {
            tracing::info!("captcha failed");
            self.notifier
                .notify("Captcha failed. Solve it again or reload the page.");
            return;
        }

        tracing::info!("captcha passed, continuing");
        self.notifier.notify("Captcha passed. Continuing the job.");
        self.resend_pending(now);
    }

    /// Re-issue the in-flight write unchanged, without picking
    fn resend_pending(&mut self, now: Instant) {
        let Some(in_flight) = self.pending else {
            return;
        };

        self.pending = Some(InFlight {
            write: in_flight.write,
            issued_at: now,
        });

        match self.dispatch(&OutgoingCommand::from_write(&in_flight.write).to_value()) {
            Ok(()) => tracing::info!(
                x = in_flight.write.target_x,
                y = in_flight.write.target_y,
                "resent pending write"
            ),
            Err(SendError::Rejected(_) | SendError::Transport(_)) => self.pending = None,
        }
    }

    fn on_rate_limit(&mut self, wait: f64, now: Instant) {
        let floor = wait.max(self.config.min_cooldown_secs as f64);
        let jitter = match usize::try_from(self.config.jitter_max_secs) {
            Ok(0) | Err(_) => 0,
            Ok(bound) => self.random.below(bound),
        };
        let seconds = (floor + jitter as f64).min(MAX_COOLDOWN_SECS);
        self.cooldown_until = Some(now + Duration::from_secs_f64(seconds));
        self.cooldown_provisional = false;

        let cleared = self.pending.take();
        let confirmed = cleared.is_some() && wait > self.config.confidence_threshold_secs;
        if confirmed {
            self.progress.count_confirmed();
        }

        tracing::info!(wait, seconds, confirmed, "cooldown active");
    }

    // ---------------------------------------------------------------------
    // Outbound

    /// Send the operator's captcha answer
    ///
    /// # Errors
    /// `SendError::Rejected` (the session is now stopped) or
    /// `SendError::Transport`.
    pub fn submit_challenge(&mut self, token: &str) -> Result<(), SendError> {
        self.dispatch(&OutgoingCommand::challenge(token).to_value())
    }

    /// Pass any other outbound payload through the whitelist
    ///
    /// # Errors
    /// `SendError::Rejected` (the session is now stopped) or
    /// `SendError::Transport`.
    pub fn forward(&mut self, payload: &Value) -> Result<(), SendError> {
        self.dispatch(payload)
    }

    fn dispatch(&mut self, payload: &Value) -> Result<(), SendError> {
        let result = self.outbound.send_value(payload);
        match &result {
            Ok(()) => {}
            Err(SendError::Rejected(err)) => {
                self.phase = Phase::Stopped;
                tracing::error!(payload = err.payload(), "outbound frame refused, robot stopped");
                self.notifier.notify(&format!(
                    "WARNING! The robot tried to send an unrecognized message and was stopped for your safety. Please report: {}",
                    err.payload()
                ));
            }
            Err(SendError::Transport(err)) => {
                tracing::warn!(%err, "send failed");
                self.notifier
                    .notify(&format!("Could not reach the drawing service: {err}"));
            }
        }
        result
    }

    // ---------------------------------------------------------------------
    // Queries

    /// Scheduler state as of now
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.phase.resolve(self.cooldown_until, self.clock.now())
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let now = self.clock.now();
        SessionSnapshot {
            state: self.phase.resolve(self.cooldown_until, now),
            template_cells: self.template.as_ref().map_or(0, |t| t.opaque_cells()),
            remaining: self.remaining,
            cooldown_remaining: self
                .cooldown_until
                .filter(|deadline| now < *deadline)
                .map(|deadline| deadline - now),
            confirmed: self.progress.confirmed(),
            eta: self.progress.eta(),
            pending: self.pending(),
            bounds: self.bounds,
            sent: self.outbound.sent(),
            censored: self.outbound.censored(),
            taken_at: now,
        }
    }

    #[inline]
    #[must_use]
    pub fn pending(&self) -> Option<PendingWrite> {
        self.pending.map(|in_flight| in_flight.write)
    }

    #[inline]
    #[must_use]
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn template(&self) -> Option<&IndexedImage> {
        self.template.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Shared handle to the quantization cache
    #[inline]
    #[must_use]
    pub fn quantizer(&self) -> Arc<Quantizer> {
        Arc::clone(&self.quantizer)
    }

    // ---------------------------------------------------------------------
    // Helpers

    fn ensure_stopped(&self) -> Result<(), ConfigError> {
        if self.phase == Phase::Stopped {
            Ok(())
        } else {
            Err(ConfigError::SessionRunning)
        }
    }

    fn resolve_bounds(&self) -> Result<BoundingBox, ConfigError> {
        let template = self.template.as_ref().ok_or(ConfigError::MissingTemplate)?;
        BoundingBox::new(self.origin, template.width(), template.height())
            .map_err(|_| ConfigError::InvalidBoundings)
    }

    fn remind_captcha(&mut self) {
        self.captcha_ticks = self.captcha_ticks.saturating_add(1);
        let every = self.config.captcha_reminder_ticks;
        if every > 0 && self.captcha_ticks % every == 0 {
            self.notifier
                .notify("The drawing service needs your interaction!");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.phase)
            .field("origin", &self.origin)
            .field("bounds", &self.bounds)
            .field("pending", &self.pending)
            .field("cooldown_until", &self.cooldown_until)
            .finish_non_exhaustive()
    }
}
