//! Collaborator interfaces
//!
//! The session owns no sockets, timers or UI. Everything outside the core
//! algorithms comes in through these traits so it can be swapped for
//! deterministic doubles under test.

use crate::error::{SurfaceError, TransportError};
use pxr_protocol::AuthorizedFrame;
use pxr_raster::{Origin, RandomSource, Raster, SeededRandom};
use std::sync::Arc;
use std::time::Instant;

/// Outbound half of the service connection
///
/// Takes an [`AuthorizedFrame`], so only whitelisted text can reach it.
pub trait Transport: Send {
    /// Fire-and-forget delivery; the outcome arrives later as inbound events
    ///
    /// # Errors
    /// `TransportError` when the frame could not be handed off.
    fn send(&mut self, frame: &AuthorizedFrame) -> Result<(), TransportError>;
}

/// Read access to the service's live surface
pub trait LiveSurfaceSource: Send {
    /// RGBA copy of the `width` x `height` region starting at `origin`
    ///
    /// # Errors
    /// `SurfaceError` when the surface cannot be sampled right now.
    fn snapshot(&self, origin: Origin, width: u32, height: u32) -> Result<Raster, SurfaceError>;
}

/// Best-effort operator alerts
pub trait Notifier: Send {
    fn notify(&self, message: &str);
}

/// Monotonic time
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock backed [`Clock`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// [`Clock`] that follows tokio's timer, including paused test time
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// [`Notifier`] that writes alerts to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(target: "pxr::notify", "{message}");
    }
}

/// Everything a [`Session`](crate::Session) talks to
pub struct Collaborators {
    pub transport: Box<dyn Transport>,
    pub surface: Box<dyn LiveSurfaceSource>,
    pub notifier: Box<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub random: Box<dyn RandomSource>,
}

impl Collaborators {
    /// Transport and surface with log notifications, system time and entropy-seeded randomness
    #[must_use]
    pub fn new(transport: Box<dyn Transport>, surface: Box<dyn LiveSurfaceSource>) -> Self {
        Self {
            transport,
            surface,
            notifier: Box::new(TracingNotifier),
            clock: Arc::new(SystemClock),
            random: Box::new(SeededRandom::from_entropy()),
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_random(mut self, random: Box<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
