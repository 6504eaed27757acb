//! Testing utilities for the Pixel Robot workspace
//!
//! Deterministic collaborators (clock, randomness, transport, notifier,
//! surface) and raster fixtures.

#![allow(missing_docs)]

use parking_lot::Mutex;
use pxr_agent::{
    Clock, Collaborators, LiveSurfaceSource, Notifier, Session, SessionConfig, SurfaceError,
    Transport, TransportError,
};
use pxr_protocol::{AuthorizedFrame, Validator};
use pxr_raster::{ColorIndex, Origin, RandomSource, Raster, Rgba, PALETTE};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// Random source replaying queued draws, then zeros
///
/// Draws are clamped into the requested range.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    draws: Arc<Mutex<VecDeque<usize>>>,
    calls: Arc<Mutex<Vec<usize>>>,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = usize>) -> Self {
        Self {
            draws: Arc::new(Mutex::new(draws.into_iter().collect())),
            calls: Arc::default(),
        }
    }

    pub fn push(&self, draw: usize) {
        self.draws.lock().push_back(draw);
    }

    /// Bounds passed to every `below` call so far
    pub fn bounds_seen(&self) -> Vec<usize> {
        self.calls.lock().clone()
    }
}

impl RandomSource for ScriptedRandom {
    fn below(&mut self, bound: usize) -> usize {
        self.calls.lock().push(bound);
        let draw = self.draws.lock().pop_front().unwrap_or(0);
        draw.min(bound.saturating_sub(1))
    }
}

/// Transport that records every frame it is handed
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    frames: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().clone()
    }

    /// Recorded frames parsed back to JSON
    pub fn values(&self) -> Vec<Value> {
        self.frames
            .lock()
            .iter()
            .map(|frame| serde_json::from_str(frame).unwrap())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    pub fn last(&self) -> Option<Value> {
        self.values().pop()
    }

    /// Make subsequent sends fail with `TransportError::Closed`
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, frame: &AuthorizedFrame) -> Result<(), TransportError> {
        if *self.failing.lock() {
            return Err(TransportError::Closed);
        }
        self.frames.lock().push(frame.as_str().to_owned());
        Ok(())
    }
}

/// Notifier that keeps every message
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.messages
            .lock()
            .iter()
            .filter(|message| message.contains(needle))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_owned());
    }
}

/// Shared in-memory surface that tests can paint on
#[derive(Debug, Clone)]
pub struct StaticSurface {
    board: Arc<Mutex<Raster>>,
    available: Arc<Mutex<bool>>,
}

impl StaticSurface {
    pub fn new(board: Raster) -> Self {
        Self {
            board: Arc::new(Mutex::new(board)),
            available: Arc::new(Mutex::new(true)),
        }
    }

    /// Blank surface of the given size, every cell palette entry 0
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(Raster::filled(width, height, palette_rgba(0)))
    }

    /// Paint one cell with a palette entry
    pub fn paint(&self, x: u32, y: u32, index: u8) {
        self.board.lock().set(x, y, palette_rgba(index));
    }

    pub fn set_available(&self, available: bool) {
        *self.available.lock() = available;
    }

    pub fn board(&self) -> Raster {
        self.board.lock().clone()
    }
}

impl LiveSurfaceSource for StaticSurface {
    fn snapshot(&self, origin: Origin, width: u32, height: u32) -> Result<Raster, SurfaceError> {
        if !*self.available.lock() {
            return Err(SurfaceError::Unavailable("board not loaded".into()));
        }
        Ok(self.board.lock().crop(origin.left, origin.top, width, height))
    }
}

/// Opaque RGBA for a palette entry, or clear for anything else
pub fn palette_rgba(index: u8) -> Rgba {
    ColorIndex::palette(index)
        .and_then(ColorIndex::color)
        .map_or(Rgba::CLEAR, |rgb| rgb.with_alpha(255))
}

/// Row-major raster from palette indices; `254` becomes a transparent pixel
pub fn raster_from_indices(width: u32, height: u32, indices: &[u8]) -> Raster {
    let pixels = indices.iter().map(|&index| palette_rgba(index)).collect();
    Raster::from_pixels(width, height, pixels).unwrap()
}

/// Every palette entry once, as a 16x1 raster
pub fn palette_strip() -> Raster {
    let indices: Vec<u8> = (0..PALETTE.len() as u8).collect();
    raster_from_indices(16, 1, &indices)
}

/// A session wired to recording doubles
pub struct Fixture {
    pub session: Session,
    pub transport: RecordingTransport,
    pub notifier: RecordingNotifier,
    pub surface: StaticSurface,
    pub clock: ManualClock,
    pub random: ScriptedRandom,
}

impl Fixture {
    /// Session over `surface` with default config and zero draws
    pub fn new(surface: StaticSurface) -> Self {
        Self::with_config(surface, SessionConfig::default(), ScriptedRandom::default())
    }

    pub fn with_config(
        surface: StaticSurface,
        config: SessionConfig,
        random: ScriptedRandom,
    ) -> Self {
        Self::with_validator(surface, config, random, Validator::default())
    }

    /// Like [`Fixture::with_config`] with a custom outbound whitelist
    pub fn with_validator(
        surface: StaticSurface,
        config: SessionConfig,
        random: ScriptedRandom,
        validator: Validator,
    ) -> Self {
        let transport = RecordingTransport::new();
        let notifier = RecordingNotifier::new();
        let clock = ManualClock::new();

        let collaborators =
            Collaborators::new(Box::new(transport.clone()), Box::new(surface.clone()))
                .with_notifier(Box::new(notifier.clone()))
                .with_clock(Arc::new(clock.clone()))
                .with_random(Box::new(random.clone()));

        Self {
            session: Session::with_validator(config, collaborators, validator),
            transport,
            notifier,
            surface,
            clock,
            random,
        }
    }

    /// Load `template` at (`left`, `top`) and start
    pub fn started(mut self, template: &Raster, left: u32, top: u32) -> Self {
        self.session.load_template(template).unwrap();
        self.session.set_origin(left, top).unwrap();
        self.session.start().unwrap();
        self
    }
}
