//! In-process drawing service for exercising a [`Session`] end to end
//!
//! The service keeps a shared board, enforces its own cooldown, answers every
//! placement with a `rate_limit` report, now and then demands a captcha and
//! lets random griefers paint over the template. Time is simulated: the loop
//! advances a manual clock by one tick period per step, so a day of painting
//! runs in milliseconds and every run is reproducible from its seed.

use parking_lot::Mutex;
use pxr_agent::{
    Clock, Collaborators, LiveSurfaceSource, Notifier, SchedulerState, Session, SessionConfig,
    SurfaceError, TickOutcome, Transport, TransportError,
};
use pxr_protocol::{AuthorizedFrame, OutgoingCommand};
use pxr_raster::{ColorIndex, ImageSource, Origin, Raster, SeededRandom, PALETTE, PALETTE_SIZE};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Characters the service uses for challenge tokens
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Upper bound on scheduler ticks
    pub max_ticks: u64,
    /// Board edge length
    pub board_size: u32,
    /// Template placement
    pub origin: Origin,
    /// Cooldown the service imposes after an accepted write
    pub service_cooldown_secs: f64,
    /// Chance that a placement triggers a captcha instead
    pub captcha_probability: f64,
    /// Ticks the simulated operator needs to solve a captcha
    pub captcha_solve_ticks: u32,
    /// Chance per tick that someone paints a random cell in the template area
    pub grief_probability: f64,
    /// Stop as soon as the template is complete
    pub stop_when_complete: bool,
    pub session: SessionConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_ticks: 100_000,
            board_size: 64,
            origin: Origin::new(8, 8),
            service_cooldown_secs: 180.0,
            captcha_probability: 0.02,
            captcha_solve_ticks: 20,
            grief_probability: 0.001,
            stop_when_complete: true,
            session: SessionConfig::default(),
        }
    }
}

/// Counters collected by the simulated service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Placements that changed the board
    pub accepted: u64,
    /// Placements refused because the service cooldown was running
    pub throttled: u64,
    /// Captchas demanded
    pub captchas: u64,
    /// Captcha answers received
    pub challenges_answered: u64,
    /// Cells painted over by griefers
    pub griefed: u64,
    /// Frames that matched no known command
    pub unknown_frames: u64,
}

/// Final report from simulator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorReport {
    pub seed: u64,
    pub ticks: u64,
    pub simulated_secs: u64,
    pub completed: bool,
    pub final_state: String,
    pub template_cells: usize,
    pub remaining: Option<usize>,
    pub progress_percent: Option<f64>,
    pub confirmed: u64,
    pub sent: u64,
    pub censored: u64,
    pub notifications: usize,
    pub service: ServiceStats,
}

impl SimulatorReport {
    /// Check if the run ended with the template fully painted
    #[must_use]
    pub fn passed(&self) -> bool {
        self.completed && self.censored == 0
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Pixel Robot Simulation ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.seed));
        report.push_str(&format!(
            "Ticks: {} ({} simulated seconds)\n",
            self.ticks, self.simulated_secs
        ));
        report.push_str(&format!("Final State: {}\n", self.final_state));
        report.push_str(&format!("Template Cells: {}\n", self.template_cells));
        match (self.remaining, self.progress_percent) {
            (Some(remaining), Some(percent)) => report.push_str(&format!(
                "Remaining: {remaining} ({percent:.1}% done)\n"
            )),
            _ => report.push_str("Remaining: unknown\n"),
        }
        report.push_str(&format!("Frames Sent: {}\n", self.sent));
        report.push_str(&format!("Frames Censored: {}\n", self.censored));
        report.push_str(&format!("Confirmed Writes: {}\n", self.confirmed));
        report.push_str(&format!("Notifications: {}\n", self.notifications));

        report.push_str("\n=== Service ===\n");
        report.push_str(&format!("Accepted: {}\n", self.service.accepted));
        report.push_str(&format!("Throttled: {}\n", self.service.throttled));
        report.push_str(&format!("Captchas: {}\n", self.service.captchas));
        report.push_str(&format!("Griefed Cells: {}\n", self.service.griefed));

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "COMPLETE" } else { "INCOMPLETE" }
        ));

        report
    }
}

/// Manually advanced clock shared by the service and the session
#[derive(Debug, Clone)]
pub struct SimClock {
    now: Arc<Mutex<Instant>>,
}

impl SimClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move time forward; stays put if the platform clock would overflow
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        if let Some(next) = now.checked_add(by) {
            *now = next;
        }
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

struct ServiceState {
    board: Raster,
    rng: StdRng,
    ready_at: Option<Instant>,
    captcha_pending: bool,
    inbound: VecDeque<String>,
    stats: ServiceStats,
}

/// The simulated drawing service
#[derive(Clone)]
pub struct SimulatedService {
    state: Arc<Mutex<ServiceState>>,
    clock: SimClock,
    cooldown: Duration,
    captcha_probability: f64,
}

impl SimulatedService {
    /// Blank board with palette entry 0 everywhere
    #[must_use]
    pub fn new(config: &SimulatorConfig, clock: SimClock) -> Self {
        let blank = PALETTE[0].with_alpha(255);
        let state = ServiceState {
            board: Raster::filled(config.board_size, config.board_size, blank),
            rng: StdRng::seed_from_u64(config.seed ^ 0x5eed_5eed),
            ready_at: None,
            captcha_pending: false,
            inbound: VecDeque::new(),
            stats: ServiceStats::default(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            clock,
            cooldown: Duration::try_from_secs_f64(config.service_cooldown_secs).unwrap_or_default(),
            captcha_probability: config.captcha_probability.clamp(0.0, 1.0),
        }
    }

    /// Frames the service pushed since the last drain
    pub fn drain_inbound(&self) -> Vec<String> {
        self.state.lock().inbound.drain(..).collect()
    }

    /// Paint one random cell of the `width` x `height` area at `origin`
    pub fn grief(&self, origin: Origin, width: u32, height: u32) {
        let mut state = self.state.lock();
        let x = origin.left + state.rng.gen_range(0..width);
        let y = origin.top + state.rng.gen_range(0..height);
        let index = state.rng.gen_range(0..PALETTE_SIZE);
        let color = PALETTE[index].with_alpha(255);
        if state.board.set(x, y, color) {
            state.stats.griefed += 1;
        }
    }

    /// Random challenge token in the accepted charset
    pub fn issue_token(&self) -> String {
        let mut state = self.state.lock();
        let len = state.rng.gen_range(300..=400);
        (0..len)
            .map(|_| {
                let i = state.rng.gen_range(0..TOKEN_ALPHABET.len());
                char::from(TOKEN_ALPHABET[i])
            })
            .collect()
    }

    #[must_use]
    pub fn board(&self) -> Raster {
        self.state.lock().board.clone()
    }

    #[must_use]
    pub fn stats(&self) -> ServiceStats {
        self.state.lock().stats.clone()
    }

    /// Transport half handed to the session
    #[must_use]
    pub fn transport(&self) -> Box<dyn Transport> {
        Box::new(self.clone())
    }

    /// Surface half handed to the session
    #[must_use]
    pub fn surface(&self) -> Box<dyn LiveSurfaceSource> {
        Box::new(self.clone())
    }

    fn receive(&self, frame: &str) {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let command: OutgoingCommand = match serde_json::from_str(frame) {
            Ok(command) => command,
            Err(err) => {
                tracing::debug!(%err, frame, "service ignored frame");
                state.stats.unknown_frames += 1;
                return;
            }
        };

        match command {
            OutgoingCommand::PlaceCell { x, y, color } => {
                self.place(&mut state, now, x, y, color);
            }
            OutgoingCommand::SubmitChallenge { .. } => {
                state.stats.challenges_answered += 1;
                if state.captcha_pending {
                    state.captcha_pending = false;
                    push(&mut state, json!({"type": "challenge_status", "success": true}));
                }
            }
        }
    }

    fn place(&self, state: &mut ServiceState, now: Instant, x: u32, y: u32, color: u8) {
        if state.captcha_pending || state.rng.gen_bool(self.captcha_probability) {
            state.captcha_pending = true;
            state.stats.captchas += 1;
            push(state, json!({"type": "challenge_required"}));
            return;
        }

        if let Some(ready_at) = state.ready_at.filter(|ready_at| now < *ready_at) {
            state.stats.throttled += 1;
            let wait = (ready_at - now).as_secs_f64();
            push(state, json!({"type": "rate_limit", "wait": wait}));
            return;
        }

        let painted = ColorIndex::palette(color)
            .and_then(ColorIndex::color)
            .is_some_and(|rgb| state.board.set(x, y, rgb.with_alpha(255)));
        if painted {
            state.stats.accepted += 1;
        }

        state.ready_at = Some(now + self.cooldown);
        push(
            state,
            json!({"type": "rate_limit", "wait": self.cooldown.as_secs_f64()}),
        );
    }
}

fn push(state: &mut ServiceState, message: serde_json::Value) {
    state.inbound.push_back(message.to_string());
}

impl Transport for SimulatedService {
    fn send(&mut self, frame: &AuthorizedFrame) -> Result<(), TransportError> {
        self.receive(frame.as_str());
        Ok(())
    }
}

impl LiveSurfaceSource for SimulatedService {
    fn snapshot(&self, origin: Origin, width: u32, height: u32) -> Result<Raster, SurfaceError> {
        Ok(self
            .state
            .lock()
            .board
            .crop(origin.left, origin.top, width, height))
    }
}

impl std::fmt::Debug for SimulatedService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedService")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Notifier that counts alerts and forwards them to the log
#[derive(Debug, Clone, Default)]
struct CountingNotifier {
    count: Arc<Mutex<usize>>,
}

impl Notifier for CountingNotifier {
    fn notify(&self, message: &str) {
        *self.count.lock() += 1;
        tracing::warn!(target: "pxr::notify", "{message}");
    }
}

/// Errors that end a simulation before it starts
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error(transparent)]
    Config(#[from] pxr_agent::ConfigError),
}

fn simulated_secs(period: Duration, ticks: u64) -> u64 {
    let millis = period.as_millis().saturating_mul(u128::from(ticks));
    u64::try_from(millis / 1000).unwrap_or(u64::MAX)
}

/// Run a session against a fresh simulated service
///
/// # Errors
/// `SimulatorError::Config` when the template cannot be placed.
pub fn run_simulator(
    config: &SimulatorConfig,
    template: &dyn ImageSource,
) -> Result<SimulatorReport, SimulatorError> {
    let clock = SimClock::new();
    let service = SimulatedService::new(config, clock.clone());
    let notifier = CountingNotifier::default();

    let collaborators = Collaborators::new(service.transport(), service.surface())
        .with_notifier(Box::new(notifier.clone()))
        .with_clock(Arc::new(clock.clone()))
        .with_random(Box::new(SeededRandom::new(config.seed)));

    let mut session = Session::new(config.session.clone(), collaborators);
    session.load_template(template)?;
    session.set_origin(config.origin.left, config.origin.top)?;
    session.start()?;

    let (width, height) = (template.width(), template.height());
    let period = config.session.tick_period();
    let mut grief_rng = StdRng::seed_from_u64(config.seed.wrapping_add(1));
    let mut captcha_ticks = 0u32;
    let mut completed = false;
    let mut ticks = 0u64;

    tracing::info!(seed = config.seed, max_ticks = config.max_ticks, "simulation started");

    while ticks < config.max_ticks {
        ticks += 1;

        if grief_rng.gen_bool(config.grief_probability.clamp(0.0, 1.0)) {
            service.grief(config.origin, width, height);
        }

        let outcome = session.tick();
        for frame in service.drain_inbound() {
            session.handle_frame(&frame);
        }

        if session.state() == SchedulerState::CaptchaWait {
            captcha_ticks += 1;
            if captcha_ticks >= config.captcha_solve_ticks {
                captcha_ticks = 0;
                let token = service.issue_token();
                if let Err(err) = session.submit_challenge(&token) {
                    tracing::warn!(%err, "captcha answer not sent");
                }
                for frame in service.drain_inbound() {
                    session.handle_frame(&frame);
                }
            }
        }

        completed = outcome == TickOutcome::Complete;
        if completed && config.stop_when_complete {
            break;
        }
        if session.state() == SchedulerState::Stopped {
            tracing::warn!("session stopped itself");
            break;
        }

        clock.advance(period);
    }

    let snapshot = session.dispose();
    let report = SimulatorReport {
        seed: config.seed,
        ticks,
        simulated_secs: simulated_secs(period, ticks),
        completed,
        final_state: snapshot.state.label().to_owned(),
        template_cells: snapshot.template_cells,
        remaining: snapshot.remaining,
        progress_percent: snapshot.progress_percent(),
        confirmed: snapshot.confirmed,
        sent: snapshot.sent,
        censored: snapshot.censored,
        notifications: *notifier.count.lock(),
        service: service.stats(),
    };

    tracing::info!(
        ticks,
        completed,
        sent = report.sent,
        confirmed = report.confirmed,
        "simulation finished"
    );
    Ok(report)
}
