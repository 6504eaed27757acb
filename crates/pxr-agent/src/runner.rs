//! Async driver for a [`Session`]
//!
//! A single task owns the session and serializes its three inputs: the tick
//! timer, inbound service frames and operator intents. Operators talk to it
//! through a cloneable [`RunnerHandle`] and watch a [`SessionSnapshot`] that
//! is republished after every input.

use crate::error::AgentError;
use crate::session::Session;
use crate::snapshot::SessionSnapshot;
use pxr_raster::Raster;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;

/// Queue depth for intents and inbound frames
const CHANNEL_CAPACITY: usize = 64;

/// Operator requests
#[derive(Debug, Clone)]
pub enum Intent {
    /// Quantize and cache a new template
    LoadTemplate(Raster),
    /// Move the template's top-left corner
    SetOrigin { left: u32, top: u32 },
    Start,
    Stop,
    /// Drop the pending write and paint immediately
    ForcePick,
    /// Answer a captcha
    SubmitChallenge(String),
    /// Dispose the session and end the runner
    Shutdown,
}

struct Request {
    intent: Intent,
    reply: Option<oneshot::Sender<Result<(), AgentError>>>,
}

/// Task side of the runner
pub struct SessionRunner {
    session: Session,
    intents: mpsc::Receiver<Request>,
    inbound: mpsc::Receiver<String>,
    snapshots: watch::Sender<SessionSnapshot>,
}

/// Operator side of the runner
#[derive(Debug, Clone)]
pub struct RunnerHandle {
    intents: mpsc::Sender<Request>,
    inbound: mpsc::Sender<String>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionRunner {
    /// Split a session into its task and a handle
    #[must_use]
    pub fn channel(session: Session) -> (Self, RunnerHandle) {
        let (intent_tx, intent_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());

        let runner = Self {
            session,
            intents: intent_rx,
            inbound: inbound_rx,
            snapshots: snapshot_tx,
        };
        let handle = RunnerHandle {
            intents: intent_tx,
            inbound: inbound_tx,
            snapshots: snapshot_rx,
        };
        (runner, handle)
    }

    /// Run until [`Intent::Shutdown`] or until every handle is dropped
    pub async fn run(mut self) -> SessionSnapshot {
        let mut ticker = tokio::time::interval(self.session.config().tick_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut inbound_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = self.session.tick();
                    tracing::trace!(?outcome, "tick");
                }
                frame = self.inbound.recv(), if inbound_open => match frame {
                    Some(frame) => self.session.handle_frame(&frame),
                    None => {
                        tracing::debug!("inbound stream closed");
                        inbound_open = false;
                    }
                },
                request = self.intents.recv() => match request {
                    Some(Request { intent: Intent::Shutdown, reply }) => {
                        if let Some(reply) = reply {
                            let _ = reply.send(Ok(()));
                        }
                        break;
                    }
                    Some(request) => self.apply(request),
                    None => break,
                },
            }

            self.snapshots.send_replace(self.session.snapshot());
        }

        let last = self.session.dispose();
        self.snapshots.send_replace(last.clone());
        last
    }

    fn apply(&mut self, request: Request) {
        let Request { intent, reply } = request;
        tracing::debug!(?intent, "intent");

        let result: Result<(), AgentError> = match intent {
            Intent::LoadTemplate(raster) => {
                self.session.load_template(&raster).map_err(Into::into)
            }
            Intent::SetOrigin { left, top } => {
                self.session.set_origin(left, top).map_err(Into::into)
            }
            Intent::Start => self.session.start().map_err(Into::into),
            Intent::Stop => {
                self.session.stop();
                Ok(())
            }
            Intent::ForcePick => self
                .session
                .force_pick()
                .map(|outcome| tracing::debug!(?outcome, "forced pick"))
                .map_err(Into::into),
            Intent::SubmitChallenge(token) => {
                self.session.submit_challenge(&token).map_err(Into::into)
            }
            Intent::Shutdown => Ok(()),
        };

        match reply {
            Some(reply) => {
                // Publish first so the caller observes the intent's effect
                self.snapshots.send_replace(self.session.snapshot());
                let _ = reply.send(result);
            }
            None => {
                if let Err(err) = result {
                    tracing::warn!(%err, "intent failed");
                }
            }
        }
    }
}

impl std::fmt::Debug for SessionRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRunner")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl RunnerHandle {
    /// Queue an intent without waiting for its outcome
    ///
    /// # Errors
    /// `AgentError::RunnerClosed` once the runner has stopped.
    pub async fn send(&self, intent: Intent) -> Result<(), AgentError> {
        self.intents
            .send(Request {
                intent,
                reply: None,
            })
            .await
            .map_err(|_| AgentError::RunnerClosed)
    }

    /// Apply an intent and wait for its outcome
    ///
    /// # Errors
    /// Whatever the session returned for the intent, or
    /// `AgentError::RunnerClosed` once the runner has stopped.
    pub async fn request(&self, intent: Intent) -> Result<(), AgentError> {
        let (tx, rx) = oneshot::channel();
        self.intents
            .send(Request {
                intent,
                reply: Some(tx),
            })
            .await
            .map_err(|_| AgentError::RunnerClosed)?;
        rx.await.map_err(|_| AgentError::RunnerClosed)?
    }

    /// Hand an inbound service frame to the session
    ///
    /// # Errors
    /// `AgentError::RunnerClosed` once the runner has stopped.
    pub async fn deliver(&self, frame: impl Into<String>) -> Result<(), AgentError> {
        self.inbound
            .send(frame.into())
            .await
            .map_err(|_| AgentError::RunnerClosed)
    }

    /// Latest published snapshot
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every republished snapshot
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Whether the runner task is still accepting intents
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.intents.is_closed()
    }
}
