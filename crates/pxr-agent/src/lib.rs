//! Pixel Robot agent
//!
//! The owned [`Session`] that drives a template onto the shared surface:
//! - Scheduling state machine (ready / cooldown / captcha / stopped)
//! - Pending-write tracking with lazy timeout
//! - Progress and ETA estimation
//! - Outbound guard composing the whitelist in front of the transport
//! - An async [`runner`] that feeds ticks, inbound frames and operator
//!   intents into the session on a single task
//!
//! # Example
//!
//! ```rust,ignore
//! use pxr_agent::{Collaborators, Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::default(), collaborators);
//! session.load_template(&template)?;
//! session.set_origin(120, 80)?;
//! session.start()?;
//!
//! loop {
//!     session.tick();
//!     for frame in transport.drain() {
//!         session.handle_frame(&frame);
//!     }
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod collab;
pub mod config;
pub mod error;
pub mod guard;
pub mod progress;
pub mod runner;
pub mod session;
pub mod snapshot;
pub mod state;

pub use collab::{
    Clock, Collaborators, LiveSurfaceSource, Notifier, SystemClock, TokioClock, TracingNotifier,
    Transport,
};
pub use config::SessionConfig;
pub use error::{AgentError, ConfigError, SurfaceError, TransportError};
pub use guard::{GuardedTransport, SendError};
pub use progress::{ProgressSample, ProgressTracker, HISTORY_CAPACITY};
pub use runner::{Intent, RunnerHandle, SessionRunner};
pub use session::{Session, TickOutcome};
pub use snapshot::SessionSnapshot;
pub use state::SchedulerState;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a session
    pub use crate::{
        Clock, Collaborators, Intent, Notifier, SchedulerState, Session, SessionConfig,
        SessionSnapshot, TickOutcome, Transport,
    };
    pub use pxr_protocol::{InboundEvent, OutgoingCommand};
    pub use pxr_raster::{ImageSource, Origin, PendingWrite, Raster, RandomSource};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
