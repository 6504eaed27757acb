//! Pixel Robot command line support
//!
//! - [`simulator`]: an in-process drawing service with cooldowns, captchas
//!   and griefers, for running a session end to end on simulated time
//! - [`template`]: template images decoded from files, plus a test pattern
//! - [`logging`]: tracing subscriber setup for the binary
//!
//! # Example
//!
//! ```rust,ignore
//! use pxr_robot::simulator::{run_simulator, SimulatorConfig};
//! use pxr_robot::template::pattern;
//!
//! let report = run_simulator(&SimulatorConfig::default(), &pattern(16, 16)?)?;
//! println!("{}", report.generate_text());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod logging;
pub mod simulator;
pub mod template;

pub use logging::{init_tracing, LogFormat};
pub use simulator::{run_simulator, SimulatorConfig, SimulatorReport};
pub use template::{pattern, DecodedTemplate, TemplateError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
