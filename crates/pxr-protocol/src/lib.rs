//! Pixel Robot wire protocol
//!
//! Messages exchanged with the drawing service, and the whitelist that every
//! outbound message must pass before it may leave the process:
//!
//! - [`OutgoingCommand`]: what the robot is allowed to say
//! - [`InboundEvent`]: what the service tells the robot
//! - [`Schema`] / [`FieldRule`]: exact-shape message descriptions
//! - [`Validator`]: ordered schema list producing [`AuthorizedFrame`]s
//!
//! # Example
//!
//! ```rust,ignore
//! use pxr_protocol::{OutgoingCommand, Validator};
//!
//! let validator = Validator::default();
//! let frame = validator.authorize(&OutgoingCommand::place(12, 34, color))?;
//! transport.send(&frame)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod command;
mod error;
mod event;
mod schema;
mod validation;

pub use command::OutgoingCommand;
pub use error::{ProtocolError, ValidationError};
pub use event::InboundEvent;
pub use schema::{place_cell_schema, submit_challenge_schema, FieldRule, Schema};
pub use validation::{AuthorizedFrame, Validator};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
