//! Send-side middleware: whitelist in front of the transport

use crate::collab::Transport;
use crate::error::{AgentError, TransportError};
use pxr_protocol::{OutgoingCommand, ValidationError, Validator};
use serde_json::Value;

/// Why an outbound payload did not leave
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The whitelist refused it; nothing reached the transport
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    /// Authorized, but the transport failed
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<SendError> for AgentError {
    fn from(err: SendError) -> Self {
        match err {
            SendError::Rejected(err) => Self::Validation(err),
            SendError::Transport(err) => Self::Transport(err),
        }
    }
}

/// [`Transport`] that only ever sees whitelisted frames
pub struct GuardedTransport {
    validator: Validator,
    inner: Box<dyn Transport>,
    sent: u64,
    censored: u64,
}

impl GuardedTransport {
    #[must_use]
    pub fn new(validator: Validator, inner: Box<dyn Transport>) -> Self {
        Self {
            validator,
            inner,
            sent: 0,
            censored: 0,
        }
    }

    /// Validate and send a typed command
    ///
    /// # Errors
    /// `SendError::Rejected` if the whitelist refuses it, `SendError::Transport`
    /// if delivery fails.
    pub fn send_command(&mut self, command: &OutgoingCommand) -> Result<(), SendError> {
        self.send_value(&command.to_value())
    }

    /// Validate and send an arbitrary payload
    ///
    /// # Errors
    /// See [`GuardedTransport::send_command`].
    pub fn send_value(&mut self, payload: &Value) -> Result<(), SendError> {
        let frame = match self.validator.authorize_value(payload) {
            Ok(frame) => frame,
            Err(err) => {
                self.censored += 1;
                tracing::warn!(payload = %err.payload(), "CENSORED outbound frame");
                return Err(err.into());
            }
        };

        self.inner.send(&frame)?;
        self.sent += 1;
        tracing::debug!(frame = %frame, schema = frame.schema(), "SENT");
        Ok(())
    }

    /// Frames handed to the transport
    #[inline]
    #[must_use]
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Frames refused by the whitelist
    #[inline]
    #[must_use]
    pub fn censored(&self) -> u64 {
        self.censored
    }
}

impl std::fmt::Debug for GuardedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedTransport")
            .field("sent", &self.sent)
            .field("censored", &self.censored)
            .finish_non_exhaustive()
    }
}
