//! Error types for the agent
//!
//! Provides error handling for:
//! - Operator configuration (template, bounding box)
//! - Transport and live-surface collaborator failures
//! - Outbound whitelist rejections

use pxr_protocol::ValidationError;
use pxr_raster::RasterError;

/// Main agent error type
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Operator input is incomplete or invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Outbound payload refused by the whitelist
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Transport refused or failed to deliver a frame
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Live surface could not be sampled
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// Raster construction or comparison failed
    #[error("raster error: {0}")]
    Raster(#[from] RasterError),

    /// The session runner task has shut down
    #[error("session runner has shut down")]
    RunnerClosed,
}

impl AgentError {
    /// Check if the session can keep running after this error
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    /// Check if this error ends the running session
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Operator configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No template image loaded
    #[error("Load your image first!")]
    MissingTemplate,

    /// Bounding box violates the surface limits
    #[error("Invalid boundings.")]
    InvalidBoundings,

    /// Inputs are locked while the robot runs
    #[error("stop the robot before changing its configuration")]
    SessionRunning,
}

/// Transport failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection to the service is gone
    #[error("transport closed")]
    Closed,

    /// Delivery failed for another reason
    #[error("send failed: {0}")]
    Failed(String),
}

/// Live-surface sampling failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// Surface not loaded or not reachable
    #[error("surface unavailable: {0}")]
    Unavailable(String),

    /// Snapshot came back with the wrong extent
    #[error("surface returned {actual_width}x{actual_height}, expected {width}x{height}")]
    WrongExtent {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_validation_is_fatal() {
        let fatal = AgentError::from(ValidationError::Unrecognized {
            payload: "{}".into(),
        });
        assert!(fatal.is_fatal());
        assert!(!fatal.is_recoverable());

        assert!(AgentError::from(ConfigError::InvalidBoundings).is_recoverable());
        assert!(AgentError::from(TransportError::Closed).is_recoverable());
    }

    #[test]
    fn bounding_errors_read_like_operator_messages() {
        assert_eq!(ConfigError::InvalidBoundings.to_string(), "Invalid boundings.");
        assert_eq!(ConfigError::MissingTemplate.to_string(), "Load your image first!");
    }
}
