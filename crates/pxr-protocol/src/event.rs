//! Messages the drawing service pushes to the robot

use crate::error::ProtocolError;
use serde_json::Value;

/// Inbound protocol event
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Service wants a human to solve a captcha before accepting writes
    ChallengeRequired,
    /// Outcome of a submitted captcha
    ChallengeStatus { success: bool },
    /// Cooldown in force; `wait` is in seconds
    RateLimit { wait: f64 },
    /// Any other message type; carried only for logging
    Other { kind: String },
}

impl InboundEvent {
    /// Parse one text frame
    ///
    /// Unknown message types parse to [`InboundEvent::Other`].
    ///
    /// # Errors
    /// `ProtocolError` when the frame is not JSON, has no `type`, or a known
    /// type is missing a required field.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(frame)?;
        Self::from_value(&value)
    }

    /// Interpret an already-decoded frame
    ///
    /// # Errors
    /// See [`InboundEvent::parse`].
    pub fn from_value(value: &Value) -> Result<Self, ProtocolError> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingType)?;

        match kind {
            "challenge_required" => Ok(Self::ChallengeRequired),
            "challenge_status" => {
                let success = value
                    .get("success")
                    .and_then(Value::as_bool)
                    .ok_or(ProtocolError::InvalidField {
                        kind: "challenge_status",
                        field: "success",
                    })?;
                Ok(Self::ChallengeStatus { success })
            }
            "rate_limit" => {
                let wait = value
                    .get("wait")
                    .and_then(Value::as_f64)
                    .ok_or(ProtocolError::InvalidField {
                        kind: "rate_limit",
                        field: "wait",
                    })?;
                Ok(Self::RateLimit { wait })
            }
            other => Ok(Self::Other {
                kind: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_events() {
        assert_eq!(
            InboundEvent::parse(r#"{"type":"challenge_required"}"#),
            Ok(InboundEvent::ChallengeRequired)
        );
        assert_eq!(
            InboundEvent::parse(r#"{"type":"challenge_status","success":true}"#),
            Ok(InboundEvent::ChallengeStatus { success: true })
        );
        assert_eq!(
            InboundEvent::parse(r#"{"type":"rate_limit","wait":42.5}"#),
            Ok(InboundEvent::RateLimit { wait: 42.5 })
        );
        assert_eq!(
            InboundEvent::parse(r#"{"type":"rate_limit","wait":10}"#),
            Ok(InboundEvent::RateLimit { wait: 10.0 })
        );
    }

    #[test]
    fn unknown_types_are_carried_not_rejected() {
        assert_eq!(
            InboundEvent::parse(r#"{"type":"pixel","pixels":[]}"#),
            Ok(InboundEvent::Other { kind: "pixel".into() })
        );
    }

    #[test]
    fn rejects_broken_frames() {
        assert!(matches!(InboundEvent::parse("not json"), Err(ProtocolError::Malformed(_))));
        assert_eq!(InboundEvent::parse(r#"{"wait":3}"#), Err(ProtocolError::MissingType));
        assert_eq!(
            InboundEvent::parse(r#"{"type":"rate_limit","wait":"soon"}"#),
            Err(ProtocolError::InvalidField { kind: "rate_limit", field: "wait" })
        );
    }
}
