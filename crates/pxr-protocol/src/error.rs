//! Protocol error types

/// Outbound payload rejected by the whitelist
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Payload matched none of the known schemas
    #[error("unrecognized outbound payload: {payload}")]
    Unrecognized {
        /// The offending payload, serialized for audit
        payload: String,
    },
}

impl ValidationError {
    /// The rejected payload text
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &str {
        match self {
            Self::Unrecognized { payload } => payload,
        }
    }
}

/// Inbound frame that could not be understood
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Frame is not valid JSON
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Frame has no string `type` field
    #[error("frame has no message type")]
    MissingType,

    /// Known message type with a missing or mistyped field
    #[error("'{kind}' frame has invalid field '{field}'")]
    InvalidField {
        kind: &'static str,
        field: &'static str,
    },
}

impl From<serde_json::Error> for ProtocolError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value.to_string())
    }
}
