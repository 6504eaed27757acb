//! Outbound whitelist
//!
//! Every message leaving the robot goes through [`Validator`]. A payload that
//! fits no schema is refused and reported with its full text.

use crate::command::OutgoingCommand;
use crate::error::ValidationError;
use crate::schema::{place_cell_schema, submit_challenge_schema, Schema};
use serde_json::Value;
use std::fmt;

/// Serialized payload that passed the whitelist
///
/// Only [`Validator`] constructs these, so holding one proves the text was
/// checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedFrame {
    schema: &'static str,
    text: String,
}

impl AuthorizedFrame {
    /// Name of the schema the payload matched
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &'static str {
        self.schema
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for AuthorizedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Ordered list of permitted message shapes
#[derive(Debug, Clone)]
pub struct Validator {
    schemas: Vec<Schema>,
}

impl Validator {
    #[inline]
    #[must_use]
    pub fn new(schemas: Vec<Schema>) -> Self {
        Self { schemas }
    }

    /// Append another permitted shape
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schemas.push(schema);
        self
    }

    #[inline]
    #[must_use]
    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }

    /// Check a typed command
    ///
    /// # Errors
    /// `ValidationError::Unrecognized` when no schema matches.
    pub fn authorize(&self, command: &OutgoingCommand) -> Result<AuthorizedFrame, ValidationError> {
        self.authorize_value(&command.to_value())
    }

    /// Check an arbitrary JSON payload
    ///
    /// # Errors
    /// `ValidationError::Unrecognized` when no schema matches.
    pub fn authorize_value(&self, payload: &Value) -> Result<AuthorizedFrame, ValidationError> {
        let text = payload.to_string();
        match self.schemas.iter().find(|schema| schema.matches(payload)) {
            Some(schema) => Ok(AuthorizedFrame {
                schema: schema.name(),
                text,
            }),
            None => Err(ValidationError::Unrecognized { payload: text }),
        }
    }

    /// Check a raw text frame
    ///
    /// The authorized text is the re-serialized payload, so exactly what was
    /// checked is what gets sent.
    ///
    /// # Errors
    /// `ValidationError::Unrecognized` when the text is not JSON or no schema
    /// matches.
    pub fn authorize_text(&self, frame: &str) -> Result<AuthorizedFrame, ValidationError> {
        match serde_json::from_str::<Value>(frame) {
            Ok(payload) => self.authorize_value(&payload),
            Err(_) => Err(ValidationError::Unrecognized {
                payload: frame.to_owned(),
            }),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(vec![place_cell_schema(), submit_challenge_schema()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldRule;
    use serde_json::json;

    #[test]
    fn authorized_frame_records_schema() {
        let validator = Validator::default();
        let frame = validator
            .authorize(&OutgoingCommand::PlaceCell { x: 5, y: 6, color: 7 })
            .unwrap();
        assert_eq!(frame.schema(), "place");
        let echoed: Value = serde_json::from_str(frame.as_str()).unwrap();
        assert_eq!(echoed, json!({"type": "place", "x": 5, "y": 6, "color": 7}));
    }

    #[test]
    fn empty_validator_rejects_everything() {
        let validator = Validator::new(Vec::new());
        let err = validator
            .authorize(&OutgoingCommand::PlaceCell { x: 0, y: 0, color: 0 })
            .unwrap_err();
        assert!(err.payload().contains("\"place\""));
    }

    #[test]
    fn extra_schemas_extend_the_whitelist() {
        let validator = Validator::default()
            .with_schema(Schema::new("ping").field("type", FieldRule::Literal("ping")));
        assert_eq!(validator.authorize_text(r#"{"type":"ping"}"#).unwrap().schema(), "ping");
    }

    #[test]
    fn non_json_text_is_rejected_verbatim() {
        let err = Validator::default().authorize_text("<script>").unwrap_err();
        assert_eq!(err.payload(), "<script>");
    }
}
