//! Exact-shape descriptions of permitted outbound messages

use once_cell::sync::Lazy;
use pxr_raster::{PALETTE_SIZE, SURFACE_SIZE};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

static CHALLENGE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{300,400}$").expect("token pattern compiles"));

/// Predicate applied to one field value
#[derive(Debug, Clone)]
pub enum FieldRule {
    /// String equal to the literal
    Literal(&'static str),
    /// JSON integer in `min..max`
    Integer { min: i64, max: i64 },
    /// String fully matching the pattern
    Pattern(Regex),
}

impl FieldRule {
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Literal(expected) => value.as_str() == Some(*expected),
            Self::Integer { min, max } => value.as_i64().is_some_and(|n| (*min..*max).contains(&n)),
            Self::Pattern(pattern) => value.as_str().is_some_and(|s| pattern.is_match(s)),
        }
    }
}

/// Required fields of one message shape
///
/// A payload matches only if it is a JSON object carrying every field, each
/// field satisfies its rule, and no other field is present.
#[derive(Debug, Clone)]
pub struct Schema {
    name: &'static str,
    fields: BTreeMap<&'static str, FieldRule>,
}

impl Schema {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: BTreeMap::new(),
        }
    }

    /// Require `field` to satisfy `rule`
    #[must_use]
    pub fn field(mut self, field: &'static str, rule: FieldRule) -> Self {
        self.fields.insert(field, rule);
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn matches(&self, payload: &Value) -> bool {
        let Some(object) = payload.as_object() else {
            return false;
        };

        let required_ok = self
            .fields
            .iter()
            .all(|(field, rule)| object.get(*field).is_some_and(|v| rule.accepts(v)));
        let no_extras = object.keys().all(|key| self.fields.contains_key(key.as_str()));

        required_ok && no_extras
    }
}

/// `{"type":"place","x":0..2000,"y":0..2000,"color":0..16}`
#[must_use]
pub fn place_cell_schema() -> Schema {
    let surface = i64::from(SURFACE_SIZE);
    Schema::new("place")
        .field("type", FieldRule::Literal("place"))
        .field("x", FieldRule::Integer { min: 0, max: surface })
        .field("y", FieldRule::Integer { min: 0, max: surface })
        .field(
            "color",
            FieldRule::Integer {
                min: 0,
                max: PALETTE_SIZE as i64,
            },
        )
}

/// `{"type":"challenge","token":[A-Za-z0-9_-]{300,400}}`
#[must_use]
pub fn submit_challenge_schema() -> Schema {
    Schema::new("challenge")
        .field("type", FieldRule::Literal("challenge"))
        .field("token", FieldRule::Pattern(CHALLENGE_TOKEN.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_rule_is_half_open_and_rejects_floats() {
        let rule = FieldRule::Integer { min: 0, max: 16 };
        assert!(rule.accepts(&json!(0)));
        assert!(rule.accepts(&json!(15)));
        assert!(!rule.accepts(&json!(16)));
        assert!(!rule.accepts(&json!(-1)));
        assert!(!rule.accepts(&json!(3.0)));
        assert!(!rule.accepts(&json!("3")));
    }

    #[test]
    fn literal_rule_is_case_sensitive() {
        let rule = FieldRule::Literal("place");
        assert!(rule.accepts(&json!("place")));
        assert!(!rule.accepts(&json!("Place")));
        assert!(!rule.accepts(&json!(null)));
    }

    #[test]
    fn schema_requires_exact_shape() {
        let schema = place_cell_schema();
        assert!(schema.matches(&json!({"type": "place", "x": 1, "y": 2, "color": 3})));
        assert!(!schema.matches(&json!({"type": "place", "x": 1, "y": 2})));
        assert!(!schema.matches(&json!({"type": "place", "x": 1, "y": 2, "color": 3, "z": 0})));
        assert!(!schema.matches(&json!([1, 2, 3])));
    }

    #[test]
    fn token_pattern_is_anchored() {
        let schema = submit_challenge_schema();
        let body = "a".repeat(300);
        assert!(schema.matches(&json!({"type": "challenge", "token": body})));
        let dirty = format!("{} ", "a".repeat(300));
        assert!(!schema.matches(&json!({"type": "challenge", "token": dirty})));
    }
}
