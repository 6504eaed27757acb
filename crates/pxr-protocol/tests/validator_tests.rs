//! Whitelist behaviour at the edges of every permitted shape

use proptest::prelude::*;
use pxr_protocol::{OutgoingCommand, ValidationError, Validator};
use serde_json::json;

fn token(len: usize) -> String {
    "Ab0_-".chars().cycle().take(len).collect()
}

#[test]
fn test_place_rejects_negative_coordinate() {
    let validator = Validator::default();
    let result = validator.authorize_value(&json!({"type": "place", "x": -1, "y": 0, "color": 0}));
    assert!(matches!(result, Err(ValidationError::Unrecognized { .. })));
}

#[test]
fn test_place_accepts_far_corner() {
    let validator = Validator::default();
    let command = OutgoingCommand::PlaceCell { x: 1999, y: 1999, color: 15 };
    assert!(validator.authorize(&command).is_ok());
}

#[test]
fn test_place_rejects_out_of_range_values() {
    let validator = Validator::default();
    for command in [
        OutgoingCommand::PlaceCell { x: 2000, y: 0, color: 0 },
        OutgoingCommand::PlaceCell { x: 0, y: 2000, color: 0 },
        OutgoingCommand::PlaceCell { x: 0, y: 0, color: 16 },
        OutgoingCommand::PlaceCell { x: 0, y: 0, color: 254 },
    ] {
        assert!(validator.authorize(&command).is_err(), "{command:?} should be rejected");
    }
}

#[test]
fn test_challenge_token_length_bounds() {
    let validator = Validator::default();
    assert!(validator.authorize(&OutgoingCommand::challenge(token(299))).is_err());
    assert!(validator.authorize(&OutgoingCommand::challenge(token(300))).is_ok());
    assert!(validator.authorize(&OutgoingCommand::challenge(token(400))).is_ok());
    assert!(validator.authorize(&OutgoingCommand::challenge(token(401))).is_err());
}

#[test]
fn test_challenge_token_charset() {
    let validator = Validator::default();
    let mut bad = token(320);
    bad.replace_range(10..11, "!");
    assert!(validator.authorize(&OutgoingCommand::challenge(bad)).is_err());
}

#[test]
fn test_unknown_type_rejected_with_payload() {
    let validator = Validator::default();
    let err = validator.authorize_value(&json!({"type": "teleport"})).unwrap_err();
    assert_eq!(err.payload(), r#"{"type":"teleport"}"#);
}

#[test]
fn test_extra_field_rejected() {
    let validator = Validator::default();
    let payload = json!({"type": "place", "x": 1, "y": 1, "color": 1, "user": "someone"});
    assert!(validator.authorize_value(&payload).is_err());

    let payload = json!({"type": "challenge", "token": token(300), "x": 1});
    assert!(validator.authorize_value(&payload).is_err());
}

#[test]
fn test_type_mixup_rejected() {
    // place fields under the challenge tag match neither schema
    let validator = Validator::default();
    let payload = json!({"type": "challenge", "x": 1, "y": 1, "color": 1});
    assert!(validator.authorize_value(&payload).is_err());
}

proptest! {
    #[test]
    fn prop_in_range_place_always_authorized(x in 0u32..2000, y in 0u32..2000, color in 0u8..16) {
        let validator = Validator::default();
        let frame = validator.authorize(&OutgoingCommand::PlaceCell { x, y, color }).unwrap();
        prop_assert_eq!(frame.schema(), "place");
    }

    #[test]
    fn prop_valid_tokens_authorized(body in "[A-Za-z0-9_-]{300,400}") {
        let validator = Validator::default();
        prop_assert!(validator.authorize(&OutgoingCommand::challenge(body)).is_ok());
    }
}
