//! Commands the robot may send to the drawing service

use pxr_raster::{ColorIndex, PendingWrite};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Outbound message, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutgoingCommand {
    /// Paint one surface cell
    #[serde(rename = "place")]
    PlaceCell { x: u32, y: u32, color: u8 },

    /// Answer a captcha challenge
    #[serde(rename = "challenge")]
    SubmitChallenge { token: String },
}

impl OutgoingCommand {
    #[inline]
    #[must_use]
    pub fn place(x: u32, y: u32, color: ColorIndex) -> Self {
        Self::PlaceCell {
            x,
            y,
            color: color.as_u8(),
        }
    }

    /// Place command for a picked write, at its surface coordinates
    #[inline]
    #[must_use]
    pub fn from_write(write: &PendingWrite) -> Self {
        Self::place(write.target_x, write.target_y, write.color)
    }

    #[inline]
    #[must_use]
    pub fn challenge(token: impl Into<String>) -> Self {
        Self::SubmitChallenge {
            token: token.into(),
        }
    }

    /// Wire `type` tag
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlaceCell { .. } => "place",
            Self::SubmitChallenge { .. } => "challenge",
        }
    }

    /// JSON object as it appears on the wire
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::PlaceCell { x, y, color } => json!({
                "type": "place",
                "x": x,
                "y": y,
                "color": color,
            }),
            Self::SubmitChallenge { token } => json!({
                "type": "challenge",
                "token": token,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_value_agrees_with_serde() {
        let commands = [
            OutgoingCommand::PlaceCell { x: 3, y: 4, color: 15 },
            OutgoingCommand::challenge("abc"),
        ];
        for command in commands {
            let via_serde = serde_json::to_value(&command).unwrap();
            assert_eq!(via_serde, command.to_value());
            let back: OutgoingCommand = serde_json::from_value(via_serde).unwrap();
            assert_eq!(back, command);
        }
    }

    #[test]
    fn place_uses_target_coordinates() {
        let write = PendingWrite {
            source_x: 1,
            source_y: 2,
            target_x: 101,
            target_y: 202,
            color: ColorIndex::palette(9).unwrap(),
        };
        assert_eq!(
            OutgoingCommand::from_write(&write),
            OutgoingCommand::PlaceCell { x: 101, y: 202, color: 9 }
        );
    }
}
