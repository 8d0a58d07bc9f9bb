//! Wire frames for the event channel
//!
//! The transport carries newline-delimited JSON frames. Inbound frames are
//! an envelope of `{"event": <name>, "data": <payload>}`; the payload stays
//! untyped ([`serde_json::Value`]) until the router has matched the event
//! name, so an unknown event is distinguishable from a malformed payload.
//! Outbound frames echo the event name and carry a [`ResultTuple`].

use crate::protocol::{ManipulatorId, Position, ResultTuple};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Event name: register a manipulator with the gateway
pub const REGISTER_MANIPULATOR: &str = "register_manipulator";
/// Event name: query a manipulator's current position
pub const GET_POS: &str = "get_pos";
/// Event name: move a manipulator to a target position
pub const GOTO_POS: &str = "goto_pos";
/// Event name: run a manipulator's calibration routine
pub const CALIBRATE: &str = "calibrate";
/// Event name: mark a manipulator calibrated without running the routine
pub const BYPASS_CALIBRATION: &str = "bypass_calibration";

/// Inbound event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFrame {
    /// Event name selecting the command
    pub event: String,

    /// Command payload; shape depends on the event
    #[serde(default)]
    pub data: Value,
}

impl EventFrame {
    /// Create a new event frame
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Parse a frame from one line of JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the frame to a JSON line (no trailing newline)
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Outbound reply envelope carrying a ResultTuple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyFrame {
    /// Echo of the event name this reply acknowledges
    pub event: String,

    /// The (id, payload, error) tuple
    pub data: ResultTuple,
}

impl ReplyFrame {
    /// Create a reply for the given event
    pub fn new(event: impl Into<String>, data: ResultTuple) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Parse a reply from one line of JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the reply to a JSON line (no trailing newline)
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Payload of a `goto_pos` command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Manipulator to move
    pub manipulator_id: ManipulatorId,

    /// Target position; serde rejects anything but exactly four floats
    pub pos: Position,

    /// Movement speed (facility units)
    pub speed: f64,
}

/// Best-effort recovery of a manipulator id from an arbitrary payload.
///
/// Used for validation-error replies so the client can still correlate the
/// error with the command it sent. Accepts a bare integer or an object with
/// a `manipulator_id` field; anything else (including integers outside the
/// i32 range) yields `None` and the caller falls back to the sentinel id.
pub fn extract_manipulator_id(data: &Value) -> Option<ManipulatorId> {
    let raw = match data {
        Value::Number(_) => data.as_i64()?,
        Value::Object(map) => map.get("manipulator_id")?.as_i64()?,
        _ => return None,
    };
    ManipulatorId::try_from(raw).ok()
}
