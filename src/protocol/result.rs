//! Result Protocol: the universal reply shape
//!
//! Every command is acknowledged with a [`ResultTuple`], an ordered triple
//! of (manipulator id, payload-or-empty, error-string-or-empty). Clients
//! distinguish success from failure solely by error-string emptiness; there
//! is no separate status code. On the wire the tuple is a three-element
//! JSON array, e.g. `[1, [0.0, 0.0, 0.0, 0.0], ""]`.

use serde::{Deserialize, Serialize};

/// Integer identifier of a physical manipulator unit
pub type ManipulatorId = i32;

/// Sentinel id used in validation-error replies when no manipulator id
/// could be recovered from the payload
pub const INVALID_ID: ManipulatorId = -1;

/// Manipulator position as an ordered (x, y, z, w-axis) tuple.
///
/// Produced only by the Device Facility; the gateway validates shape
/// (exactly four elements) and passes values through untouched.
pub type Position = [f64; 4];

/// Reply payload for every command: (id, payload, error)
///
/// The field order is load-bearing: serde serializes the tuple struct as a
/// JSON array and clients index into it positionally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTuple(ManipulatorId, Vec<f64>, String);

impl ResultTuple {
    /// Create a success reply with no payload (register, calibrate, bypass)
    pub fn ok(id: ManipulatorId) -> Self {
        Self(id, Vec::new(), String::new())
    }

    /// Create a success reply carrying a position (get_pos, goto_pos)
    pub fn with_position(id: ManipulatorId, pos: Position) -> Self {
        Self(id, pos.to_vec(), String::new())
    }

    /// Create an error reply; the payload is always empty on error
    pub fn error(id: ManipulatorId, message: impl Into<String>) -> Self {
        Self(id, Vec::new(), message.into())
    }

    /// Manipulator id this reply concerns
    pub fn id(&self) -> ManipulatorId {
        self.0
    }

    /// Payload floats (empty for payload-less commands and for errors)
    pub fn payload(&self) -> &[f64] {
        &self.1
    }

    /// Error message; empty means success
    pub fn error_message(&self) -> &str {
        &self.2
    }

    /// Whether this reply signals success (empty error string)
    pub fn is_ok(&self) -> bool {
        self.2.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_tuple() {
        let tuple = ResultTuple::ok(3);
        assert_eq!(tuple.id(), 3);
        assert!(tuple.payload().is_empty());
        assert!(tuple.is_ok());
    }

    #[test]
    fn test_position_tuple() {
        let tuple = ResultTuple::with_position(1, [1.0, 2.0, 3.0, 0.0]);
        assert_eq!(tuple.payload(), &[1.0, 2.0, 3.0, 0.0]);
        assert!(tuple.is_ok());
    }

    #[test]
    fn test_error_tuple_has_empty_payload() {
        let tuple = ResultTuple::error(7, "manipulator 7 is not registered");
        assert_eq!(tuple.id(), 7);
        assert!(tuple.payload().is_empty());
        assert!(!tuple.is_ok());
        assert_eq!(tuple.error_message(), "manipulator 7 is not registered");
    }

    #[test]
    fn test_wire_shape_is_ordered_array() {
        let tuple = ResultTuple::with_position(1, [1.0, 2.0, 3.0, 0.0]);
        let json = serde_json::to_string(&tuple).unwrap();
        assert_eq!(json, "[1,[1.0,2.0,3.0,0.0],\"\"]");

        let tuple = ResultTuple::error(INVALID_ID, "bad payload");
        let json = serde_json::to_string(&tuple).unwrap();
        assert_eq!(json, "[-1,[],\"bad payload\"]");
    }

    #[test]
    fn test_wire_round_trip() {
        let parsed: ResultTuple = serde_json::from_str("[2,[],\"\"]").unwrap();
        assert_eq!(parsed, ResultTuple::ok(2));
    }
}
