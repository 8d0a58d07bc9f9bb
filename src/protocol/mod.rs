//! Wire protocol for the control gateway
//!
//! This module defines the event-channel frames exchanged with the remote
//! client and the Result Protocol every command reply follows.

mod frames;
mod result;

pub use frames::{
    extract_manipulator_id, EventFrame, MoveRequest, ReplyFrame, BYPASS_CALIBRATION, CALIBRATE,
    GET_POS, GOTO_POS, REGISTER_MANIPULATOR,
};
pub use result::{ManipulatorId, Position, ResultTuple, INVALID_ID};
