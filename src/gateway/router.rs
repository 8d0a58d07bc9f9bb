//! Command router
//!
//! Maps inbound event names to handlers. Each handler validates its payload
//! before touching the facility, and every fault (malformed payload or
//! facility error) ends in a ResultTuple reply so a single bad command can
//! never take the connection down. Events without a handler are logged and
//! dropped without a reply.

use crate::facility::DeviceFacility;
use crate::monitoring::Monitor;
use crate::protocol::{
    self, extract_manipulator_id, EventFrame, ManipulatorId, MoveRequest, ReplyFrame, ResultTuple,
    INVALID_ID,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Command router dispatching inbound events to the Device Facility
pub struct CommandRouter {
    /// Facility boundary all handlers call into
    facility: Arc<dyn DeviceFacility>,
    /// Shared activity monitor
    monitor: Arc<Monitor>,
}

impl CommandRouter {
    /// Create a new router over the given facility
    pub fn new(facility: Arc<dyn DeviceFacility>, monitor: Arc<Monitor>) -> Self {
        Self { facility, monitor }
    }

    /// Dispatch one inbound event frame.
    ///
    /// Returns the reply to send, or `None` for events with no registered
    /// handler (those are logged and counted, never acknowledged).
    pub async fn dispatch(&self, frame: EventFrame) -> Option<ReplyFrame> {
        debug!("Dispatching event '{}'", frame.event);

        let result = match frame.event.as_str() {
            protocol::REGISTER_MANIPULATOR => self.handle_register(&frame.data).await,
            protocol::GET_POS => self.handle_get_pos(&frame.data).await,
            protocol::GOTO_POS => self.handle_goto_pos(&frame.data).await,
            protocol::CALIBRATE => self.handle_calibrate(&frame.data).await,
            protocol::BYPASS_CALIBRATION => self.handle_bypass_calibration(&frame.data).await,
            unknown => {
                info!("Ignoring unknown event '{}'", unknown);
                self.monitor.record_unknown_event();
                return None;
            }
        };

        if result.is_ok() {
            info!(
                "Event '{}' completed for manipulator {}",
                frame.event,
                result.id()
            );
        } else {
            warn!(
                "Event '{}' failed for manipulator {}: {}",
                frame.event,
                result.id(),
                result.error_message()
            );
        }

        self.monitor.record_command(result.is_ok());
        if frame.event == protocol::CALIBRATE {
            self.monitor.record_calibration(result.is_ok());
        }

        Some(ReplyFrame::new(frame.event, result))
    }

    async fn handle_register(&self, data: &Value) -> ResultTuple {
        let id = match parse_id(data) {
            Ok(id) => id,
            Err(reply) => return reply,
        };

        match self.facility.register(id).await {
            Ok(()) => ResultTuple::ok(id),
            Err(e) => ResultTuple::error(id, e.to_string()),
        }
    }

    async fn handle_get_pos(&self, data: &Value) -> ResultTuple {
        let id = match parse_id(data) {
            Ok(id) => id,
            Err(reply) => return reply,
        };

        match self.facility.get_position(id).await {
            Ok(pos) => ResultTuple::with_position(id, pos),
            Err(e) => ResultTuple::error(id, e.to_string()),
        }
    }

    async fn handle_goto_pos(&self, data: &Value) -> ResultTuple {
        let request = match parse_move(data) {
            Ok(request) => request,
            Err(reply) => return reply,
        };

        match self
            .facility
            .move_to(request.manipulator_id, request.pos, request.speed)
            .await
        {
            Ok(pos) => ResultTuple::with_position(request.manipulator_id, pos),
            Err(e) => ResultTuple::error(request.manipulator_id, e.to_string()),
        }
    }

    async fn handle_calibrate(&self, data: &Value) -> ResultTuple {
        let id = match parse_id(data) {
            Ok(id) => id,
            Err(reply) => return reply,
        };

        match self.facility.start_calibration(id).await {
            Ok(()) => ResultTuple::ok(id),
            Err(e) => ResultTuple::error(id, e.to_string()),
        }
    }

    async fn handle_bypass_calibration(&self, data: &Value) -> ResultTuple {
        let id = match parse_id(data) {
            Ok(id) => id,
            Err(reply) => return reply,
        };

        match self.facility.bypass_calibration(id).await {
            Ok(()) => ResultTuple::ok(id),
            Err(e) => ResultTuple::error(id, e.to_string()),
        }
    }
}

/// Parse a bare integer manipulator id payload.
///
/// On failure the error reply echoes whatever id could be recovered from
/// the payload, falling back to the sentinel invalid id.
fn parse_id(data: &Value) -> Result<ManipulatorId, ResultTuple> {
    data.as_i64()
        .and_then(|raw| ManipulatorId::try_from(raw).ok())
        .ok_or_else(|| {
            let echoed = extract_manipulator_id(data).unwrap_or(INVALID_ID);
            ResultTuple::error(
                echoed,
                format!("Expected an integer manipulator id, got {}", data),
            )
        })
}

/// Parse a `goto_pos` payload
fn parse_move(data: &Value) -> Result<MoveRequest, ResultTuple> {
    serde_json::from_value(data.clone()).map_err(|e| {
        let echoed = extract_manipulator_id(data).unwrap_or(INVALID_ID);
        ResultTuple::error(echoed, format!("Invalid goto_pos payload: {}", e))
    })
}
