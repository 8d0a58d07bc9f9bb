//! Device Facility boundary
//!
//! The gateway core never touches hardware directly. Every command handler
//! calls through the [`DeviceFacility`] trait, which a driver crate is
//! expected to implement against the real manipulator SDK. This crate ships
//! one implementation, the [`SimulatedFacility`], so the binary runs and the
//! test suite can exercise every path without a rig attached.

mod simulated;

pub use simulated::SimulatedFacility;

use crate::protocol::{ManipulatorId, Position};
use async_trait::async_trait;
use thiserror::Error;

/// Device-level failure reported by the facility
///
/// These never propagate as process errors; the command router translates
/// them 1:1 into the error string of the ResultTuple sent to the client.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FacilityError {
    /// The rig has no manipulator with this id
    #[error("Manipulator {0} is not attached to the rig")]
    NotAttached(ManipulatorId),

    /// The manipulator was already registered in this session
    #[error("Manipulator {0} is already registered")]
    AlreadyRegistered(ManipulatorId),

    /// The command targets a manipulator that was never registered
    #[error("Manipulator {0} is not registered")]
    NotRegistered(ManipulatorId),

    /// A movement target lies outside the axis travel
    #[error("Target position is outside axis travel (0..{limit_um} um) for manipulator {id}")]
    OutOfRange {
        /// Manipulator the move was addressed to
        id: ManipulatorId,
        /// Upper travel limit of every axis, in micrometers
        limit_um: f64,
    },

    /// Movement speed must be a positive, finite value
    #[error("Movement speed must be positive, got {0}")]
    InvalidSpeed(f64),

    /// Another operation is already in progress on this manipulator
    #[error("Manipulator {0} is busy with another operation")]
    Busy(ManipulatorId),

    /// The calibration routine did not complete
    #[error("Calibration failed for manipulator {0}")]
    CalibrationFailed(ManipulatorId),

    /// Device fault with no more specific category
    #[error("Device error: {0}")]
    Device(String),
}

/// Contract the gateway requires from manipulator hardware
///
/// `move_to` and `start_calibration` suspend until the hardware reports
/// completion; the remaining methods complete immediately. Implementations
/// own all per-manipulator state; the gateway holds none of it across
/// requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceFacility: Send + Sync {
    /// Register a manipulator for use in the current session
    async fn register(&self, id: ManipulatorId) -> Result<(), FacilityError>;

    /// Report the current position of a registered manipulator
    async fn get_position(&self, id: ManipulatorId) -> Result<Position, FacilityError>;

    /// Move a manipulator to `target`, resolving with the reached position
    /// once motion has finished
    async fn move_to(
        &self,
        id: ManipulatorId,
        target: Position,
        speed: f64,
    ) -> Result<Position, FacilityError>;

    /// Run the calibration routine, resolving when the hardware signals
    /// completion
    async fn start_calibration(&self, id: ManipulatorId) -> Result<(), FacilityError>;

    /// Mark a manipulator calibrated without running the routine
    async fn bypass_calibration(&self, id: ManipulatorId) -> Result<(), FacilityError>;

    /// Clear all per-session device bookkeeping; called on disconnect
    async fn reset_all(&self);
}
