//! Simulated device facility
//!
//! An in-memory rig model implementing [`DeviceFacility`]. It tracks the
//! same per-manipulator state a hardware driver would (registration,
//! position, calibration, an in-flight operation flag) and sleeps for the
//! configured durations where real hardware would move or calibrate. The
//! binary uses it as the default facility; the integration tests drive the
//! whole gateway through it.

use crate::config::FacilityConfig;
use crate::facility::{DeviceFacility, FacilityError};
use crate::protocol::{ManipulatorId, Position};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// State the simulator tracks per registered manipulator
#[derive(Debug, Clone, Default)]
struct ManipulatorState {
    position: Position,
    calibrated: bool,
    busy: bool,
}

/// In-memory implementation of the Device Facility
pub struct SimulatedFacility {
    /// Manipulator ids physically present on the rig
    attached: HashSet<ManipulatorId>,
    /// Upper travel limit for every axis, in micrometers
    axis_limit_um: f64,
    /// How long a simulated movement takes
    motion_delay: Duration,
    /// How long a simulated calibration run takes
    calibration_delay: Duration,
    /// Registered manipulators and their state
    registered: Mutex<HashMap<ManipulatorId, ManipulatorState>>,
    /// Ids whose next calibration run is forced to fail
    fail_calibration: Mutex<HashSet<ManipulatorId>>,
}

impl SimulatedFacility {
    /// Create a simulated rig from facility configuration
    pub fn new(config: &FacilityConfig) -> Self {
        Self {
            attached: config.device_ids.iter().copied().collect(),
            axis_limit_um: config.axis_limit_um,
            motion_delay: config.motion_delay(),
            calibration_delay: config.calibration_delay(),
            registered: Mutex::new(HashMap::new()),
            fail_calibration: Mutex::new(HashSet::new()),
        }
    }

    /// Force the next calibration run for `id` to fail
    pub async fn fail_calibration_for(&self, id: ManipulatorId) {
        self.fail_calibration.lock().await.insert(id);
    }

    /// Whether `id` is currently registered
    pub async fn is_registered(&self, id: ManipulatorId) -> bool {
        self.registered.lock().await.contains_key(&id)
    }

    /// Whether `id` has completed (or bypassed) calibration
    pub async fn is_calibrated(&self, id: ManipulatorId) -> bool {
        self.registered
            .lock()
            .await
            .get(&id)
            .map(|state| state.calibrated)
            .unwrap_or(false)
    }

    fn check_target(&self, id: ManipulatorId, target: &Position) -> Result<(), FacilityError> {
        let in_travel = |coord: &f64| (0.0..=self.axis_limit_um).contains(coord);
        if target.iter().all(in_travel) {
            Ok(())
        } else {
            Err(FacilityError::OutOfRange {
                id,
                limit_um: self.axis_limit_um,
            })
        }
    }
}

impl Default for SimulatedFacility {
    fn default() -> Self {
        Self::new(&FacilityConfig::default())
    }
}

#[async_trait]
impl DeviceFacility for SimulatedFacility {
    async fn register(&self, id: ManipulatorId) -> Result<(), FacilityError> {
        if !self.attached.contains(&id) {
            return Err(FacilityError::NotAttached(id));
        }

        let mut registered = self.registered.lock().await;
        if registered.contains_key(&id) {
            return Err(FacilityError::AlreadyRegistered(id));
        }

        registered.insert(id, ManipulatorState::default());
        info!("Registered manipulator {}", id);
        Ok(())
    }

    async fn get_position(&self, id: ManipulatorId) -> Result<Position, FacilityError> {
        let registered = self.registered.lock().await;
        registered
            .get(&id)
            .map(|state| state.position)
            .ok_or(FacilityError::NotRegistered(id))
    }

    async fn move_to(
        &self,
        id: ManipulatorId,
        target: Position,
        speed: f64,
    ) -> Result<Position, FacilityError> {
        {
            let mut registered = self.registered.lock().await;
            let state = registered
                .get_mut(&id)
                .ok_or(FacilityError::NotRegistered(id))?;
            if state.busy {
                return Err(FacilityError::Busy(id));
            }
            if !speed.is_finite() || speed <= 0.0 {
                return Err(FacilityError::InvalidSpeed(speed));
            }
            self.check_target(id, &target)?;
            state.busy = true;
        }

        debug!("Moving manipulator {} to {:?} at speed {}", id, target, speed);
        tokio::time::sleep(self.motion_delay).await;

        // The session may have disconnected and reset the rig mid-move
        let mut registered = self.registered.lock().await;
        let state = registered
            .get_mut(&id)
            .ok_or(FacilityError::NotRegistered(id))?;
        state.busy = false;
        state.position = target;
        Ok(target)
    }

    async fn start_calibration(&self, id: ManipulatorId) -> Result<(), FacilityError> {
        {
            let mut registered = self.registered.lock().await;
            let state = registered
                .get_mut(&id)
                .ok_or(FacilityError::NotRegistered(id))?;
            if state.busy {
                return Err(FacilityError::Busy(id));
            }
            state.busy = true;
        }

        debug!("Calibrating manipulator {}", id);
        tokio::time::sleep(self.calibration_delay).await;

        let failed = self.fail_calibration.lock().await.remove(&id);
        let mut registered = self.registered.lock().await;
        let state = registered
            .get_mut(&id)
            .ok_or(FacilityError::NotRegistered(id))?;
        state.busy = false;
        if failed {
            return Err(FacilityError::CalibrationFailed(id));
        }
        state.calibrated = true;
        info!("Manipulator {} calibrated", id);
        Ok(())
    }

    async fn bypass_calibration(&self, id: ManipulatorId) -> Result<(), FacilityError> {
        let mut registered = self.registered.lock().await;
        let state = registered
            .get_mut(&id)
            .ok_or(FacilityError::NotRegistered(id))?;
        state.calibrated = true;
        info!("Calibration bypassed for manipulator {}", id);
        Ok(())
    }

    async fn reset_all(&self) {
        self.registered.lock().await.clear();
        self.fail_calibration.lock().await.clear();
        info!("Facility state reset");
    }
}
