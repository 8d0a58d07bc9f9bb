//! manipulator-link: Real-time manipulator control gateway
//!
//! This library implements a control gateway that relays device-control
//! commands from a single remote client to an underlying manipulator
//! facility over a bidirectional event channel.
//!
//! # Architecture
//!
//! The gateway admits exactly one client session at a time. Inbound events
//! arrive as newline-delimited JSON frames, are routed by event name to a
//! command handler, and are acknowledged with the (id, payload, error)
//! ResultTuple every command shares. Asynchronous operations (movement and
//! calibration) suspend only their own reply while the session keeps
//! accepting further events. All hardware interaction happens behind the
//! [`facility::DeviceFacility`] boundary; a simulated rig ships in-crate.
//!
//! # Modules
//!
//! - `protocol`: wire frames and the ResultTuple reply shape
//! - `session`: single-session admission guard
//! - `gateway`: TCP server and command router
//! - `facility`: Device Facility contract and the simulated rig
//! - `monitoring`: gateway counters and metrics export
//! - `config`: configuration parsing and validation
//! - `error`: error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod facility;
pub mod gateway;
pub mod monitoring;
pub mod protocol;
pub mod session;

// Re-export commonly used types
pub use error::{LinkError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
