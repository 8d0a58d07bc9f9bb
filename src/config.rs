//! Configuration management
//!
//! This module handles parsing and validation of the gateway's TOML
//! configuration. Every field carries a serde default, so a missing or
//! partial file still yields a runnable configuration.

use crate::error::{LinkError, Result};
use crate::protocol::ManipulatorId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "/etc/manipulator-link/config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Gateway listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Operational HTTP surface settings (health and metrics)
    #[serde(default)]
    pub http: HttpConfig,

    /// Simulated facility settings
    #[serde(default)]
    pub facility: FacilityConfig,
}

/// Gateway listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the gateway listens on
    #[serde(default = "default_server_address")]
    pub bind_address: String,

    /// Port the gateway listens on
    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// HTTP surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_http_address")]
    pub bind_address: String,

    /// Port the HTTP server binds to
    #[serde(default = "default_http_port")]
    pub port: u16,
}

/// Simulated facility configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityConfig {
    /// Manipulator ids attached to the simulated rig
    #[serde(default = "default_device_ids")]
    pub device_ids: Vec<ManipulatorId>,

    /// Upper axis travel limit in micrometers; every axis spans 0..=limit
    #[serde(default = "default_axis_limit")]
    pub axis_limit_um: f64,

    /// Duration of a simulated movement, in milliseconds
    #[serde(default = "default_motion_delay")]
    pub motion_delay_ms: u64,

    /// Duration of a simulated calibration run, in milliseconds
    #[serde(default = "default_calibration_delay")]
    pub calibration_delay_ms: u64,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            LinkError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn parse(toml: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, falling back to built-in defaults when the file
    /// does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.http.validate()?;
        self.facility.validate()
    }
}

impl ServerConfig {
    /// Combined address string for the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    fn validate(&self) -> Result<()> {
        validate_bind_address("server", &self.bind_address)
    }
}

impl HttpConfig {
    /// Combined address string for the HTTP server
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    fn validate(&self) -> Result<()> {
        validate_bind_address("http", &self.bind_address)
    }
}

impl FacilityConfig {
    /// Duration of a simulated movement
    pub fn motion_delay(&self) -> Duration {
        Duration::from_millis(self.motion_delay_ms)
    }

    /// Duration of a simulated calibration run
    pub fn calibration_delay(&self) -> Duration {
        Duration::from_millis(self.calibration_delay_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.device_ids.is_empty() {
            return Err(LinkError::Config(
                "Facility device id list cannot be empty".to_string(),
            ));
        }

        let unique: HashSet<_> = self.device_ids.iter().collect();
        if unique.len() != self.device_ids.len() {
            return Err(LinkError::Config(
                "Facility device ids must be unique".to_string(),
            ));
        }

        if !self.axis_limit_um.is_finite() || self.axis_limit_um <= 0.0 {
            return Err(LinkError::Config(format!(
                "Axis limit must be positive and finite, got {}",
                self.axis_limit_um
            )));
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_server_address(),
            port: default_server_port(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_http_address(),
            port: default_http_port(),
        }
    }
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self {
            device_ids: default_device_ids(),
            axis_limit_um: default_axis_limit(),
            motion_delay_ms: default_motion_delay(),
            calibration_delay_ms: default_calibration_delay(),
        }
    }
}

fn validate_bind_address(section: &str, address: &str) -> Result<()> {
    address.parse::<IpAddr>().map(|_| ()).map_err(|_| {
        LinkError::Config(format!(
            "Invalid {} bind address: '{}' is not an IP address",
            section, address
        ))
    })
}

// Default value functions for serde
fn default_server_address() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_http_address() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    9090
}

fn default_device_ids() -> Vec<ManipulatorId> {
    vec![1, 2, 3, 4]
}

fn default_axis_limit() -> f64 {
    20_000.0
}

fn default_motion_delay() -> u64 {
    100
}

fn default_calibration_delay() -> u64 {
    500
}
