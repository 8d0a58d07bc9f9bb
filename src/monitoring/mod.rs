//! Monitoring and observability
//!
//! This module provides the gateway's activity counters and metrics. One
//! [`Monitor`] is shared between the accept loop, the command router and
//! the HTTP surface; everything it records is visible as a
//! [`GatewayStats`] snapshot and through the Prometheus export.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

mod metrics;

pub use metrics::{MetricType, MetricValue, MetricsCollector};

/// Point-in-time snapshot of gateway activity
#[derive(Debug, Clone, Default)]
pub struct GatewayStats {
    /// Sessions admitted since startup
    pub sessions_accepted: u64,
    /// Connection attempts refused because a session was active
    pub sessions_rejected: u64,
    /// Whether a client session is currently attached
    pub session_active: bool,
    /// When the current session attached
    pub attached_at: Option<Instant>,
    /// Commands dispatched to a handler
    pub commands_handled: u64,
    /// Commands that ended in an error reply
    pub command_failures: u64,
    /// Events received with no registered handler
    pub unknown_events: u64,
    /// Frames that did not parse as an event envelope
    pub protocol_errors: u64,
    /// Calibration commands that completed successfully
    pub calibrations_completed: u64,
    /// Calibration commands that ended in an error reply
    pub calibrations_failed: u64,
}

impl GatewayStats {
    /// How long the current session has been attached
    pub fn session_uptime(&self) -> Option<Duration> {
        if !self.session_active {
            return None;
        }
        self.attached_at.map(|t| t.elapsed())
    }

    /// Percentage of handled commands that succeeded
    pub fn command_success_rate(&self) -> f64 {
        if self.commands_handled == 0 {
            return 0.0;
        }
        let successes = self.commands_handled - self.command_failures;
        (successes as f64) / (self.commands_handled as f64) * 100.0
    }
}

/// Monitor for tracking gateway activity
pub struct Monitor {
    /// Gateway counters
    stats: RwLock<GatewayStats>,
    /// Metrics collector
    metrics: Arc<MetricsCollector>,
}

impl Monitor {
    /// Create a new monitor with zeroed counters
    pub fn new() -> Self {
        Self {
            stats: RwLock::new(GatewayStats::default()),
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    /// Record an admitted session
    pub fn record_session_attached(&self) {
        let mut stats = self.stats.write().unwrap();
        stats.sessions_accepted += 1;
        stats.session_active = true;
        stats.attached_at = Some(Instant::now());
        self.metrics
            .record(MetricType::SessionsAccepted, stats.sessions_accepted as f64);
        debug!("Recorded session attach");
    }

    /// Record a refused connection attempt
    pub fn record_session_rejected(&self) {
        let mut stats = self.stats.write().unwrap();
        stats.sessions_rejected += 1;
        self.metrics
            .record(MetricType::SessionsRejected, stats.sessions_rejected as f64);
    }

    /// Record the active session detaching
    pub fn record_session_detached(&self) {
        let mut stats = self.stats.write().unwrap();
        stats.session_active = false;
        stats.attached_at = None;
        debug!("Recorded session detach");
    }

    /// Record a handled command and whether it succeeded
    pub fn record_command(&self, success: bool) {
        let mut stats = self.stats.write().unwrap();
        stats.commands_handled += 1;
        self.metrics
            .record(MetricType::CommandsHandled, stats.commands_handled as f64);
        if !success {
            stats.command_failures += 1;
            self.metrics
                .record(MetricType::CommandFailures, stats.command_failures as f64);
        }
    }

    /// Record an event with no registered handler
    pub fn record_unknown_event(&self) {
        let mut stats = self.stats.write().unwrap();
        stats.unknown_events += 1;
        self.metrics
            .record(MetricType::UnknownEvents, stats.unknown_events as f64);
    }

    /// Record a frame that did not parse as an event envelope
    pub fn record_protocol_error(&self) {
        let mut stats = self.stats.write().unwrap();
        stats.protocol_errors += 1;
        self.metrics
            .record(MetricType::ProtocolErrors, stats.protocol_errors as f64);
    }

    /// Record a calibration outcome
    pub fn record_calibration(&self, success: bool) {
        let mut stats = self.stats.write().unwrap();
        if success {
            stats.calibrations_completed += 1;
            self.metrics.record(
                MetricType::CalibrationsCompleted,
                stats.calibrations_completed as f64,
            );
        } else {
            stats.calibrations_failed += 1;
            self.metrics.record(
                MetricType::CalibrationsFailed,
                stats.calibrations_failed as f64,
            );
        }
    }

    /// Snapshot the current counters
    pub fn snapshot(&self) -> GatewayStats {
        self.stats.read().unwrap().clone()
    }

    /// Handle to the metrics collector
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        Arc::clone(&self.metrics)
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}
