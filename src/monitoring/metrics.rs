//! Metrics collection and export
//!
//! Prometheus-style metrics for the gateway, exported as text over the
//! `/metrics` endpoint and as JSON for programmatic consumers.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Metric type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    /// Sessions admitted since startup
    SessionsAccepted,
    /// Connection attempts refused while a session was active
    SessionsRejected,
    /// Commands dispatched to a handler
    CommandsHandled,
    /// Commands that ended in an error reply
    CommandFailures,
    /// Events with no registered handler
    UnknownEvents,
    /// Frames that did not parse as an event envelope
    ProtocolErrors,
    /// Calibration commands that completed successfully
    CalibrationsCompleted,
    /// Calibration commands that ended in an error reply
    CalibrationsFailed,
    /// Uptime of the current session in seconds
    SessionUptime,
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionsAccepted => write!(f, "manipulator_link_sessions_accepted_total"),
            Self::SessionsRejected => write!(f, "manipulator_link_sessions_rejected_total"),
            Self::CommandsHandled => write!(f, "manipulator_link_commands_handled_total"),
            Self::CommandFailures => write!(f, "manipulator_link_command_failures_total"),
            Self::UnknownEvents => write!(f, "manipulator_link_unknown_events_total"),
            Self::ProtocolErrors => write!(f, "manipulator_link_protocol_errors_total"),
            Self::CalibrationsCompleted => {
                write!(f, "manipulator_link_calibrations_completed_total")
            }
            Self::CalibrationsFailed => write!(f, "manipulator_link_calibrations_failed_total"),
            Self::SessionUptime => write!(f, "manipulator_link_session_uptime_seconds"),
        }
    }
}

impl MetricType {
    /// Get metric help text
    pub fn help_text(&self) -> &'static str {
        match self {
            Self::SessionsAccepted => "Total client sessions admitted by the gateway",
            Self::SessionsRejected => {
                "Total connection attempts refused because a session was active"
            }
            Self::CommandsHandled => "Total commands dispatched to a handler",
            Self::CommandFailures => "Total commands that ended in an error reply",
            Self::UnknownEvents => "Total events received with no registered handler",
            Self::ProtocolErrors => "Total frames that did not parse as an event envelope",
            Self::CalibrationsCompleted => "Total calibration commands completed successfully",
            Self::CalibrationsFailed => "Total calibration commands that failed",
            Self::SessionUptime => "Uptime of the currently attached session in seconds",
        }
    }

    /// Get metric kind (counter or gauge)
    pub fn metric_kind(&self) -> &'static str {
        match self {
            Self::SessionUptime => "gauge",
            _ => "counter",
        }
    }
}

/// A recorded metric sample
#[derive(Debug, Clone, Copy)]
pub struct MetricValue {
    /// Most recent value
    pub value: f64,
    /// When the value was recorded
    pub recorded_at: Instant,
}

impl MetricValue {
    fn now(value: f64) -> Self {
        Self {
            value,
            recorded_at: Instant::now(),
        }
    }

    /// Time elapsed since this sample was recorded
    pub fn age(&self) -> Duration {
        self.recorded_at.elapsed()
    }
}

/// Thread-safe registry of the gateway's metric samples
pub struct MetricsCollector {
    values: RwLock<HashMap<MetricType, MetricValue>>,
}

impl MetricsCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Record the current value of a metric
    pub fn record(&self, metric_type: MetricType, value: f64) {
        self.values
            .write()
            .unwrap()
            .insert(metric_type, MetricValue::now(value));
    }

    /// Last recorded sample for a metric, if any
    pub fn get(&self, metric_type: MetricType) -> Option<MetricValue> {
        self.values.read().unwrap().get(&metric_type).copied()
    }

    /// Export metrics in Prometheus text format, sorted by metric name
    pub fn export_prometheus(&self) -> String {
        let values = self.values.read().unwrap();
        let mut entries: Vec<_> = values.iter().collect();
        entries.sort_by_key(|(metric_type, _)| metric_type.to_string());

        let mut output = String::new();
        for (metric_type, sample) in entries {
            output.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} {kind}\n{name} {value}\n",
                name = metric_type,
                help = metric_type.help_text(),
                kind = metric_type.metric_kind(),
                value = sample.value,
            ));
        }

        output
    }

    /// Export all metrics as JSON
    pub fn export_json(&self) -> serde_json::Value {
        let values = self.values.read().unwrap();
        let map: serde_json::Map<String, serde_json::Value> = values
            .iter()
            .map(|(metric_type, sample)| {
                (
                    metric_type.to_string(),
                    serde_json::json!({
                        "value": sample.value,
                        "age_seconds": sample.age().as_secs(),
                    }),
                )
            })
            .collect();

        serde_json::Value::Object(map)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
