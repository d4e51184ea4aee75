//! The immutable telemetry event that flows from producers into the signal
//! processor. See spec.md §3.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Seconds since epoch, used as the default timestamp when a producer's
/// payload doesn't carry one.
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs_f64()
}

/// One raw (already source-normalized) telemetry event.
///
/// Immutable once constructed: producers build it, the aggregator forwards
/// it by value, the signal processor only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryEvent {
    pub source: String,
    pub event_type: String,
    /// Seconds since epoch.
    pub timestamp: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl TelemetryEvent {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, timestamp: f64) -> Self {
        Self {
            source: source.into(),
            event_type: event_type.into(),
            timestamp,
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// `metadata.interval_ms` as an `f64`, or `0.0` if absent/non-numeric.
    pub fn interval_ms(&self) -> f64 {
        self.metadata.get("interval_ms").and_then(Value::as_f64).unwrap_or(0.0)
    }

    /// `metadata.delta_y` as an `f64`, or `0.0` if absent/non-numeric.
    pub fn delta_y(&self) -> f64 {
        self.metadata.get("delta_y").and_then(Value::as_f64).unwrap_or(0.0)
    }

    /// `metadata.app`, or `"unknown"` if absent.
    pub fn app(&self) -> &str {
        self.metadata.get("app").and_then(Value::as_str).unwrap_or("unknown")
    }
}
