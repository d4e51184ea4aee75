//! Desktop agent telemetry receiver (active window monitoring, interaction
//! rhythm). See spec.md §6.1.

use serde_json::Value;

use crate::telemetry::event::{now_secs, TelemetryEvent};

fn internal_type(raw_type: &str) -> Option<&'static str> {
    Some(match raw_type {
        "WINDOW_FOCUS" | "WINDOW_BLUR" => "window_change",
        "MOUSE_IDLE" | "SCREEN_LOCK" => "idle_start",
        "MOUSE_ACTIVE" | "SCREEN_UNLOCK" => "idle_end",
        _ => return None,
    })
}

/// Parse a raw desktop-agent payload into a [`TelemetryEvent`]. Returns
/// `None` for unrecognized event types.
pub fn parse(payload: &Value) -> Option<TelemetryEvent> {
    let raw_type = payload.get("type")?.as_str()?;
    let event_type = internal_type(raw_type)?;

    let data = payload.get("data").cloned().unwrap_or(Value::Object(Default::default()));
    let timestamp = payload.get("timestamp").and_then(Value::as_f64).unwrap_or_else(now_secs);

    let mut metadata = serde_json::Map::new();
    if event_type == "window_change" {
        metadata.insert("app".into(), data.get("app").cloned().unwrap_or(Value::String("unknown".into())));
        metadata.insert("title".into(), data.get("title").cloned().unwrap_or(Value::String(String::new())));
    }

    Some(TelemetryEvent::new("desktop", event_type, timestamp).with_metadata(metadata))
}
