//! VSCode extension telemetry receiver. See spec.md §6.1.

use serde_json::Value;

use crate::telemetry::event::{now_secs, TelemetryEvent};

fn internal_type(raw_type: &str) -> Option<&'static str> {
    Some(match raw_type {
        "COMPILE_ERROR" => "compile_error",
        "COMPILE_SUCCESS" => "compile_success",
        "FILE_SAVE" => "file_save",
        "FILE_SWITCH" => "window_change",
        "KEYSTROKE" => "keystroke",
        "DEBUG_START" => "debug_start",
        "DEBUG_STOP" => "debug_stop",
        // Treat test failure the same as a compile error for load purposes.
        "TEST_FAIL" => "compile_error",
        "TEST_PASS" => "compile_success",
        "TERMINAL_CMD" => "terminal_cmd",
        _ => return None,
    })
}

/// Parse a raw VSCode-extension payload into a [`TelemetryEvent`]. Returns
/// `None` for unrecognized event types.
pub fn parse(payload: &Value) -> Option<TelemetryEvent> {
    let raw_type = payload.get("type")?.as_str()?;
    let event_type = internal_type(raw_type)?;

    let data = payload.get("data").cloned().unwrap_or(Value::Object(Default::default()));
    let timestamp = payload.get("timestamp").and_then(Value::as_f64).unwrap_or_else(now_secs);

    let mut metadata = serde_json::Map::new();
    metadata.insert(
        "language".into(),
        data.get("language").cloned().unwrap_or(Value::String("unknown".into())),
    );

    match event_type {
        "compile_error" => {
            metadata.insert("error_count".into(), data.get("errorCount").cloned().unwrap_or(Value::from(1)));
            metadata.insert("file".into(), data.get("file").cloned().unwrap_or(Value::String(String::new())));
        }
        "keystroke" => {
            metadata.insert("interval_ms".into(), data.get("intervalMs").cloned().unwrap_or(Value::from(0)));
        }
        "window_change" => {
            metadata.insert("app".into(), Value::String("vscode".into()));
            metadata.insert("file".into(), data.get("file").cloned().unwrap_or(Value::String(String::new())));
        }
        "terminal_cmd" => {
            metadata.insert("command".into(), data.get("command").cloned().unwrap_or(Value::String(String::new())));
        }
        _ => {}
    }

    Some(TelemetryEvent::new("ide", event_type, timestamp).with_metadata(metadata))
}
