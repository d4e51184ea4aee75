//! LMS telemetry source — Canvas, Blackboard, Moodle.
//!
//! Maps LMS-specific interaction events onto the internal signal vocabulary
//! the signal processor understands, so the load estimator can incorporate
//! academic context (quiz pressure, overdue work, deep reading) into its
//! inference. See spec.md §6.1.
//!
//! | LMS event | internal type | signal meaning |
//! |---|---|---|
//! | `ASSIGNMENT_VIEW` | `window_change` | content navigation |
//! | `QUIZ_START` | `window_change` | high-stakes context change |
//! | `QUIZ_FAIL` | `compile_error` | task difficulty / intrinsic load |
//! | `SUBMISSION_LATE` | `compile_error` | deadline pressure |
//! | `COURSE_NAVIGATE` | `tab_switch` | context-switching rate |
//! | `LMS_SCROLL` | `scroll` | deep reading signal |

use serde_json::Value;

use crate::telemetry::event::{now_secs, TelemetryEvent};

const INTRINSIC_EVENTS: &[&str] = &["QUIZ_FAIL", "QUIZ_RETRY", "SUBMISSION_LATE", "GRADE_FAIL"];
const SWITCH_EVENTS: &[&str] = &["COURSE_NAVIGATE", "DISCUSSION_VIEW", "TAB_SWITCH"];
const WINDOW_EVENTS: &[&str] = &[
    "ASSIGNMENT_VIEW",
    "QUIZ_START",
    "QUIZ_SUBMIT",
    "RESOURCE_OPEN",
    "GRADE_VIEW",
    "ANNOUNCEMENT_VIEW",
];
const SCROLL_EVENTS: &[&str] = &["LMS_SCROLL", "RESOURCE_SCROLL"];
const IDLE_START_EVENTS: &[&str] = &["LMS_IDLE", "PAGE_HIDDEN"];
const IDLE_END_EVENTS: &[&str] = &["LMS_ACTIVE", "PAGE_VISIBLE"];

fn lms_section(raw_type: &str) -> &'static str {
    match raw_type {
        "ASSIGNMENT_VIEW" => "assignment",
        "QUIZ_START" | "QUIZ_SUBMIT" => "quiz",
        "RESOURCE_OPEN" => "resource",
        "GRADE_VIEW" => "grades",
        "ANNOUNCEMENT_VIEW" => "announcement",
        _ => "lms",
    }
}

/// Parse a raw LMS connector payload into a [`TelemetryEvent`]. Returns
/// `None` for unrecognized event types.
pub fn parse(payload: &Value) -> Option<TelemetryEvent> {
    let raw_type = payload.get("type")?.as_str()?;
    let data = payload.get("data").cloned().unwrap_or(Value::Object(Default::default()));
    let timestamp = payload.get("timestamp").and_then(Value::as_f64).unwrap_or_else(now_secs);
    let lms_platform = data.get("lms").and_then(Value::as_str).unwrap_or("lms").to_string();
    let course = data.get("course").and_then(Value::as_str).unwrap_or("unknown").to_string();
    let title = data.get("title").cloned().unwrap_or(Value::String(String::new()));

    let mut metadata = serde_json::Map::new();
    metadata.insert("lms".into(), Value::String(lms_platform.clone()));
    metadata.insert("course".into(), Value::String(course));

    if INTRINSIC_EVENTS.contains(&raw_type) {
        metadata.insert("title".into(), title);
        metadata.insert("lms_event".into(), Value::String(raw_type.to_string()));
        return Some(TelemetryEvent::new("lms", "compile_error", timestamp).with_metadata(metadata));
    }

    if SWITCH_EVENTS.contains(&raw_type) {
        metadata.insert("title".into(), title);
        metadata.insert("from_url".into(), data.get("fromUrl").cloned().unwrap_or(Value::String(String::new())));
        let to_url = data.get("toUrl").or_else(|| data.get("url")).cloned().unwrap_or(Value::String(String::new()));
        metadata.insert("to_url".into(), to_url);
        metadata.insert("lms_event".into(), Value::String(raw_type.to_string()));
        return Some(TelemetryEvent::new("lms", "tab_switch", timestamp).with_metadata(metadata));
    }

    if WINDOW_EVENTS.contains(&raw_type) {
        metadata.insert("app".into(), Value::String(format!("{lms_platform}:{}", lms_section(raw_type))));
        metadata.insert("title".into(), title);
        metadata.insert("lms_event".into(), Value::String(raw_type.to_string()));
        return Some(TelemetryEvent::new("lms", "window_change", timestamp).with_metadata(metadata));
    }

    if SCROLL_EVENTS.contains(&raw_type) {
        metadata.insert("delta_y".into(), data.get("deltaY").cloned().unwrap_or(Value::from(0)));
        metadata.insert("lms_event".into(), Value::String(raw_type.to_string()));
        return Some(TelemetryEvent::new("lms", "scroll", timestamp).with_metadata(metadata));
    }

    if IDLE_START_EVENTS.contains(&raw_type) {
        return Some(TelemetryEvent::new("lms", "idle_start", timestamp).with_metadata(metadata));
    }

    if IDLE_END_EVENTS.contains(&raw_type) {
        return Some(TelemetryEvent::new("lms", "idle_end", timestamp).with_metadata(metadata));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_type_is_dropped() {
        assert!(parse(&json!({"type": "NOT_REAL"})).is_none());
    }

    #[test]
    fn quiz_fail_is_intrinsic_load() {
        let event = parse(&json!({"type": "QUIZ_FAIL", "data": {"course": "CS 101"}})).unwrap();
        assert_eq!(event.event_type, "compile_error");
        assert_eq!(event.metadata.get("course").unwrap(), "CS 101");
    }

    #[test]
    fn quiz_start_maps_to_window_change_with_section_label() {
        let event = parse(&json!({"type": "QUIZ_START", "data": {"lms": "canvas"}})).unwrap();
        assert_eq!(event.event_type, "window_change");
        assert_eq!(event.app(), "canvas:quiz");
    }

    #[test]
    fn course_navigate_is_tab_switch() {
        let event = parse(&json!({"type": "COURSE_NAVIGATE", "data": {}})).unwrap();
        assert_eq!(event.event_type, "tab_switch");
    }

    #[test]
    fn lms_scroll_carries_delta_y() {
        let event = parse(&json!({"type": "LMS_SCROLL", "data": {"deltaY": 900}})).unwrap();
        assert_eq!(event.event_type, "scroll");
        assert_eq!(event.delta_y(), 900.0);
    }

    #[test]
    fn lms_idle_and_active_round_trip() {
        let idle = parse(&json!({"type": "LMS_IDLE"})).unwrap();
        let active = parse(&json!({"type": "LMS_ACTIVE"})).unwrap();
        assert_eq!(idle.event_type, "idle_start");
        assert_eq!(active.event_type, "idle_end");
    }
}
