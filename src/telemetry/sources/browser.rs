//! Browser extension telemetry receiver. See spec.md §6.1.

use serde_json::Value;

use crate::telemetry::event::TelemetryEvent;

fn internal_type(raw_type: &str) -> Option<&'static str> {
    Some(match raw_type {
        "TAB_SWITCH" | "TAB_CLOSE" => "tab_switch",
        "NAVIGATION" => "navigation",
        "PAGE_SCROLL" => "scroll",
        "FOCUS_LOST" | "FOCUS_GAINED" => "window_change",
        "IDLE_START" => "idle_start",
        "IDLE_END" => "idle_end",
        _ => return None,
    })
}

const ACADEMIC_DOMAINS: &[&str] = &[
    "scholar.google.com",
    "arxiv.org",
    "pubmed.ncbi.nlm.nih.gov",
    "jstor.org",
    "semanticscholar.org",
    "coursera.org",
    "edx.org",
    "khanacademy.org",
    "stackoverflow.com",
    "docs.python.org",
    "developer.mozilla.org",
];

/// Heuristic academic-URL detector. Parses just enough of the URL to get the
/// host, strips a leading `www.`, and matches against [`ACADEMIC_DOMAINS`]
/// exactly or as a subdomain.
fn is_academic_url(url: &str) -> bool {
    let after_scheme = url.split("://").nth(1).unwrap_or(url);
    let host_and_rest = after_scheme.split(['/', '?', '#']).next().unwrap_or("");
    let host = host_and_rest.split('@').last().unwrap_or(host_and_rest);
    let host = host.split(':').next().unwrap_or(host).to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.is_empty() {
        return false;
    }
    ACADEMIC_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

/// Parse a raw browser-extension payload into a [`TelemetryEvent`]. Returns
/// `None` for unrecognized event types.
pub fn parse(payload: &Value) -> Option<TelemetryEvent> {
    let raw_type = payload.get("type")?.as_str()?;
    let event_type = internal_type(raw_type)?;

    let data = payload.get("data").cloned().unwrap_or(Value::Object(Default::default()));
    let timestamp = payload
        .get("timestamp")
        .and_then(Value::as_f64)
        .unwrap_or_else(|| crate::telemetry::event::now_secs());

    let mut metadata = serde_json::Map::new();
    match event_type {
        "tab_switch" => {
            let to_url = data.get("toUrl").and_then(Value::as_str).unwrap_or("").to_string();
            metadata.insert("from_url".into(), data.get("fromUrl").cloned().unwrap_or(Value::String(String::new())));
            metadata.insert("to_url".into(), Value::String(to_url.clone()));
            metadata.insert("is_academic".into(), Value::Bool(is_academic_url(&to_url)));
        }
        "scroll" => {
            metadata.insert("delta_y".into(), data.get("deltaY").cloned().unwrap_or(Value::from(0)));
            metadata.insert("url".into(), data.get("url").cloned().unwrap_or(Value::String(String::new())));
        }
        "navigation" => {
            let url = data.get("url").and_then(Value::as_str).unwrap_or("").to_string();
            metadata.insert("url".into(), Value::String(url.clone()));
            metadata.insert("is_academic".into(), Value::Bool(is_academic_url(&url)));
        }
        _ => {}
    }

    Some(TelemetryEvent::new("browser", event_type, timestamp).with_metadata(metadata))
}
