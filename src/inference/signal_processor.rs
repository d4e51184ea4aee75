//! Signal Processor — maintains a sliding window of telemetry events and
//! derives a normalized feature vector on demand. See spec.md §4.1.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::telemetry::event::TelemetryEvent;

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs_f64()
}

/// Normalized feature vector for the inference window.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct SignalFeatures {
    pub tab_switch_rate: f64,
    pub compile_error_rate: f64,
    pub window_change_rate: f64,
    pub typing_burst_score: f64,
    pub idle_fraction: f64,
    pub scroll_velocity_norm: f64,
    pub session_duration_min: f64,
    pub task_switch_entropy: f64,
}

impl Default for SignalFeatures {
    fn default() -> Self {
        Self {
            tab_switch_rate: 0.0,
            compile_error_rate: 0.0,
            window_change_rate: 0.0,
            typing_burst_score: 0.0,
            idle_fraction: 0.0,
            scroll_velocity_norm: 0.0,
            session_duration_min: 0.0,
            task_switch_entropy: 0.0,
        }
    }
}

/// Maintains a sliding window of telemetry events and derives normalized
/// feature vectors on demand.
///
/// Not `Sync` by itself — the aggregator guards it behind a single mutex per
/// spec.md §5's shared-resource policy.
pub struct SignalProcessor {
    window_seconds: u64,
    events: VecDeque<TelemetryEvent>,
    session_start: f64,
}

impl SignalProcessor {
    pub fn new(window_seconds: u64) -> Self {
        Self {
            window_seconds,
            events: VecDeque::new(),
            session_start: now_secs(),
        }
    }

    /// Enqueue `event`, then evict anything older than `now - window_seconds`.
    pub fn push(&mut self, event: TelemetryEvent) {
        self.events.push_back(event);
        self.evict_stale();
    }

    /// Evict stale events, then compute features over the live window.
    pub fn extract_features(&mut self) -> SignalFeatures {
        self.evict_stale();

        let window_min = self.window_seconds as f64 / 60.0;
        let elapsed_min = (now_secs() - self.session_start).max(0.0) / 60.0;
        // Observed session span up to the configured window, floored to 1 minute
        // so early-session rates aren't inflated by a near-zero denominator.
        let rate_window_min = window_min.min(elapsed_min).max(1.0);

        SignalFeatures {
            tab_switch_rate: self.count("tab_switch") / rate_window_min,
            compile_error_rate: self.count("compile_error") / rate_window_min,
            window_change_rate: self.count("window_change") / rate_window_min,
            typing_burst_score: self.typing_burst(),
            idle_fraction: self.idle_fraction(),
            scroll_velocity_norm: self.scroll_velocity(),
            session_duration_min: (now_secs() - self.session_start) / 60.0,
            task_switch_entropy: self.app_entropy(),
        }
    }

    /// Reset the session clock used by rate normalization and
    /// `session_duration_min`.
    pub fn reset_session(&mut self) {
        self.session_start = now_secs();
    }

    fn evict_stale(&mut self) {
        let cutoff = now_secs() - self.window_seconds as f64;
        while matches!(self.events.front(), Some(e) if e.timestamp < cutoff) {
            self.events.pop_front();
        }
    }

    fn count(&self, event_type: &str) -> f64 {
        self.events.iter().filter(|e| e.event_type == event_type).count() as f64
    }

    fn typing_burst(&self) -> f64 {
        let intervals: Vec<f64> = self
            .events
            .iter()
            .filter(|e| e.event_type == "keystroke" && e.metadata.contains_key("interval_ms"))
            .map(|e| e.interval_ms())
            .collect();
        if intervals.len() < 2 {
            return 0.0;
        }
        let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
        if mean == 0.0 {
            return 0.0;
        }
        let variance =
            intervals.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / intervals.len() as f64;
        (variance.sqrt() / mean).min(1.0)
    }

    fn idle_fraction(&self) -> f64 {
        let idle_events = self.events.iter().filter(|e| e.event_type == "idle_start").count();
        if idle_events == 0 {
            return 0.0;
        }
        let total = self.events.len().max(1);
        (idle_events as f64 / total as f64).min(1.0)
    }

    fn scroll_velocity(&self) -> f64 {
        let velocities: Vec<f64> = self
            .events
            .iter()
            .filter(|e| e.event_type == "scroll" && e.metadata.contains_key("delta_y"))
            .map(|e| e.delta_y().abs())
            .collect();
        if velocities.is_empty() {
            return 0.0;
        }
        let avg = velocities.iter().sum::<f64>() / velocities.len() as f64;
        (avg / 3000.0).min(1.0)
    }

    fn app_entropy(&self) -> f64 {
        use std::collections::HashMap;
        let mut apps: HashMap<&str, usize> = HashMap::new();
        for e in self.events.iter().filter(|e| e.event_type == "window_change") {
            *apps.entry(e.app()).or_insert(0) += 1;
        }
        let total: usize = apps.values().sum();
        if total == 0 {
            return 0.0;
        }
        let entropy = -apps
            .values()
            .map(|&c| {
                let p = c as f64 / total as f64;
                p * p.log2()
            })
            .sum::<f64>();
        let max_entropy = (apps.len().max(2) as f64).log2();
        entropy / max_entropy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(event_type: &str, ts: f64) -> TelemetryEvent {
        TelemetryEvent::new("ide", event_type, ts)
    }

    #[test]
    fn empty_processor_yields_zero_features() {
        let mut proc = SignalProcessor::new(300);
        let f = proc.extract_features();
        assert_eq!(f.tab_switch_rate, 0.0);
        assert_eq!(f.compile_error_rate, 0.0);
        assert_eq!(f.window_change_rate, 0.0);
        assert_eq!(f.task_switch_entropy, 0.0);
        assert!(f.session_duration_min < 0.01);
    }

    #[test]
    fn stale_events_are_evicted() {
        let mut proc = SignalProcessor::new(60);
        let old = now_secs() - 120.0;
        proc.push(event("tab_switch", old));
        let f = proc.extract_features();
        assert_eq!(f.tab_switch_rate, 0.0);
    }

    #[test]
    fn typing_burst_needs_two_samples() {
        let mut proc = SignalProcessor::new(300);
        let mut e = event("keystroke", now_secs());
        e.metadata.insert("interval_ms".into(), json!(120.0));
        proc.push(e);
        let f = proc.extract_features();
        assert_eq!(f.typing_burst_score, 0.0);
    }

    #[test]
    fn idle_fraction_capped_at_one() {
        let mut proc = SignalProcessor::new(300);
        for _ in 0..5 {
            proc.push(event("idle_start", now_secs()));
        }
        let f = proc.extract_features();
        assert!(f.idle_fraction <= 1.0);
    }

    #[test]
    fn scroll_velocity_normalizes_by_3000() {
        let mut proc = SignalProcessor::new(300);
        let mut e = event("scroll", now_secs());
        e.metadata.insert("delta_y".into(), json!(1500.0));
        proc.push(e);
        let f = proc.extract_features();
        assert!((f.scroll_velocity_norm - 0.5).abs() < 1e-9);
    }

    #[test]
    fn app_entropy_zero_for_single_app() {
        let mut proc = SignalProcessor::new(300);
        for _ in 0..4 {
            let mut e = event("window_change", now_secs());
            e.metadata.insert("app".into(), json!("vscode"));
            proc.push(e);
        }
        let f = proc.extract_features();
        assert_eq!(f.task_switch_entropy, 0.0);
    }

    #[test]
    fn app_entropy_positive_for_mixed_apps() {
        let mut proc = SignalProcessor::new(300);
        for app in ["vscode", "chrome", "slack", "chrome"] {
            let mut e = event("window_change", now_secs());
            e.metadata.insert("app".into(), json!(app));
            proc.push(e);
        }
        let f = proc.extract_features();
        assert!(f.task_switch_entropy > 0.0);
    }

    #[test]
    fn reset_session_zeroes_duration() {
        let mut proc = SignalProcessor::new(300);
        proc.reset_session();
        let f = proc.extract_features();
        assert!(f.session_duration_min < 0.01);
    }
}
