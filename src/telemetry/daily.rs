//! Daily aggregate statistics, bucketed by UTC calendar day. See spec.md §4.7.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use serde::Serialize;

use crate::error::EngineResult;
use crate::telemetry::sessions::{get_sessions, SessionSummary};
use crate::telemetry::timeline::{validate_range, TimelineEntry, TimelineStore};

const WEEK_SECONDS: f64 = 7.0 * 24.0 * 3600.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyStats {
    /// `YYYY-MM-DD`, UTC.
    pub date: String,
    pub tick_count: usize,
    pub session_count: usize,
    pub avg_load_score: f64,
    pub peak_load_score: f64,
    pub total_session_minutes: f64,
    /// Minutes spent in `deep_focus` context, estimated as
    /// `total_session_minutes * fraction of ticks in deep_focus`.
    pub focus_minutes: f64,
    pub context_distribution: HashMap<String, f64>,
}

/// Returns one [`DailyStats`] record per UTC calendar day with ticks in
/// `[since, until]`. Defaults to the trailing 7 days when either bound is
/// omitted.
pub fn get_daily_stats(
    timeline: &TimelineStore,
    since: Option<f64>,
    until: Option<f64>,
    gap_minutes: f64,
) -> EngineResult<Vec<DailyStats>> {
    validate_range(since, until)?;
    let now = crate::telemetry::event::now_secs();
    let since = since.unwrap_or(now - WEEK_SECONDS);
    let until = until.unwrap_or(now);

    let ticks = timeline.engine_ticks(Some(since), Some(until))?;
    if ticks.is_empty() {
        return Ok(Vec::new());
    }

    let mut by_date: HashMap<String, Vec<&TimelineEntry>> = HashMap::new();
    for t in &ticks {
        by_date.entry(utc_date(t.timestamp)).or_default().push(t);
    }

    let sessions = get_sessions(timeline, Some(since), Some(until), gap_minutes)?;
    let mut sessions_by_date: HashMap<String, Vec<&SessionSummary>> = HashMap::new();
    for s in &sessions {
        sessions_by_date.entry(utc_date(s.start_ts)).or_default().push(s);
    }

    let mut dates: Vec<&String> = by_date.keys().collect();
    dates.sort();

    let mut out = Vec::with_capacity(dates.len());
    for date in dates {
        let day_ticks = &by_date[date];
        let scores: Vec<f64> = day_ticks.iter().map(|t| t.load_score).collect();

        let mut counts: HashMap<String, usize> = HashMap::new();
        for t in day_ticks {
            *counts.entry(t.context.clone()).or_insert(0) += 1;
        }
        let total = day_ticks.len();
        let context_distribution: HashMap<String, f64> =
            counts.iter().map(|(k, &v)| (k.clone(), v as f64 / total as f64)).collect();

        let day_sessions = sessions_by_date.get(date).map(Vec::as_slice).unwrap_or(&[]);
        let total_session_minutes: f64 = day_sessions.iter().map(|s| s.duration_minutes).sum();
        let focus_fraction = context_distribution.get("deep_focus").copied().unwrap_or(0.0);

        out.push(DailyStats {
            date: date.clone(),
            tick_count: total,
            session_count: day_sessions.len(),
            avg_load_score: scores.iter().sum::<f64>() / total as f64,
            peak_load_score: scores.iter().cloned().fold(f64::MIN, f64::max),
            total_session_minutes: round1(total_session_minutes),
            focus_minutes: round1(total_session_minutes * focus_fraction),
            context_distribution,
        });
    }
    Ok(out)
}

fn utc_date(timestamp: f64) -> String {
    Utc.timestamp_opt(timestamp as i64, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "1970-01-01".to_string())
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn store_with_ticks(entries: &[(f64, f64, &str)]) -> Arc<TimelineStore> {
        let store = Arc::new(TimelineStore::open_in_memory().unwrap());
        for (ts, score, ctx) in entries {
            store
                .append(&TimelineEntry::new(*ts, "engine", "inference_tick", *score, *ctx, "{}"))
                .unwrap();
        }
        store
    }

    #[test]
    fn empty_timeline_yields_no_stats() {
        let store = store_with_ticks(&[]);
        let stats = get_daily_stats(&store, None, None, 10.0).unwrap();
        assert!(stats.is_empty());
    }

    #[test]
    fn single_day_of_ticks_produces_one_record() {
        // 2024-01-15T00:00:00Z and 2024-01-15T01:00:00Z
        let day_start = 1_705_276_800.0;
        let store = store_with_ticks(&[
            (day_start, 0.3, "deep_focus"),
            (day_start + 3600.0, 0.5, "shallow_work"),
        ]);
        let stats = get_daily_stats(&store, Some(day_start - 1.0), Some(day_start + 7200.0), 10.0).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].date, "2024-01-15");
        assert_eq!(stats[0].tick_count, 2);
    }

    #[test]
    fn ticks_spanning_two_days_are_split() {
        let day1 = 1_705_276_800.0; // 2024-01-15T00:00:00Z
        let day2 = day1 + 24.0 * 3600.0; // 2024-01-16T00:00:00Z
        let store = store_with_ticks(&[(day1, 0.3, "deep_focus"), (day2, 0.4, "deep_focus")]);
        let stats = get_daily_stats(&store, Some(day1 - 1.0), Some(day2 + 1.0), 10.0).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].date, "2024-01-15");
        assert_eq!(stats[1].date, "2024-01-16");
    }

    #[test]
    fn focus_minutes_scale_with_deep_focus_fraction() {
        let day_start = 1_705_276_800.0;
        let store = store_with_ticks(&[
            (day_start, 0.3, "deep_focus"),
            (day_start + 60.0, 0.3, "deep_focus"),
            (day_start + 120.0, 0.3, "shallow_work"),
            (day_start + 180.0, 0.3, "shallow_work"),
        ]);
        let stats = get_daily_stats(&store, Some(day_start - 1.0), Some(day_start + 7200.0), 10.0).unwrap();
        assert_eq!(stats.len(), 1);
        assert!(stats[0].focus_minutes <= stats[0].total_session_minutes);
        assert!(stats[0].focus_minutes > 0.0);
    }

    #[test]
    fn defaults_to_trailing_week_when_bounds_omitted() {
        let now = crate::telemetry::event::now_secs();
        let store = store_with_ticks(&[(now - 60.0, 0.3, "deep_focus")]);
        let stats = get_daily_stats(&store, None, None, 10.0).unwrap();
        assert_eq!(stats.len(), 1);
    }
}
