//! Session reconstruction — groups inference ticks into contiguous work
//! sessions, splitting wherever the gap between consecutive ticks exceeds
//! `gap_minutes`. See spec.md §4.6.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::EngineResult;
use crate::telemetry::timeline::{validate_range, TimelineEntry, TimelineStore};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionSummary {
    /// 0 = oldest session in the queried window.
    pub session_index: usize,
    pub start_ts: f64,
    pub end_ts: f64,
    pub duration_minutes: f64,
    pub tick_count: usize,
    pub avg_load_score: f64,
    pub peak_load_score: f64,
    /// context → fraction of ticks, sums to 1.0.
    pub context_distribution: HashMap<String, f64>,
    pub dominant_context: String,
}

/// Group `timeline`'s `engine`/`inference_tick` entries in `[since, until]`
/// into sessions, splitting on any gap exceeding `gap_minutes`. Returns
/// sessions oldest-first.
pub fn get_sessions(
    timeline: &TimelineStore,
    since: Option<f64>,
    until: Option<f64>,
    gap_minutes: f64,
) -> EngineResult<Vec<SessionSummary>> {
    validate_range(since, until)?;
    let ticks = timeline.engine_ticks(since, until)?;
    Ok(build_sessions(&ticks, gap_minutes))
}

fn build_sessions(ticks: &[TimelineEntry], gap_minutes: f64) -> Vec<SessionSummary> {
    if ticks.is_empty() {
        return Vec::new();
    }

    let gap_s = gap_minutes * 60.0;
    let mut raw_sessions: Vec<Vec<&TimelineEntry>> = Vec::new();
    let mut current: Vec<&TimelineEntry> = vec![&ticks[0]];

    for tick in &ticks[1..] {
        if tick.timestamp - current.last().unwrap().timestamp > gap_s {
            raw_sessions.push(std::mem::take(&mut current));
            current.push(tick);
        } else {
            current.push(tick);
        }
    }
    raw_sessions.push(current);

    raw_sessions
        .into_iter()
        .enumerate()
        .map(|(idx, session_ticks)| build_session(idx, &session_ticks))
        .collect()
}

fn build_session(idx: usize, ticks: &[&TimelineEntry]) -> SessionSummary {
    let scores: Vec<f64> = ticks.iter().map(|t| t.load_score).collect();

    // Track counts alongside first-seen order so a tie for dominant context
    // resolves to whichever context appeared first chronologically.
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for t in ticks {
        if !counts.contains_key(&t.context) {
            order.push(t.context.clone());
        }
        *counts.entry(t.context.clone()).or_insert(0) += 1;
    }

    let total = ticks.len();
    let context_distribution: HashMap<String, f64> =
        counts.iter().map(|(k, &v)| (k.clone(), round4(v as f64 / total as f64))).collect();

    // Pick the first-seen context with the highest count: fold left-to-right
    // and only replace the running winner on a strictly greater count, so a
    // tie keeps whichever context appeared earlier.
    let dominant_context = order
        .into_iter()
        .fold(None::<String>, |best, ctx| match best {
            Some(best) if counts[&best] >= counts[&ctx] => Some(best),
            _ => Some(ctx),
        })
        .expect("ticks is non-empty");

    let duration_minutes = round2((ticks[ticks.len() - 1].timestamp - ticks[0].timestamp) / 60.0);
    let avg_load_score = round4(scores.iter().sum::<f64>() / total as f64);
    let peak_load_score = round4(scores.iter().cloned().fold(f64::MIN, f64::max));

    SessionSummary {
        session_index: idx,
        start_ts: ticks[0].timestamp,
        end_ts: ticks[ticks.len() - 1].timestamp,
        duration_minutes,
        tick_count: total,
        avg_load_score,
        peak_load_score,
        context_distribution,
        dominant_context,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
