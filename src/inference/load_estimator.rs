//! Cognitive Load Estimator — produces a continuous load score in [0, 1].
//!
//! v1 is a weighted linear combination of normalized signal features,
//! encoding the intrinsic/extraneous/germane breakdown from cognitive load
//! theory (Sweller, 1988). See spec.md §4.2.

use serde::Serialize;
use std::collections::VecDeque;

use super::signal_processor::SignalFeatures;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct LoadEstimate {
    pub score: f64,
    pub intrinsic: f64,
    pub extraneous: f64,
    pub germane: f64,
    pub confidence: f64,
}

const HISTORY_SIZE: usize = 5;
const ALPHA: f64 = 0.3;

struct Weight {
    name: &'static str,
    weight: f64,
    cap: Option<f64>,
}

const INTRINSIC_WEIGHTS: &[Weight] = &[
    Weight { name: "compile_error_rate", weight: 0.40, cap: Some(5.0) },
    Weight { name: "typing_burst_score", weight: 0.35, cap: None },
    Weight { name: "scroll_velocity_norm", weight: 0.25, cap: None },
];

const EXTRANEOUS_WEIGHTS: &[Weight] = &[
    Weight { name: "tab_switch_rate", weight: 0.45, cap: Some(10.0) },
    Weight { name: "window_change_rate", weight: 0.30, cap: Some(15.0) },
    Weight { name: "task_switch_entropy", weight: 0.25, cap: None },
];

const GERMANE_WEIGHTS: &[Weight] = &[
    Weight { name: "idle_fraction", weight: -0.60, cap: None },
    Weight { name: "session_duration_min", weight: 0.40, cap: Some(120.0) },
];

fn feature_value(features: &SignalFeatures, name: &str) -> f64 {
    let raw = match name {
        "compile_error_rate" => features.compile_error_rate,
        "typing_burst_score" => features.typing_burst_score,
        "scroll_velocity_norm" => features.scroll_velocity_norm,
        "tab_switch_rate" => features.tab_switch_rate,
        "window_change_rate" => features.window_change_rate,
        "task_switch_entropy" => features.task_switch_entropy,
        "idle_fraction" => features.idle_fraction,
        "session_duration_min" => features.session_duration_min,
        _ => 0.0,
    };
    // A malformed upstream feature (NaN/inf) is treated as zero, per spec.md
    // §4.2's failure-mode clause.
    if raw.is_finite() {
        raw
    } else {
        0.0
    }
}

fn weighted(features: &SignalFeatures, weights: &[Weight]) -> f64 {
    let total_weight: f64 = weights.iter().map(|w| w.weight.abs()).sum();
    let mut score = 0.0;
    for w in weights {
        let mut value = feature_value(features, w.name);
        if let Some(cap) = w.cap {
            value = (value / cap).min(1.0);
        }
        score += w.weight * value;
    }
    (score / total_weight).clamp(0.0, 1.0)
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// Stateless-per-construction estimator: call `estimate` with a fresh
/// `SignalFeatures` snapshot, the running instance carries the EMA history.
pub struct RuleBasedEstimator {
    history: VecDeque<f64>,
}

impl RuleBasedEstimator {
    pub fn new() -> Self {
        Self { history: VecDeque::with_capacity(HISTORY_SIZE) }
    }

    pub fn estimate(&mut self, features: &SignalFeatures) -> LoadEstimate {
        let intrinsic = weighted(features, INTRINSIC_WEIGHTS);
        let extraneous = weighted(features, EXTRANEOUS_WEIGHTS);
        let germane = weighted(features, GERMANE_WEIGHTS);

        let raw = 0.62 * extraneous + 0.28 * intrinsic + 0.10 * germane;
        let score = clamp01(raw);
        let smoothed = smooth(&mut self.history, score);

        LoadEstimate {
            score: smoothed,
            intrinsic,
            extraneous,
            germane,
            confidence: confidence(self.history.len()),
        }
    }
}

impl Default for RuleBasedEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the shared EMA smoothing rule and pushes the result into
/// `history`, dropping the oldest entry once full.
fn smooth(history: &mut VecDeque<f64>, raw: f64) -> f64 {
    let score = match history.back() {
        Some(&last) => ALPHA * raw + (1.0 - ALPHA) * last,
        None => raw,
    };
    history.push_back(score);
    if history.len() > HISTORY_SIZE {
        history.pop_front();
    }
    score
}

fn confidence(history_len: usize) -> f64 {
    (history_len as f64 / HISTORY_SIZE as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(overrides: impl FnOnce(&mut SignalFeatures)) -> SignalFeatures {
        let mut f = SignalFeatures::default();
        overrides(&mut f);
        f
    }

    #[test]
    fn score_and_breakdown_are_bounded() {
        let mut est = RuleBasedEstimator::new();
        let f = features(|f| {
            f.tab_switch_rate = 20.0;
            f.compile_error_rate = 10.0;
            f.window_change_rate = 30.0;
            f.task_switch_entropy = 1.0;
        });
        let result = est.estimate(&f);
        assert!((0.0..=1.0).contains(&result.score));
        assert!((0.0..=1.0).contains(&result.intrinsic));
        assert!((0.0..=1.0).contains(&result.extraneous));
        assert!((0.0..=1.0).contains(&result.germane));
    }

    #[test]
    fn confidence_is_monotonic_and_converges() {
        let mut est = RuleBasedEstimator::new();
        let f = SignalFeatures::default();
        let mut last = 0.0;
        for _ in 0..HISTORY_SIZE {
            let r = est.estimate(&f);
            assert!(r.confidence >= last);
            last = r.confidence;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn smoothing_converges_geometrically_toward_raw() {
        let mut history = VecDeque::new();
        // Seed with an initial raw value of 0.0, then hit it with a fixed
        // raw input repeatedly: error from the target should shrink by
        // (1 - ALPHA) each step.
        let target = 1.0;
        let s0 = smooth(&mut history, 0.0);
        let s1 = smooth(&mut history, target);
        let s2 = smooth(&mut history, target);
        let err0 = (s0 - target).abs();
        let err1 = (s1 - target).abs();
        let err2 = (s2 - target).abs();
        assert!((err1 - err0 * (1.0 - ALPHA)).abs() < 1e-9);
        assert!((err2 - err1 * (1.0 - ALPHA)).abs() < 1e-9);
    }

    #[test]
    fn malformed_feature_is_treated_as_zero() {
        let mut est = RuleBasedEstimator::new();
        let f = features(|f| {
            f.compile_error_rate = f64::NAN;
            f.tab_switch_rate = f64::INFINITY;
        });
        let result = est.estimate(&f);
        assert!(result.score.is_finite());
        assert!((0.0..=1.0).contains(&result.score));
    }

    #[test]
    fn history_warmup_smooths_below_a_spike() {
        let mut est = RuleBasedEstimator::new();
        let quiet = SignalFeatures::default();
        for _ in 0..HISTORY_SIZE {
            est.estimate(&quiet);
        }
        let spike = features(|f| {
            f.tab_switch_rate = 50.0;
            f.window_change_rate = 50.0;
            f.task_switch_entropy = 1.0;
        });
        let intrinsic = weighted(&spike, INTRINSIC_WEIGHTS);
        let extraneous = weighted(&spike, EXTRANEOUS_WEIGHTS);
        let germane = weighted(&spike, GERMANE_WEIGHTS);
        let raw_spike_score = clamp01(0.62 * extraneous + 0.28 * intrinsic + 0.10 * germane);

        let result = est.estimate(&spike);
        assert!(result.score < raw_spike_score);
        assert_eq!(result.confidence, 1.0);
    }
}
