//! Pluggable (v2) Load Estimator — wraps a trained model when one is
//! available, transparently falling back to the rule-based v1 estimator
//! otherwise. See spec.md §4.2.
//!
//! Training a model is an explicit non-goal (spec.md §1); this crate ships
//! no model artifact, so `PluggableEstimator::new` always takes the v1 path
//! and logs once, which *is* the documented fallback behavior rather than a
//! stub of a future feature.

use std::collections::VecDeque;

use super::load_estimator::{LoadEstimate, RuleBasedEstimator};
use super::signal_processor::SignalFeatures;

/// Feature column order a `LoadModel` implementation must match at training
/// time. Kept in one place so the normalization logic and any trained
/// artifact agree on column order.
pub const FEATURE_COLS: [&str; 8] = [
    "tab_switch_rate",
    "compile_error_rate",
    "window_change_rate",
    "typing_burst_score",
    "idle_fraction",
    "scroll_velocity_norm",
    "session_duration_min",
    "task_switch_entropy",
];

/// A trained regressor that maps a normalized feature row to a total load
/// score. Swapping implementations is a construction-time decision — there
/// is no runtime patching (spec.md §9).
pub trait LoadModel: Send {
    fn predict(&self, row: &[f64; 8]) -> f64;
}

fn normalize_row(features: &SignalFeatures) -> [f64; 8] {
    let cap = |v: f64, c: f64| (v / c).min(1.0);
    [
        cap(features.tab_switch_rate, 10.0),
        cap(features.compile_error_rate, 5.0),
        cap(features.window_change_rate, 15.0),
        features.typing_burst_score,
        features.idle_fraction,
        features.scroll_velocity_norm,
        cap(features.session_duration_min, 120.0),
        features.task_switch_entropy,
    ]
}

const HISTORY_SIZE: usize = 5;
const ALPHA: f64 = 0.3;

/// Estimator that prefers a `LoadModel` when one loads successfully, and
/// otherwise delegates to `RuleBasedEstimator`.
pub struct PluggableEstimator {
    model: Option<Box<dyn LoadModel>>,
    v1: RuleBasedEstimator,
    history: VecDeque<f64>,
}

impl PluggableEstimator {
    /// Construct with no model artifact — always falls back to v1.
    pub fn new() -> Self {
        tracing::info!("no load model artifact configured; using rule-based v1 estimator");
        Self {
            model: None,
            v1: RuleBasedEstimator::new(),
            history: VecDeque::with_capacity(HISTORY_SIZE),
        }
    }

    /// Construct with a model loader. If `loader` returns `Err`, the error is
    /// logged once and the estimator silently falls back to v1 — a corrupt
    /// or missing model artifact must never be user-surfaced (spec.md §4.2,
    /// §7).
    pub fn with_model_loader<F, E>(loader: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn LoadModel>, E>,
        E: std::fmt::Display,
    {
        match loader() {
            Ok(model) => {
                tracing::info!("load model artifact loaded; using ML-backed estimator");
                Self {
                    model: Some(model),
                    v1: RuleBasedEstimator::new(),
                    history: VecDeque::with_capacity(HISTORY_SIZE),
                }
            }
            Err(e) => {
                tracing::warn!("could not load model artifact: {e} — using v1 fallback");
                Self::new()
            }
        }
    }

    pub fn using_ml_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn estimate(&mut self, features: &SignalFeatures) -> LoadEstimate {
        let Some(model) = self.model.as_ref() else {
            return self.v1.estimate(features);
        };

        let row = normalize_row(features);
        let raw_score = model.predict(&row).clamp(0.0, 1.0);

        let score = match self.history.back() {
            Some(&last) => ALPHA * raw_score + (1.0 - ALPHA) * last,
            None => raw_score,
        };
        self.history.push_back(score);
        if self.history.len() > HISTORY_SIZE {
            self.history.pop_front();
        }

        // ML predicts the total score only; derive an approximate breakdown
        // from feature groups. Per spec.md §4.2/§9, consumers must not
        // assume intrinsic + extraneous + germane == score.
        let tab_norm = (features.tab_switch_rate / 10.0).min(1.0);
        let err_norm = (features.compile_error_rate / 5.0).min(1.0);
        let extraneous = 0.6 * tab_norm + 0.4 * features.task_switch_entropy;
        let intrinsic = 0.6 * err_norm + 0.4 * features.typing_burst_score;
        let germane =
            ((features.session_duration_min / 120.0) - features.idle_fraction).clamp(0.0, 1.0);

        LoadEstimate {
            score,
            intrinsic,
            extraneous,
            germane,
            confidence: (self.history.len() as f64 / HISTORY_SIZE as f64).min(1.0),
        }
    }
}

impl Default for PluggableEstimator {
    fn default() -> Self {
        Self::new()
    }
}
