//! Context Classifier — deterministic rule ladder mapping
//! `(SignalFeatures, load_score)` to a discrete `CognitiveContext`.
//! See spec.md §4.3.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::signal_processor::SignalFeatures;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CognitiveContext {
    DeepFocus,
    ShallowWork,
    Stuck,
    Fatigue,
    Recovering,
    Unknown,
}

impl CognitiveContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeepFocus => "deep_focus",
            Self::ShallowWork => "shallow_work",
            Self::Stuck => "stuck",
            Self::Fatigue => "fatigue",
            Self::Recovering => "recovering",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CognitiveContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CognitiveContext {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "deep_focus" => Self::DeepFocus,
            "shallow_work" => Self::ShallowWork,
            "stuck" => Self::Stuck,
            "fatigue" => Self::Fatigue,
            "recovering" => Self::Recovering,
            _ => Self::Unknown,
        })
    }
}

/// Rule-based classifier. Rules are evaluated top-to-bottom; first match
/// wins.
#[derive(Default)]
pub struct ContextClassifier;

impl ContextClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, features: &SignalFeatures, load_score: f64) -> CognitiveContext {
        if (features.compile_error_rate > 2.0 && features.tab_switch_rate > 5.0)
            || (features.task_switch_entropy > 0.8 && load_score > 0.7)
        {
            return CognitiveContext::Stuck;
        }

        if (load_score > 0.85 && features.session_duration_min > 90.0)
            || (features.idle_fraction > 0.4 && features.session_duration_min > 60.0)
        {
            return CognitiveContext::Fatigue;
        }

        if features.tab_switch_rate < 1.5
            && features.window_change_rate < 2.0
            && features.task_switch_entropy < 0.3
            && load_score > 0.3
            && load_score < 0.75
        {
            return CognitiveContext::DeepFocus;
        }

        if features.idle_fraction > 0.2 && load_score < 0.4 {
            return CognitiveContext::Recovering;
        }

        if features.tab_switch_rate > 3.0 || features.task_switch_entropy > 0.5 {
            return CognitiveContext::ShallowWork;
        }

        CognitiveContext::Unknown
    }
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
    fn stuck_detection() {
        let c = ContextClassifier::new();
        let f = features(|f| {
            f.compile_error_rate = 3.0;
            f.tab_switch_rate = 6.0;
            f.task_switch_entropy = 0.2;
        });
        assert_eq!(c.classify(&f, 0.8), CognitiveContext::Stuck);
    }

    #[test]
    fn stuck_via_entropy_and_high_load() {
        let c = ContextClassifier::new();
        let f = features(|f| {
            f.task_switch_entropy = 0.9;
        });
        assert_eq!(c.classify(&f, 0.75), CognitiveContext::Stuck);
    }

    #[test]
    fn deep_focus() {
        let c = ContextClassifier::new();
        let f = features(|f| {
            f.tab_switch_rate = 0.5;
            f.window_change_rate = 0.5;
            f.task_switch_entropy = 0.1;
            f.session_duration_min = 20.0;
        });
        assert_eq!(c.classify(&f, 0.5), CognitiveContext::DeepFocus);
    }

    #[test]
    fn fatigue_by_sustained_high_load() {
        let c = ContextClassifier::new();
        let f = features(|f| f.session_duration_min = 95.0);
        assert_eq!(c.classify(&f, 0.9), CognitiveContext::Fatigue);
    }

    #[test]
    fn fatigue_by_idle_and_duration() {
        let c = ContextClassifier::new();
        let f = features(|f| {
            f.idle_fraction = 0.5;
            f.session_duration_min = 70.0;
        });
        assert_eq!(c.classify(&f, 0.2), CognitiveContext::Fatigue);
    }

    #[test]
    fn recovering() {
        let c = ContextClassifier::new();
        let f = features(|f| f.idle_fraction = 0.3);
        assert_eq!(c.classify(&f, 0.2), CognitiveContext::Recovering);
    }

    #[test]
    fn shallow_work() {
        let c = ContextClassifier::new();
        let f = features(|f| f.tab_switch_rate = 4.0);
        assert_eq!(c.classify(&f, 0.5), CognitiveContext::ShallowWork);
    }

    #[test]
    fn unknown_when_nothing_matches() {
        let c = ContextClassifier::new();
        // window_change_rate disqualifies deep_focus; nothing else qualifies.
        let f = features(|f| f.window_change_rate = 2.5);
        assert_eq!(c.classify(&f, 0.5), CognitiveContext::Unknown);
    }

    #[test]
    fn roundtrips_through_str() {
        for ctx in [
            CognitiveContext::DeepFocus,
            CognitiveContext::ShallowWork,
            CognitiveContext::Stuck,
            CognitiveContext::Fatigue,
            CognitiveContext::Recovering,
            CognitiveContext::Unknown,
        ] {
            let s = ctx.as_str();
            assert_eq!(s.parse::<CognitiveContext>().unwrap(), ctx);
        }
    }
}
