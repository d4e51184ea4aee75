//! Declarative routing rules. Each rule maps a `(CognitiveContext,
//! load_score range)` combination to a list of [`ActionDirective`]s. See
//! spec.md §4.8.

use serde::Serialize;

use crate::inference::CognitiveContext;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionDirective {
    pub action_type: &'static str,
    pub params: serde_json::Value,
    /// 1 (highest) → 10 (lowest).
    pub priority: u8,
    pub reason: &'static str,
}

impl ActionDirective {
    const fn new(action_type: &'static str, priority: u8, reason: &'static str) -> Self {
        Self { action_type, params: serde_json::Value::Null, priority, reason }
    }
}

pub struct RoutingRule {
    pub context: CognitiveContext,
    /// Inclusive lower bound.
    pub load_min: f64,
    /// Inclusive upper bound.
    pub load_max: f64,
    pub description: &'static str,
    pub actions: fn() -> Vec<ActionDirective>,
}

/// Rule registry. Rules are not mutually exclusive: every rule whose
/// `(context, load range)` matches contributes its actions, later merged and
/// priority-sorted by the policy engine.
pub static RULES: &[RoutingRule] = &[
    RoutingRule {
        context: CognitiveContext::Stuck,
        load_min: 0.6,
        load_max: 1.0,
        description: "High-load stuck loop: redirect to review material",
        actions: || {
            vec![
                ActionDirective::new("suppress_notifications", 1, "student is stuck — eliminate interruptions"),
                ActionDirective {
                    params: serde_json::json!({"type": "review", "difficulty": "easy"}),
                    ..ActionDirective::new("suggest_task", 2, "surface prerequisite material")
                },
                ActionDirective {
                    params: serde_json::json!({"minutes": 10}),
                    ..ActionDirective::new("shorten_focus_interval", 3, "reduce pressure by shortening session")
                },
                ActionDirective::new("block_distracting_tabs", 2, "limit scope of context switches"),
            ]
        },
    },
    RoutingRule {
        context: CognitiveContext::DeepFocus,
        load_min: 0.3,
        load_max: 0.75,
        description: "Optimal deep-work state: protect and sustain",
        actions: || {
            vec![
                ActionDirective::new("suppress_notifications", 1, "protect deep focus window"),
                ActionDirective::new("block_distracting_tabs", 2, "reduce extraneous load"),
            ]
        },
    },
    RoutingRule {
        context: CognitiveContext::Fatigue,
        load_min: 0.85,
        load_max: 1.0,
        description: "Fatigue detected: initiate recovery protocol",
        actions: || {
            vec![
                ActionDirective {
                    params: serde_json::json!({"duration_min": 15}),
                    ..ActionDirective::new("recommend_break", 1, "cognitive recovery needed")
                },
                ActionDirective::new("delay_hard_tasks", 2, "defer high-difficulty work until recovery"),
                ActionDirective::new("suppress_notifications", 1, "reduce stimulus during recovery"),
            ]
        },
    },
    RoutingRule {
        context: CognitiveContext::ShallowWork,
        load_min: 0.3,
        load_max: 0.7,
        description: "Scattered attention: consolidate focus",
        actions: || {
            vec![ActionDirective {
                params: serde_json::json!({"type": "current", "difficulty": "medium"}),
                ..ActionDirective::new("suggest_task", 3, "bring attention back to primary task")
            }]
        },
    },
    RoutingRule {
        context: CognitiveContext::Recovering,
        load_min: 0.0,
        load_max: 0.35,
        description: "Low load / recovering: schedule challenging work",
        actions: || {
            vec![
                ActionDirective::new("schedule_hard_task", 4, "low load is ideal for high-difficulty material"),
                ActionDirective::new("allow_notifications", 5, "student has capacity for minor interruptions"),
            ]
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rule_produces_at_least_one_action() {
        for rule in RULES {
            assert!(!(rule.actions)().is_empty(), "{}", rule.description);
        }
    }

    #[test]
    fn load_ranges_are_well_formed() {
        for rule in RULES {
            assert!(rule.load_min <= rule.load_max);
        }
    }
}
