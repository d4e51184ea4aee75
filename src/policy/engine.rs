//! Policy Engine — matches the current `(context, load_score)` against the
//! rule registry and returns the applicable action directives, sorted by
//! priority. See spec.md §4.8.

use crate::inference::{CognitiveContext, LoadEstimate};
use crate::policy::rules::{ActionDirective, RULES};
use crate::telemetry::aggregator::TickListener;

#[derive(Default)]
pub struct PolicyEngine;

impl PolicyEngine {
    pub fn new() -> Self {
        Self
    }

    /// Returns every matching rule's actions, merged and sorted ascending by
    /// priority (1 = highest).
    pub fn evaluate(&self, estimate: &LoadEstimate, context: CognitiveContext) -> Vec<ActionDirective> {
        let mut matched: Vec<ActionDirective> = RULES
            .iter()
            .filter(|rule| rule.context == context && rule.load_min <= estimate.score && estimate.score <= rule.load_max)
            .flat_map(|rule| (rule.actions)())
            .collect();
        matched.sort_by_key(|a| a.priority);
        matched
    }

    /// Human-readable descriptions of every matching rule, in registry order.
    pub fn describe(&self, estimate: &LoadEstimate, context: CognitiveContext) -> Vec<&'static str> {
        RULES
            .iter()
            .filter(|rule| rule.context == context && rule.load_min <= estimate.score && estimate.score <= rule.load_max)
            .map(|rule| rule.description)
            .collect()
    }
}

/// Wires the policy engine into the aggregator's tick loop: every tick is
/// evaluated and logged. A full routing/action-dispatch surface (executing
/// directives against external systems) is out of scope — see spec.md §9.
pub struct LoggingPolicyListener {
    engine: PolicyEngine,
}

impl LoggingPolicyListener {
    pub fn new() -> Self {
        Self { engine: PolicyEngine::new() }
    }
}

impl Default for LoggingPolicyListener {
    fn default() -> Self {
        Self::new()
    }
}

impl TickListener for LoggingPolicyListener {
    fn on_tick(&self, estimate: &LoadEstimate, context: CognitiveContext) {
        let actions = self.engine.evaluate(estimate, context);
        if actions.is_empty() {
            tracing::debug!(%context, score = estimate.score, "no routing rule matched");
        } else {
            for action in &actions {
                tracing::info!(
                    %context,
                    score = estimate.score,
                    action = action.action_type,
                    priority = action.priority,
                    reason = action.reason,
                    "policy directive"
                );
            }
        }
    }
}
