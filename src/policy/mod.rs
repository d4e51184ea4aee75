//! Rule-based routing: matches cognitive state to actionable directives.
//! See spec.md §4.8.

pub mod engine;
pub mod rules;

pub use engine::{LoggingPolicyListener, PolicyEngine};
pub use rules::{ActionDirective, RoutingRule, RULES};
