//! Cogniflow Engine — a local-first cognitive-state inference daemon.
//!
//! Ingests telemetry from IDE, browser, desktop, and LMS sources, estimates
//! cognitive load, classifies the student's working context, persists an
//! append-only timeline, and routes the current state through a rule-based
//! policy engine. See `SPEC_FULL.md` for the full system design.

pub mod config;
pub mod error;
pub mod inference;
pub mod policy;
pub mod scheduler;
pub mod settings;
pub mod telemetry;

pub use config::Config;
pub use error::{EngineError, EngineResult};
pub use inference::{CognitiveContext, ContextClassifier, LoadEstimate, PluggableEstimator, SignalFeatures, SignalProcessor};
pub use policy::{ActionDirective, PolicyEngine};
pub use scheduler::{Difficulty, Task, TaskScheduler};
pub use settings::{Settings, SettingsStore};
pub use telemetry::{DailyStats, SessionSummary, TelemetryAggregator, TelemetryEvent, TimelineStore};
