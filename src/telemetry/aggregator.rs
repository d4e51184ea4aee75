//! Telemetry Aggregator — the central bus for all incoming telemetry. Feeds
//! every pushed event into the signal processor, runs one Monitor→Analyze
//! tick of the inference loop on demand, persists the result, and notifies
//! registered listeners (the policy engine, typically). See spec.md §4.4.

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::inference::{
    CognitiveContext, ContextClassifier, LoadEstimate, PluggableEstimator, SignalProcessor,
};
use crate::telemetry::event::{now_secs, TelemetryEvent};
use crate::telemetry::timeline::{TimelineEntry, TimelineStore};

/// A callback notified after every tick with the fresh estimate and context.
/// A panicking listener is caught and logged; it never unwinds into `tick()`
/// or stops other listeners or persistence from running (spec.md §4.4, §7).
pub trait TickListener: Send + Sync {
    fn on_tick(&self, estimate: &LoadEstimate, context: CognitiveContext);
}

/// Snapshot of the aggregator's most recent tick, as surfaced to external
/// callers (e.g. a status endpoint).
#[derive(Debug, Clone, Serialize)]
pub struct EngineState {
    pub load_score: f64,
    pub context: String,
    pub confidence: f64,
    pub timestamp: f64,
    pub estimator: &'static str,
}

struct Latest {
    estimate: Option<LoadEstimate>,
    context: CognitiveContext,
}

/// Central bus for all incoming telemetry.
///
/// `processor` and `estimator` are guarded by a single mutex each — never a
/// torn struct is observable across threads (spec.md §5). `latest` is a
/// separate `RwLock` so readers of [`current_state`](Self::current_state)
/// never block a concurrent `tick`.
pub struct TelemetryAggregator {
    processor: Mutex<SignalProcessor>,
    estimator: Mutex<PluggableEstimator>,
    classifier: ContextClassifier,
    timeline: std::sync::Arc<TimelineStore>,
    latest: RwLock<Latest>,
    listeners: RwLock<Vec<Box<dyn TickListener>>>,
}

impl TelemetryAggregator {
    pub fn new(timeline: std::sync::Arc<TimelineStore>, window_seconds: u64) -> Self {
        Self {
            processor: Mutex::new(SignalProcessor::new(window_seconds)),
            estimator: Mutex::new(PluggableEstimator::new()),
            classifier: ContextClassifier::new(),
            timeline,
            latest: RwLock::new(Latest { estimate: None, context: CognitiveContext::Unknown }),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Enqueue `event` into the signal processor's sliding window.
    pub fn push_event(&self, event: TelemetryEvent) {
        self.processor.lock().push(event);
    }

    /// Non-blocking ingestion from async contexts (the WebSocket/HTTP
    /// handlers at the edge). Offloads the mutex acquisition to a blocking
    /// thread so an inference tick in progress never stalls the async
    /// reactor.
    pub async fn push_event_async(&self, event: TelemetryEvent) {
        let processor = &self.processor;
        tokio::task::block_in_place(|| processor.lock().push(event));
    }

    /// Run one Monitor→Analyze→notify tick: extract features, estimate load,
    /// classify context, persist, and fan out to listeners. Persistence
    /// failures are logged and swallowed — a store hiccup must never stop
    /// the inference loop (spec.md §4.4, §7).
    #[tracing::instrument(skip(self))]
    pub fn tick(&self) -> LoadEstimate {
        let features = self.processor.lock().extract_features();
        let estimate = self.estimator.lock().estimate(&features);
        let context = self.classifier.classify(&features, estimate.score);

        {
            let mut latest = self.latest.write();
            latest.estimate = Some(estimate);
            latest.context = context;
        }

        let metadata_json = serde_json::json!({
            "intrinsic": estimate.intrinsic,
            "extraneous": estimate.extraneous,
            "germane": estimate.germane,
            "confidence": estimate.confidence,
        })
        .to_string();

        let entry = TimelineEntry::new(
            now_secs(),
            "engine",
            "inference_tick",
            estimate.score,
            context.as_str(),
            metadata_json,
        );
        if let Err(e) = self.timeline.append(&entry) {
            tracing::warn!("failed to persist inference tick: {e}");
        }

        for listener in self.listeners.read().iter() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_tick(&estimate, context);
            }));
            if result.is_err() {
                tracing::error!("tick listener panicked; continuing to next listener");
            }
        }

        estimate
    }

    /// Current engine state for status endpoints. Never blocks on a
    /// concurrent `tick`.
    pub fn current_state(&self) -> EngineState {
        let latest = self.latest.read();
        EngineState {
            load_score: latest.estimate.map(|e| e.score).unwrap_or(0.0),
            context: latest.context.as_str().to_string(),
            confidence: latest.estimate.map(|e| e.confidence).unwrap_or(0.0),
            timestamp: now_secs(),
            estimator: if self.estimator.lock().using_ml_model() { "ml" } else { "v1" },
        }
    }

    /// Register a listener invoked on every future tick. Listeners are
    /// accumulated for the aggregator's lifetime; there is no unregister —
    /// the routing engine is wired up once at startup.
    pub fn register_listener(&self, listener: Box<dyn TickListener>) {
        self.listeners.write().push(listener);
    }
}

/// Drives `aggregator.tick()` on a fixed interval until cancelled. Uses
/// `MissedTickBehavior::Skip` so a slow tick (e.g. a store hiccup) drops the
/// backlog instead of firing a burst of catch-up ticks.
pub struct TickDriver {
    interval: std::time::Duration,
}

impl TickDriver {
    pub fn new(interval: std::time::Duration) -> Self {
        Self { interval }
    }

    /// Runs until `shutdown` resolves. Intended to be spawned as its own
    /// `tokio::task`.
    pub async fn run(
        &self,
        aggregator: std::sync::Arc<TelemetryAggregator>,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    aggregator.tick();
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}
