//! Prometheus metrics for running engines.
//!
//! All collectors are labelled by engine name so several engines in one
//! process stay distinguishable. Nothing is registered implicitly: call
//! [`register_metrics`] with the registry you export.


use std::collections::HashSet;

use lazy_static::lazy_static;
use parking_lot::Mutex;
use prometheus::exponential_buckets;
use prometheus::Encoder;
use prometheus::Histogram;
use prometheus::HistogramOpts;
use prometheus::HistogramVec;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::IntGaugeVec;
use prometheus::Opts;
use prometheus::Registry;
use tracing::debug;
use tracing::error;

use crate::EngineError;
use crate::Result;

lazy_static! {
    pub static ref CYCLES_STARTED: IntCounterVec = IntCounterVec::new(
        Opts::new("sim_watch_cycles_started", "Sampling cycles started"),
        &["engine"]
    )
    .expect("metric can not be created");

    pub static ref TICKS_SKIPPED: IntCounterVec = IntCounterVec::new(
        Opts::new("sim_watch_ticks_skipped", "Ticks dropped because a cycle was still running"),
        &["engine"]
    )
    .expect("metric can not be created");

    pub static ref CYCLES_PANICKED: IntCounterVec = IntCounterVec::new(
        Opts::new("sim_watch_cycles_panicked", "Sampling cycles aborted by a panic"),
        &["engine"]
    )
    .expect("metric can not be created");

    pub static ref CHANGES_EMITTED: IntCounterVec = IntCounterVec::new(
        Opts::new("sim_watch_changes_emitted", "Change events delivered"),
        &["engine"]
    )
    .expect("metric can not be created");

    pub static ref FETCH_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("sim_watch_fetch_failures", "Failed fetches reported"),
        &["engine"]
    )
    .expect("metric can not be created");

    pub static ref CALLBACK_PANICS: IntCounterVec = IntCounterVec::new(
        Opts::new("sim_watch_callback_panics", "Panics raised by on_change/on_error callbacks"),
        &["engine"]
    )
    .expect("metric can not be created");

    pub static ref SOURCE_PANICS: IntCounterVec = IntCounterVec::new(
        Opts::new("sim_watch_source_panics", "Panics raised by the remote value source during a fetch"),
        &["engine"]
    )
    .expect("metric can not be created");

    pub static ref WATCHED_ADDRESSES: IntGaugeVec = IntGaugeVec::new(
        Opts::new("sim_watch_watched_addresses", "Addresses currently in the watch set"),
        &["engine"]
    )
    .expect("metric can not be created");

    pub static ref CYCLE_DURATION_MS: HistogramVec = HistogramVec::new(
        HistogramOpts::new("sim_watch_cycle_duration_ms", "Duration of a full sampling cycle in ms")
            .buckets(exponential_buckets(1.0, 2.0, 14).expect("valid buckets")),
        &["engine"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();

    // Engine names that currently own a label series
    static ref LIVE_ENGINES: Mutex<HashSet<String>> = Mutex::new(HashSet::new());
}

/// Registers every engine collector on `registry`.
pub fn register_metrics(registry: &Registry) -> Result<()> {
    registry.register(Box::new(CYCLES_STARTED.clone()))?;
    registry.register(Box::new(TICKS_SKIPPED.clone()))?;
    registry.register(Box::new(CYCLES_PANICKED.clone()))?;
    registry.register(Box::new(CHANGES_EMITTED.clone()))?;
    registry.register(Box::new(FETCH_FAILURES.clone()))?;
    registry.register(Box::new(CALLBACK_PANICS.clone()))?;
    registry.register(Box::new(SOURCE_PANICS.clone()))?;
    registry.register(Box::new(WATCHED_ADDRESSES.clone()))?;
    registry.register(Box::new(CYCLE_DURATION_MS.clone()))?;
    Ok(())
}

/// Renders `registry` in the Prometheus text exposition format.
pub fn encode_metrics(registry: &Registry) -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode metrics: {}", e);
    }
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}

/// Collector children bound to one engine label.
///
/// Engines obtain theirs with [`EngineMetrics::claim`], which reserves the
/// label for the engine's lifetime, and hand it back with
/// [`EngineMetrics::release`] on dispose so the label series are removed.
#[derive(Debug, Clone)]
pub struct EngineMetrics {
    engine: String,
    pub cycles_started: IntCounter,
    pub ticks_skipped: IntCounter,
    pub cycles_panicked: IntCounter,
    pub changes_emitted: IntCounter,
    pub fetch_failures: IntCounter,
    pub callback_panics: IntCounter,
    pub source_panics: IntCounter,
    pub watched_addresses: IntGauge,
    pub cycle_duration_ms: Histogram,
}

impl EngineMetrics {
    /// Binds the children for `engine` without reserving the label.
    pub fn new(engine: &str) -> Self {
        let labels = &[engine];
        Self {
            engine: engine.to_string(),
            cycles_started: CYCLES_STARTED.with_label_values(labels),
            ticks_skipped: TICKS_SKIPPED.with_label_values(labels),
            cycles_panicked: CYCLES_PANICKED.with_label_values(labels),
            changes_emitted: CHANGES_EMITTED.with_label_values(labels),
            fetch_failures: FETCH_FAILURES.with_label_values(labels),
            callback_panics: CALLBACK_PANICS.with_label_values(labels),
            source_panics: SOURCE_PANICS.with_label_values(labels),
            watched_addresses: WATCHED_ADDRESSES.with_label_values(labels),
            cycle_duration_ms: CYCLE_DURATION_MS.with_label_values(labels),
        }
    }

    /// Reserves `engine` as a live label.
    ///
    /// Fails with [`EngineError::DuplicateName`] while another live engine
    /// holds the same name.
    pub fn claim(engine: &str) -> Result<Self> {
        if !LIVE_ENGINES.lock().insert(engine.to_string()) {
            return Err(EngineError::DuplicateName(engine.to_string()).into());
        }
        Ok(Self::new(engine))
    }

    /// Removes every series labelled with this engine and frees the name.
    ///
    /// Children still held elsewhere keep working but are no longer exported.
    pub fn release(&self) {
        let labels = &[self.engine.as_str()];
        let removed = [
            CYCLES_STARTED.remove_label_values(labels),
            TICKS_SKIPPED.remove_label_values(labels),
            CYCLES_PANICKED.remove_label_values(labels),
            CHANGES_EMITTED.remove_label_values(labels),
            FETCH_FAILURES.remove_label_values(labels),
            CALLBACK_PANICS.remove_label_values(labels),
            SOURCE_PANICS.remove_label_values(labels),
            WATCHED_ADDRESSES.remove_label_values(labels),
            CYCLE_DURATION_MS.remove_label_values(labels),
        ];
        if let Some(Err(e)) = removed.into_iter().find(|r| r.is_err()) {
            debug!(engine = %self.engine, "metric series already gone: {}", e);
        }
        LIVE_ENGINES.lock().remove(&self.engine);
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }
}
