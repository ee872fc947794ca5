use std::sync::Arc;
use std::time::Duration;

use prometheus::core::Collector;

use super::*;
use crate::test_utils::addr;
use crate::test_utils::change;
use crate::test_utils::enable_logger;
use crate::test_utils::settle;
use crate::test_utils::Recorder;
use crate::test_utils::ScriptedSource;
use crate::EngineError;
use crate::EngineEvent;
use crate::EngineSettings;
use crate::Error;
use crate::CYCLES_STARTED;
use crate::WATCHED_ADDRESSES;

fn has_series(engine: &str) -> bool {
    CYCLES_STARTED
        .collect()
        .iter()
        .flat_map(|family| family.get_metric())
        .any(|metric| metric.get_label().iter().any(|label| label.get_value() == engine))
}

fn engine_with(
    source: &Arc<ScriptedSource>,
    recorder: &Recorder,
) -> WatchEngine {
    WatchEngine::create(source.clone(), recorder.config(Duration::from_millis(100))).unwrap()
}

#[tokio::test]
async fn test_create_rejects_zero_interval() {
    let source = Arc::new(ScriptedSource::new());
    let result = WatchEngine::create(source, Recorder::new().config(Duration::ZERO));
    assert!(matches!(
        result,
        Err(Error::Engine(EngineError::InvalidInterval(_)))
    ));
}

#[test]
fn test_create_requires_runtime() {
    let source = Arc::new(ScriptedSource::new());
    let result = WatchEngine::create(source, Recorder::new().config(Duration::from_millis(100)));
    assert!(matches!(result, Err(Error::Engine(EngineError::NoRuntime))));
}

#[tokio::test]
async fn test_generated_name() {
    let source = Arc::new(ScriptedSource::new());
    let engine = engine_with(&source, &Recorder::new());
    assert_eq!(engine.name().len(), 8);

    let named = WatchEngine::create(
        source.clone(),
        Recorder::new()
            .config(Duration::from_millis(100))
            .with_name("dashboard"),
    )
    .unwrap();
    assert_eq!(named.name(), "dashboard");
}

#[tokio::test]
async fn test_membership_is_idempotent() {
    let source = Arc::new(ScriptedSource::new());
    let engine = engine_with(&source, &Recorder::new());

    assert!(engine.add(addr("Rpm")));
    assert!(!engine.add(addr("Rpm")));
    assert!(engine.add(addr("Gear")));
    assert_eq!(engine.endpoints(), vec![addr("Gear"), addr("Rpm")]);

    assert!(!engine.remove(&addr("Speed")));
    assert!(engine.remove(&addr("Rpm")));
    assert!(!engine.remove(&addr("Rpm")));
    assert_eq!(engine.endpoints(), vec![addr("Gear")]);
}

#[tokio::test]
async fn test_watched_addresses_gauge_follows_membership() {
    let source = Arc::new(ScriptedSource::new());
    let engine = WatchEngine::create(
        source,
        Recorder::new()
            .config(Duration::from_millis(100))
            .with_name("handle-gauge"),
    )
    .unwrap();
    let gauge = WATCHED_ADDRESSES.with_label_values(&["handle-gauge"]);

    engine.add(addr("Rpm"));
    engine.add(addr("Gear"));
    assert_eq!(gauge.get(), 2);

    engine.remove(&addr("Rpm"));
    assert_eq!(gauge.get(), 1);

    engine.dispose();
    assert_eq!(gauge.get(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_removes_metric_series() {
    let source = Arc::new(ScriptedSource::new());
    let mut names = Vec::new();

    for _ in 0..50 {
        let engine = engine_with(&source, &Recorder::new());
        engine.add(addr("Rpm"));
        settle(Duration::from_millis(1)).await;
        assert!(has_series(engine.name()));

        names.push(engine.name().to_string());
        engine.dispose();
    }

    for name in &names {
        assert!(!has_series(name), "series for {name} left behind");
    }
}

#[tokio::test]
async fn test_duplicate_live_name_is_rejected() {
    let source = Arc::new(ScriptedSource::new());
    let config = || {
        Recorder::new()
            .config(Duration::from_millis(100))
            .with_name("handle-duplicate")
    };

    let first = WatchEngine::create(source.clone(), config()).unwrap();
    let second = WatchEngine::create(source.clone(), config());
    assert!(matches!(
        second,
        Err(Error::Engine(EngineError::DuplicateName(ref name))) if name == "handle-duplicate"
    ));

    first.dispose();
    let reused = WatchEngine::create(source.clone(), config()).unwrap();
    assert_eq!(reused.name(), "handle-duplicate");
}

#[tokio::test(start_paused = true)]
async fn test_readding_same_address_keeps_last_value() {
    let rpm = addr("Rpm");
    let source = Arc::new(ScriptedSource::new());
    source.set(&rpm, "5");
    let recorder = Recorder::new();
    let engine = engine_with(&source, &recorder);

    engine.add(rpm.clone());
    settle(Duration::from_millis(50)).await;
    assert_eq!(recorder.take_changes(), vec![change(&rpm, None, "5")]);

    engine.add(rpm.clone());
    settle(Duration::from_millis(100)).await;

    assert!(recorder.changes().is_empty());
    assert_eq!(engine.last_value(&rpm), Some("5".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_remove_then_add_starts_fresh() {
    let rpm = addr("Rpm");
    let source = Arc::new(ScriptedSource::new());
    source.set(&rpm, "5");
    let recorder = Recorder::new();
    let engine = engine_with(&source, &recorder);

    engine.add(rpm.clone());
    settle(Duration::from_millis(50)).await;
    assert_eq!(recorder.take_changes(), vec![change(&rpm, None, "5")]);

    engine.remove(&rpm);
    settle(Duration::from_millis(100)).await;
    assert!(recorder.changes().is_empty());
    assert_eq!(engine.last_value(&rpm), None);

    engine.add(rpm.clone());
    settle(Duration::from_millis(100)).await;
    assert_eq!(recorder.changes(), vec![change(&rpm, None, "5")]);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_is_idempotent_and_final() {
    enable_logger();
    let rpm = addr("Rpm");
    let source = Arc::new(ScriptedSource::new());
    source.set(&rpm, "5");
    let recorder = Recorder::new();
    let engine = engine_with(&source, &recorder);
    engine.add(rpm.clone());
    settle(Duration::from_millis(50)).await;

    assert!(engine.is_active());
    engine.dispose();
    engine.dispose();
    assert!(!engine.is_active());

    assert!(!engine.add(addr("Gear")));
    assert!(!engine.remove(&rpm));
    assert!(engine.endpoints().is_empty());

    let seen = recorder.callback_count();
    source.set(&rpm, "6");
    settle(Duration::from_millis(500)).await;
    assert_eq!(recorder.callback_count(), seen);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_from_callback_does_not_deadlock() {
    let rpm = addr("Rpm");
    let source = Arc::new(ScriptedSource::new());
    source.set(&rpm, "5");

    let slot: Arc<parking_lot::Mutex<Option<Arc<WatchEngine>>>> = Arc::new(parking_lot::Mutex::new(None));
    let inside = slot.clone();
    let config = EngineConfig::new(
        Duration::from_millis(100),
        move |_| {
            if let Some(engine) = inside.lock().as_ref() {
                engine.dispose();
            }
        },
        |_| {},
    );

    let engine = Arc::new(WatchEngine::create(source.clone(), config).unwrap());
    *slot.lock() = Some(engine.clone());
    engine.add(rpm.clone());

    settle(Duration::from_millis(50)).await;
    assert!(!engine.is_active());

    let calls = source.calls();
    settle(Duration::from_millis(500)).await;
    assert_eq!(source.calls(), calls);

    slot.lock().take();
}

#[tokio::test(start_paused = true)]
async fn test_drop_disposes_engine() {
    let rpm = addr("Rpm");
    let source = Arc::new(ScriptedSource::new());
    source.set(&rpm, "5");
    let recorder = Recorder::new();

    {
        let engine = engine_with(&source, &recorder);
        engine.add(rpm.clone());
        settle(Duration::from_millis(50)).await;
    }

    let calls = source.calls();
    settle(Duration::from_millis(500)).await;
    assert_eq!(source.calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn test_channel_config_forwards_events() {
    let rpm = addr("Rpm");
    let gear = addr("Gear");
    let source = Arc::new(ScriptedSource::new());
    source.set(&rpm, "5");
    source.fail(&gear, "busy");

    let (config, mut events) = EngineConfig::channel(Duration::from_millis(100));
    let engine = WatchEngine::create(source.clone(), config).unwrap();
    engine.add(rpm.clone());
    engine.add(gear.clone());
    settle(Duration::from_millis(50)).await;

    let mut changed = Vec::new();
    let mut failed = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            EngineEvent::Changed(event) => changed.push(event),
            EngineEvent::Failed(failure) => failed.push(failure.address),
        }
    }

    assert_eq!(changed, vec![change(&rpm, None, "5")]);
    assert_eq!(failed, vec![gear]);
    engine.dispose();
}

#[tokio::test(start_paused = true)]
async fn test_channel_receiver_dropped_is_harmless() {
    let rpm = addr("Rpm");
    let source = Arc::new(ScriptedSource::new());
    source.set(&rpm, "5");

    let (config, events) = EngineConfig::channel(Duration::from_millis(100));
    drop(events);
    let engine = WatchEngine::create(source.clone(), config).unwrap();
    engine.add(rpm.clone());
    settle(Duration::from_millis(250)).await;

    assert!(engine.is_active());
    assert_eq!(engine.last_value(&rpm), Some("5".to_string()));
    engine.dispose();
}

#[test]
fn test_with_settings_overlays_engine_section() {
    let settings = EngineSettings {
        name: Some("from-file".to_string()),
        interval_ms: 40,
        fetch_timeout_ms: Some(15),
    };
    let config = Recorder::new()
        .config(Duration::from_millis(100))
        .with_settings(&settings);

    assert_eq!(config.interval, Duration::from_millis(40));
    assert_eq!(config.fetch_timeout, Some(Duration::from_millis(15)));
    assert_eq!(config.name.as_deref(), Some("from-file"));
}
