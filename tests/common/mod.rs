use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use sim_watch::Address;
use sim_watch::ChangeEvent;
use sim_watch::EngineConfig;
use sim_watch::RemoteError;
use sim_watch::RemoteValueSource;

static LOGGER_INIT: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}

/// Remote API stand-in whose current values are set by the test.
#[derive(Debug, Default)]
pub struct FakeRemote {
    values: Mutex<HashMap<Address, Result<String, String>>>,
    calls: AtomicUsize,
}

impl FakeRemote {
    pub fn set(
        &self,
        address: &Address,
        value: &str,
    ) {
        self.values.lock().insert(address.clone(), Ok(value.to_string()));
    }

    pub fn fail(
        &self,
        address: &Address,
        reason: &str,
    ) {
        self.values.lock().insert(address.clone(), Err(reason.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteValueSource for FakeRemote {
    async fn fetch(
        &self,
        address: &Address,
    ) -> Result<String, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.values.lock().get(address).cloned() {
            Some(Ok(value)) => Ok(value),
            Some(Err(reason)) => Err(RemoteError::Unavailable(reason)),
            None => Err(RemoteError::NotFound(address.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seen {
    Changed(ChangeEvent),
    Failed(Address),
}

/// Callbacks that append to one shared, ordered log.
pub fn recording_config(interval: std::time::Duration) -> (EngineConfig, Arc<Mutex<Vec<Seen>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let changes = log.clone();
    let failures = log.clone();
    let config = EngineConfig::new(
        interval,
        move |event| changes.lock().push(Seen::Changed(event)),
        move |failure| failures.lock().push(Seen::Failed(failure.address)),
    );
    (config, log)
}

pub fn changed(
    address: &Address,
    old_value: Option<&str>,
    new_value: &str,
) -> Seen {
    Seen::Changed(ChangeEvent {
        address: address.clone(),
        old_value: old_value.map(str::to_string),
        new_value: new_value.to_string(),
    })
}
