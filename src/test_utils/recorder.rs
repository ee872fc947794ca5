use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::Address;
use crate::ChangeEvent;
use crate::EngineConfig;

/// Failures reduced to their address and message so they can be compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFailure {
    pub address: Address,
    pub message: String,
}

/// Collects every callback invocation of an engine.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    changes: Arc<Mutex<Vec<ChangeEvent>>>,
    failures: Arc<Mutex<Vec<RecordedFailure>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        &self,
        interval: Duration,
    ) -> EngineConfig {
        let changes = self.changes.clone();
        let failures = self.failures.clone();
        EngineConfig::new(
            interval,
            move |event| changes.lock().push(event),
            move |failure| {
                failures.lock().push(RecordedFailure {
                    address: failure.address,
                    message: failure.error.to_string(),
                })
            },
        )
    }

    pub fn changes(&self) -> Vec<ChangeEvent> {
        self.changes.lock().clone()
    }

    pub fn failures(&self) -> Vec<RecordedFailure> {
        self.failures.lock().clone()
    }

    pub fn take_changes(&self) -> Vec<ChangeEvent> {
        std::mem::take(&mut *self.changes.lock())
    }

    pub fn callback_count(&self) -> usize {
        self.changes.lock().len() + self.failures.lock().len()
    }
}

pub fn change(
    address: &Address,
    old_value: Option<&str>,
    new_value: &str,
) -> ChangeEvent {
    ChangeEvent {
        address: address.clone(),
        old_value: old_value.map(str::to_string),
        new_value: new_value.to_string(),
    }
}
