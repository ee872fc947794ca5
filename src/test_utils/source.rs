use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::Address;
use crate::RemoteError;
use crate::RemoteValueSource;

/// Source whose answers are set by the test and stay until changed.
///
/// Addresses without an answer fail with `NotFound`. Tracks call count and
/// the highest number of concurrently running fetches.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    answers: Mutex<HashMap<Address, std::result::Result<String, String>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn set(
        &self,
        address: &Address,
        value: &str,
    ) {
        self.answers.lock().insert(address.clone(), Ok(value.to_string()));
    }

    pub fn fail(
        &self,
        address: &Address,
        reason: &str,
    ) {
        self.answers.lock().insert(address.clone(), Err(reason.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteValueSource for ScriptedSource {
    async fn fetch(
        &self,
        address: &Address,
    ) -> std::result::Result<String, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let answer = self.answers.lock().get(address).cloned();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match answer {
            Some(Ok(value)) => Ok(value),
            Some(Err(reason)) => Err(RemoteError::Unavailable(reason)),
            None => Err(RemoteError::NotFound(address.clone())),
        }
    }
}
