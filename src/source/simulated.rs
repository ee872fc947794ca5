use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use tracing::trace;

use super::RemoteValueSource;
use crate::Address;
use crate::RemoteError;
use crate::Result;
use crate::SimulationConfig;

/// In-process stand-in for the remote API.
///
/// Each address holds an integer that performs a bounded random walk on every
/// fetch. Fetches sleep for `latency_ms` and fail with
/// [`RemoteError::Unavailable`] with probability `failure_rate`.
#[derive(Debug)]
pub struct SimulatedSource {
    config: SimulationConfig,
    values: Mutex<HashMap<Address, i64>>,
}

enum Step {
    Fail,
    Move(i64),
}

impl SimulatedSource {
    /// Fails when `config` does not pass [`SimulationConfig::validate`].
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            values: Mutex::new(HashMap::new()),
        })
    }

    /// Sets the current simulated value of `address`.
    pub fn pin(
        &self,
        address: &Address,
        value: i64,
    ) {
        self.values.lock().insert(address.clone(), value);
    }

    /// Current simulated value without advancing the walk.
    pub fn peek(
        &self,
        address: &Address,
    ) -> Option<i64> {
        self.values.lock().get(address).copied()
    }

    // ThreadRng is !Send, keep it out of the async body
    fn next_step(&self) -> Step {
        let mut rng = rand::thread_rng();
        if self.config.failure_rate > 0.0 && rng.gen_bool(self.config.failure_rate) {
            return Step::Fail;
        }
        let max_step = self.config.max_step;
        if max_step == 0 {
            Step::Move(0)
        } else {
            Step::Move(rng.gen_range(-max_step..=max_step))
        }
    }
}

#[async_trait]
impl RemoteValueSource for SimulatedSource {
    async fn fetch(
        &self,
        address: &Address,
    ) -> std::result::Result<String, RemoteError> {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        match self.next_step() {
            Step::Fail => Err(RemoteError::Unavailable(format!("simulated outage for {address}"))),
            Step::Move(delta) => {
                let mut values = self.values.lock();
                let value = values.entry(address.clone()).or_insert(0);
                *value = value.saturating_add(delta);
                trace!(%address, value = *value, "simulated fetch");
                Ok(value.to_string())
            }
        }
    }
}
