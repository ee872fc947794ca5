use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::MAX_SIMULATION_STEP;
use crate::Error;
use crate::Result;

/// Behaviour of [`crate::SimulatedSource`]
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SimulationConfig {
    /// Artificial delay per fetch
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    /// Probability in [0, 1] that a fetch fails
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,

    /// Largest absolute change of a value between two fetches
    ///
    /// Range: 0-1000000000
    #[serde(default = "default_max_step")]
    pub max_step: i64,
}

fn default_latency_ms() -> u64 {
    20
}

fn default_failure_rate() -> f64 {
    0.05
}

fn default_max_step() -> i64 {
    1
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            failure_rate: default_failure_rate(),
            max_step: default_max_step(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(Error::Config(ConfigError::Message(format!(
                "simulation failure_rate must be between 0 and 1, got {}",
                self.failure_rate
            ))));
        }

        if !(0..=MAX_SIMULATION_STEP).contains(&self.max_step) {
            return Err(Error::Config(ConfigError::Message(format!(
                "simulation max_step must be between 0 and {}, got {}",
                MAX_SIMULATION_STEP, self.max_step
            ))));
        }

        Ok(())
    }
}
