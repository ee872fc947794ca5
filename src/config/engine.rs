use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_INTERVAL_MS;
use crate::constants::MAX_INTERVAL_MS;
use crate::Error;
use crate::Result;

/// File/env representation of the engine parameters
///
/// ```toml
/// [engine]
/// name = "dash"          # Optional, label used in logs and metrics
/// interval_ms = 100      # Optional, default 100
/// fetch_timeout_ms = 500 # Optional, no timeout by default
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineSettings {
    /// Label for logs and metrics. A random one is generated when absent.
    #[serde(default)]
    pub name: Option<String>,

    /// Time between two sampling ticks
    ///
    /// Range: 1-3600000 (1ms to 1 hour)
    /// Default: 100
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Upper bound for a single fetch. A fetch that takes longer is reported
    /// as a timeout failure for its address.
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            name: None,
            interval_ms: default_interval_ms(),
            fetch_timeout_ms: None,
        }
    }
}

impl EngineSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    /// Returns error if:
    /// - `interval_ms` is out of range (1-3600000)
    /// - `fetch_timeout_ms` is zero
    /// - `name` is blank
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_INTERVAL_MS).contains(&self.interval_ms) {
            return Err(Error::Config(ConfigError::Message(format!(
                "engine interval_ms must be between 1 and {}, got {}",
                MAX_INTERVAL_MS, self.interval_ms
            ))));
        }

        if self.fetch_timeout_ms == Some(0) {
            return Err(Error::Config(ConfigError::Message(
                "engine fetch_timeout_ms must be greater than 0".to_string(),
            )));
        }

        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::Config(ConfigError::Message(
                    "engine name must not be blank".to_string(),
                )));
            }
        }

        Ok(())
    }
}
