//! Configuration management for the watch engine and its demo binary.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - An optional `config/sim-watch.toml`
//! - A configuration file named by `CONFIG_PATH` or passed explicitly
//! - Environment variable overrides (`SIM_WATCH__ENGINE__INTERVAL_MS=250`)
//! - Component-wise validation
mod engine;
mod logging;
mod simulation;
pub use engine::*;
pub use logging::*;
pub use simulation::*;
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_PATH_ENV;
use crate::constants::DEFAULT_CONFIG_FILE;
use crate::constants::ENV_PREFIX;
use crate::Result;

/// Top-level settings container
///
/// Combines all section configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. `config/sim-watch.toml` when present
/// 3. Configuration file specified by `CONFIG_PATH`
/// 4. Environment variables (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// Sampling engine parameters
    #[serde(default)]
    pub engine: EngineSettings,
    /// Log filter for the binary
    #[serde(default)]
    pub log: LogConfig,
    /// Simulated remote source used by the binary
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Settings {
    /// Creates settings from defaults, optional files and environment.
    ///
    /// Callers MUST call `validate()` before using the result.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let settings: Self = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Applies overrides from `path` on top of the current values.
    ///
    /// Environment variables are re-applied last so they keep the highest
    /// priority. Does NOT validate.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let settings: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path).required(true))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.engine.validate()?;
        self.log.validate()?;
        self.simulation.validate()?;
        Ok(self)
    }

    /// `new()`, then the optional override file, then `validate()`.
    pub fn load(override_path: Option<&str>) -> Result<Self> {
        let settings = Self::new()?;
        let settings = match override_path {
            Some(path) => settings.with_override_config(path)?,
            None => settings,
        };
        settings.validate()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
