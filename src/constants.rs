// -
// Engine defaults

/// Sampling interval used when nothing is configured
pub(crate) const DEFAULT_INTERVAL_MS: u64 = 100;

/// Upper bound accepted for `engine.interval_ms` (one hour)
pub(crate) const MAX_INTERVAL_MS: u64 = 3_600_000;

/// Separator between the container and leaf segments of an address
pub(crate) const ADDRESS_SEPARATOR: char = '/';

/// Length of generated engine names
pub(crate) const ENGINE_NAME_LEN: usize = 8;

/// Upper bound accepted for `simulation.max_step`
pub(crate) const MAX_SIMULATION_STEP: i64 = 1_000_000_000;

// -
// Settings sources

pub(crate) const DEFAULT_CONFIG_FILE: &str = "config/sim-watch";
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
pub(crate) const ENV_PREFIX: &str = "SIM_WATCH";
