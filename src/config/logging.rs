use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::Error;
use crate::Result;

/// Log settings for the binary. `RUST_LOG` still wins when set.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive string
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl LogConfig {
    pub fn validate(&self) -> Result<()> {
        EnvFilter::try_new(&self.filter).map_err(|e| {
            Error::Config(ConfigError::Message(format!(
                "invalid log filter {:?}: {}",
                self.filter, e
            )))
        })?;
        Ok(())
    }
}
