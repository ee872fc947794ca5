//! Error hierarchy for the watch engine
//!
//! Construction and configuration problems surface as [`Error`]. Failures of
//! a single remote fetch are modelled separately as [`RemoteError`]: they are
//! data-level events delivered through the engine's error callback and never
//! terminate the engine.

use std::time::Duration;

use config::ConfigError;

use crate::Address;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Settings loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Engine construction failures
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Address text that does not have the `container/leaf` shape
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Metric registration failures
    #[error(transparent)]
    Metrics(#[from] prometheus::Error),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine spawns its scheduler on the ambient tokio runtime
    #[error("No tokio runtime available to drive the scheduler")]
    NoRuntime,

    /// A zero interval would make the ticker spin
    #[error("Sampling interval must be greater than zero, got {0:?}")]
    InvalidInterval(Duration),

    /// Another live engine already uses this name as its metrics label
    #[error("An engine named {0:?} is already running")]
    DuplicateName(String),
}

/// Failure of a single `fetch(address)` call.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The fetch did not complete within the allotted time
    #[error("Fetch of {address} timed out after {duration:?}")]
    Timeout { address: Address, duration: Duration },

    /// Remote API reachable but not serving (HTTP 503 equivalent)
    #[error("Remote service unavailable: {0}")]
    Unavailable(String),

    /// The remote side does not know the address
    #[error("Remote value not found: {0}")]
    NotFound(Address),

    /// A payload came back but could not be turned into text
    #[error("Malformed payload for {address}: {reason}")]
    Malformed { address: Address, reason: String },

    /// The source panicked while fetching; the panic was contained
    #[error("Source panicked while fetching {address}")]
    Panicked { address: Address },

    /// Lower-level transport failure with source context
    #[error("Transport failure: {source}")]
    Transport {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
