//! # sim-watch
//!
//! Mirrors values from a request/response API that has no push mechanism as
//! a clean "value changed" event stream. The [`WatchEngine`] samples a set of
//! [`Address`]es at a fixed interval, diffs each fetched value against the
//! last one observed and reports changes and per-address failures through
//! callbacks.
//!
//! Only the remote point query is pluggable, via [`RemoteValueSource`].
//! [`SimulatedSource`] is an in-process implementation used by the demo
//! binary.

mod config;
mod constants;
mod engine;
mod errors;
mod metrics;
mod source;
mod watch;

pub use config::*;
pub use engine::*;
pub use errors::*;
pub use metrics::*;
pub use source::*;
pub use watch::*;


//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
