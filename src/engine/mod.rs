//! Change-detection subscription engine
//!
//! Turns repeated point queries against a [`crate::RemoteValueSource`] into a
//! "value changed" event stream.
//!
//! ```text
//! WatchEngine::add/remove ──► WatchSet (mutex)
//!                                 │ snapshot()
//! Scheduler tick ──► CycleGuard ──► SamplingCycle
//!   (skip if busy)                    │ fetch() per address
//!                                     ▼
//!                         on_change / on_error callbacks
//!                                     │
//!                         WatchSet::record(last value)
//! ```
//!
//! # Guarantees
//!
//! - At most one cycle runs at a time; ticks arriving while a cycle runs are
//!   dropped, so a slow source degrades the polling rate instead of piling up
//!   cycles.
//! - The first successful fetch of a newly added address is always reported,
//!   with `old_value = None`.
//! - Values are compared as text only.
//! - A failed fetch reports through `on_error` and leaves the last value
//!   untouched.
//! - A panic in the source is reported through `on_error` as
//!   `RemoteError::Panicked`; a panic in a callback is logged and skipped. A
//!   panicking cycle is contained per cycle. None of them stops the scheduler.

mod config;
mod cycle;
mod guard;
mod handle;
mod scheduler;

#[cfg(test)]
mod handle_test;

pub use config::{ChangeCallback, EngineConfig, ErrorCallback};
pub use handle::WatchEngine;

pub(crate) use cycle::SamplingCycle;
pub(crate) use scheduler::Scheduler;
