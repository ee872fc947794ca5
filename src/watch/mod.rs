//! Watched addresses and the events produced for them
//!
//! - [`Address`]: structural key of one remote value (`container/leaf`)
//! - [`WatchSet`]: mutex-guarded membership plus last observed value per address
//! - [`ChangeEvent`] / [`FetchFailure`]: what a sampling cycle reports

mod address;
mod events;
mod watch_set;


pub use address::Address;
pub use events::{ChangeEvent, EngineEvent, FetchFailure};
pub use watch_set::{WatchSet, WatchedItem};
