//! Helpers shared by the unit tests
mod common;
mod recorder;
mod source;

pub use common::*;
pub use recorder::*;
pub use source::*;
