//! Remote value sources
//!
//! The engine only needs a point query: `fetch(address) -> value | failure`.
//! Latency is variable, calls carry no ordering guarantee relative to each
//! other and the remote side has no push mechanism of its own.

mod simulated;


pub use simulated::SimulatedSource;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::Address;
use crate::RemoteError;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait RemoteValueSource: Send + Sync + 'static {
    /// Fetches the current value of `address`, rendered as text.
    ///
    /// The engine compares values purely by string equality, so the
    /// rendering must be stable for an unchanged remote value.
    async fn fetch(
        &self,
        address: &Address,
    ) -> std::result::Result<String, RemoteError>;
}
