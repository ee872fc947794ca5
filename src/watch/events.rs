use crate::Address;
use crate::RemoteError;

/// A watched value differs from the last one observed for its address.
///
/// `old_value` is `None` for the first successful observation after the
/// address was added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub address: Address,
    pub old_value: Option<String>,
    pub new_value: String,
}

/// The fetch for one address failed during a sampling cycle.
#[derive(Debug)]
pub struct FetchFailure {
    pub address: Address,
    pub error: RemoteError,
}

/// Either outcome of sampling one address, as delivered over a channel.
#[derive(Debug)]
pub enum EngineEvent {
    Changed(ChangeEvent),
    Failed(FetchFailure),
}
