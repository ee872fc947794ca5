//! The set of addresses currently being sampled.
//!
//! Every read and write goes through one `parking_lot::Mutex`, held only for
//! the in-memory operation. Cycles work on a [`WatchSet::snapshot`] so no lock
//! is held across a remote fetch.
//!
//! Each inserted item gets a generation id. Writing a fetched value back with
//! [`WatchSet::record`] only succeeds if the live item still carries the
//! generation the snapshot saw, so a value fetched for an address that was
//! removed (or removed and re-added) while the fetch was in flight is dropped.
//!
//! An optional gauge mirrors the item count. It is written while the lock is
//! held, so concurrent membership calls cannot leave it stale.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use prometheus::IntGauge;
use tracing::trace;

use crate::Address;

/// Immutable copy of one watched item, taken under the set's lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedItem {
    pub address: Address,
    pub last_value: Option<String>,
    pub(crate) generation: u64,
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    last_value: Option<String>,
}

#[derive(Debug, Default)]
struct WatchSetState {
    items: BTreeMap<Address, Slot>,
    next_generation: u64,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct WatchSet {
    state: Mutex<WatchSetState>,
    size_gauge: Option<IntGauge>,
}

impl WatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whose item count is published on `gauge`.
    pub fn with_size_gauge(gauge: IntGauge) -> Self {
        gauge.set(0);
        Self {
            state: Mutex::default(),
            size_gauge: Some(gauge),
        }
    }

    fn publish_size(
        &self,
        state: &WatchSetState,
    ) {
        if let Some(gauge) = &self.size_gauge {
            gauge.set(state.items.len() as i64);
        }
    }

    /// Inserts `address` with no last value.
    ///
    /// Returns `false` when the address is already present (its last value is
    /// left untouched) or the set has been closed.
    pub fn add(
        &self,
        address: Address,
    ) -> bool {
        let mut state = self.state.lock();
        if state.closed || state.items.contains_key(&address) {
            return false;
        }

        state.next_generation += 1;
        let generation = state.next_generation;
        trace!(%address, generation, "watch item added");
        state.items.insert(
            address,
            Slot {
                generation,
                last_value: None,
            },
        );
        self.publish_size(&state);
        true
    }

    /// Returns `false` when the address was not present.
    pub fn remove(
        &self,
        address: &Address,
    ) -> bool {
        let mut state = self.state.lock();
        let removed = state.items.remove(address).is_some();
        if removed {
            self.publish_size(&state);
            trace!(%address, "watch item removed");
        }
        removed
    }

    pub fn snapshot(&self) -> Vec<WatchedItem> {
        self.state
            .lock()
            .items
            .iter()
            .map(|(address, slot)| WatchedItem {
                address: address.clone(),
                last_value: slot.last_value.clone(),
                generation: slot.generation,
            })
            .collect()
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.state.lock().items.keys().cloned().collect()
    }

    pub fn last_value(
        &self,
        address: &Address,
    ) -> Option<String> {
        self.state
            .lock()
            .items
            .get(address)
            .and_then(|slot| slot.last_value.clone())
    }

    /// Stores a successfully fetched value for the item a snapshot produced.
    ///
    /// Returns `false` if the live item is gone or belongs to a newer
    /// generation.
    pub fn record(
        &self,
        item: &WatchedItem,
        value: String,
    ) -> bool {
        let mut state = self.state.lock();
        match state.items.get_mut(&item.address) {
            Some(slot) if slot.generation == item.generation => {
                slot.last_value = Some(value);
                true
            }
            _ => false,
        }
    }

    /// Drops every item and rejects further inserts.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.items.clear();
        self.publish_size(&state);
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }
}
