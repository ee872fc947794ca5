//! One sampling pass over a snapshot of the watch set.
//!
//! For every item: fetch, compare against the last observed value as text,
//! then report a change or a failure. A panicking fetch is reported as a
//! [`RemoteError::Panicked`] failure for its address, and a panicking
//! callback is logged and skipped, so either only costs that item.

use std::fmt;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::trace;
use tracing::warn;

use super::ChangeCallback;
use super::ErrorCallback;
use crate::Address;
use crate::ChangeEvent;
use crate::EngineMetrics;
use crate::FetchFailure;
use crate::RemoteError;
use crate::RemoteValueSource;
use crate::WatchSet;
use crate::WatchedItem;

pub(crate) struct SamplingCycle {
    pub(crate) name: String,
    pub(crate) source: Arc<dyn RemoteValueSource>,
    pub(crate) watch_set: Arc<WatchSet>,
    pub(crate) on_change: ChangeCallback,
    pub(crate) on_error: ErrorCallback,
    pub(crate) fetch_timeout: Option<Duration>,
    pub(crate) shutdown: CancellationToken,
    pub(crate) metrics: EngineMetrics,
}

impl SamplingCycle {
    pub(crate) async fn run(&self) {
        let started = Instant::now();
        let snapshot = self.watch_set.snapshot();
        debug!(engine = %self.name, items = snapshot.len(), "sampling cycle started");

        for item in snapshot {
            // Disposed mid-cycle: no callbacks after dispose() returns
            if self.shutdown.is_cancelled() {
                debug!(engine = %self.name, "engine disposed, abandoning cycle");
                break;
            }

            self.sample(item).await;
        }

        let elapsed = started.elapsed();
        self.metrics
            .cycle_duration_ms
            .observe(elapsed.as_secs_f64() * 1000.0);
        debug!(engine = %self.name, ?elapsed, "sampling cycle finished");
    }

    async fn sample(
        &self,
        item: WatchedItem,
    ) {
        let outcome = self.fetch(&item.address).await;
        if self.shutdown.is_cancelled() {
            return;
        }

        match outcome {
            Ok(value) => {
                if item.last_value.as_deref() == Some(value.as_str()) {
                    trace!(engine = %self.name, address = %item.address, "value unchanged");
                    return;
                }

                let event = ChangeEvent {
                    address: item.address.clone(),
                    old_value: item.last_value.clone(),
                    new_value: value.clone(),
                };
                trace!(engine = %self.name, ?event, "value changed");
                self.metrics.changes_emitted.inc();
                self.dispatch(&item.address, || (self.on_change)(event));

                if !self.watch_set.record(&item, value) {
                    trace!(
                        engine = %self.name,
                        address = %item.address,
                        "item removed during fetch, value discarded"
                    );
                }
            }
            Err(error) => {
                warn!(engine = %self.name, address = %item.address, %error, "fetch failed");
                self.metrics.fetch_failures.inc();
                let failure = FetchFailure {
                    address: item.address.clone(),
                    error,
                };
                self.dispatch(&item.address, || (self.on_error)(failure));
            }
        }
    }

    async fn fetch(
        &self,
        address: &Address,
    ) -> std::result::Result<String, RemoteError> {
        match self.fetch_timeout {
            Some(duration) => match tokio::time::timeout(duration, self.guarded_fetch(address)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(RemoteError::Timeout {
                    address: address.clone(),
                    duration,
                }),
            },
            None => self.guarded_fetch(address).await,
        }
    }

    async fn guarded_fetch(
        &self,
        address: &Address,
    ) -> std::result::Result<String, RemoteError> {
        match AssertUnwindSafe(self.source.fetch(address)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.metrics.source_panics.inc();
                error!(engine = %self.name, %address, "source panicked during fetch");
                Err(RemoteError::Panicked {
                    address: address.clone(),
                })
            }
        }
    }

    /// Runs a consumer callback; a panic is logged and swallowed.
    fn dispatch(
        &self,
        address: &Address,
        callback: impl FnOnce(),
    ) {
        if panic::catch_unwind(AssertUnwindSafe(callback)).is_err() {
            self.metrics.callback_panics.inc();
            error!(engine = %self.name, %address, "callback panicked, continuing");
        }
    }
}

impl fmt::Debug for SamplingCycle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("SamplingCycle")
            .field("name", &self.name)
            .field("watch_set", &self.watch_set)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}
