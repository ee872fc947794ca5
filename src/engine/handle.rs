use std::fmt;
use std::sync::Arc;

use nanoid::nanoid;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;

use super::EngineConfig;
use super::SamplingCycle;
use super::Scheduler;
use crate::constants::ENGINE_NAME_LEN;
use crate::Address;
use crate::EngineError;
use crate::EngineMetrics;
use crate::RemoteValueSource;
use crate::Result;
use crate::WatchSet;

/// Public handle of a running change-detection engine.
///
/// Lifecycle is linear: created running, then disposed for good. Membership
/// calls are safe from any thread at any time; after [`WatchEngine::dispose`]
/// they are no-ops. Dropping the handle disposes the engine.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use std::time::Duration;
/// use sim_watch::{Address, EngineConfig, SimulatedSource, SimulationConfig, WatchEngine};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let source = Arc::new(SimulatedSource::new(SimulationConfig::default())?);
/// let config = EngineConfig::new(
///     Duration::from_millis(100),
///     |change| println!("{} -> {}", change.address, change.new_value),
///     |failure| eprintln!("{}: {}", failure.address, failure.error),
/// );
///
/// let engine = WatchEngine::create(source, config)?;
/// engine.add(Address::new("Vehicle", "EngineRpm"));
/// // ...
/// engine.dispose();
/// # Ok::<(), sim_watch::Error>(())
/// # });
/// ```
pub struct WatchEngine {
    name: String,
    watch_set: Arc<WatchSet>,
    scheduler: Arc<Scheduler>,
    metrics: EngineMetrics,
}

impl WatchEngine {
    /// Creates the engine and starts ticking right away; the first cycle runs
    /// without waiting for a full interval.
    ///
    /// Must be called from within a tokio runtime. The engine name labels its
    /// metric series and must be unique among live engines; a name is free
    /// again once its engine is disposed.
    pub fn create(
        source: Arc<dyn RemoteValueSource>,
        config: EngineConfig,
    ) -> Result<Self> {
        if config.interval.is_zero() {
            return Err(EngineError::InvalidInterval(config.interval).into());
        }
        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;

        let name = config.name.unwrap_or_else(|| nanoid!(ENGINE_NAME_LEN));
        let metrics = EngineMetrics::claim(&name)?;
        let watch_set = Arc::new(WatchSet::with_size_gauge(metrics.watched_addresses.clone()));

        let cycle = Arc::new(SamplingCycle {
            name: name.clone(),
            source,
            watch_set: watch_set.clone(),
            on_change: config.on_change,
            on_error: config.on_error,
            fetch_timeout: config.fetch_timeout,
            shutdown: CancellationToken::new(),
            metrics: metrics.clone(),
        });
        let scheduler = Scheduler::new(cycle.clone(), config.interval, cycle.shutdown.clone());
        scheduler.start(&runtime);

        info!(engine = %name, interval = ?config.interval, "watch engine created");
        Ok(Self {
            name,
            watch_set,
            scheduler,
            metrics,
        })
    }

    /// Starts watching `address`. Returns `false` if it was already watched
    /// (its last value is kept) or the engine is disposed.
    pub fn add(
        &self,
        address: Address,
    ) -> bool {
        if !self.is_active() {
            debug!(engine = %self.name, %address, "add ignored, engine disposed");
            return false;
        }
        self.watch_set.add(address)
    }

    /// Stops watching `address`. Returns `false` if it was not watched.
    pub fn remove(
        &self,
        address: &Address,
    ) -> bool {
        if !self.is_active() {
            return false;
        }
        self.watch_set.remove(address)
    }

    /// Currently watched addresses, in address order.
    pub fn endpoints(&self) -> Vec<Address> {
        self.watch_set.addresses()
    }

    /// Last successfully fetched value for `address`, if any.
    pub fn last_value(
        &self,
        address: &Address,
    ) -> Option<String> {
        self.watch_set.last_value(address)
    }

    pub fn is_active(&self) -> bool {
        self.scheduler.is_active()
    }

    /// Whether a sampling cycle is executing right now.
    pub fn is_sampling(&self) -> bool {
        self.scheduler.is_cycle_running()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops the scheduler, drops every watched item and removes the
    /// engine's metric series. Idempotent.
    pub fn dispose(&self) {
        if !self.scheduler.stop() {
            return;
        }
        self.watch_set.close();
        self.metrics.release();
        info!(engine = %self.name, "watch engine disposed");
    }
}

impl Drop for WatchEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for WatchEngine {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("WatchEngine")
            .field("name", &self.name)
            .field("active", &self.is_active())
            .field("endpoints", &self.watch_set.len())
            .finish_non_exhaustive()
    }
}
