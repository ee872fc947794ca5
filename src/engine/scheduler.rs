//! Drives sampling cycles at a fixed interval.
//!
//! The ticker fires immediately on start and then every `interval`. Each tick
//! tries to take the [`CycleGuard`]; if the previous cycle still holds it the
//! tick is dropped, never queued. Cycles run in their own task so a slow
//! source never stalls the ticker, and a panicking cycle is contained there.
//!
//! Stopping is synchronous: once [`Scheduler::stop`] returns no new cycle can
//! be spawned. The `active` flag is checked and the cycle spawned under the
//! same lock that `stop` takes.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::guard::CycleGuard;
use super::SamplingCycle;

#[derive(Debug)]
pub(crate) struct Scheduler {
    cycle: Arc<SamplingCycle>,
    interval: Duration,
    active: Mutex<bool>,
    running: Arc<AtomicBool>,
    shutdown: CancellationToken,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub(crate) fn new(
        cycle: Arc<SamplingCycle>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self {
            cycle,
            interval,
            active: Mutex::new(true),
            running: Arc::new(AtomicBool::new(false)),
            shutdown,
            ticker: Mutex::new(None),
        })
    }

    /// Spawns the ticker task on `runtime`.
    pub(crate) fn start(
        self: &Arc<Self>,
        runtime: &Handle,
    ) {
        let scheduler = self.clone();
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(scheduler.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            debug!(engine = %scheduler.cycle.name, interval = ?scheduler.interval, "scheduler started");

            loop {
                tokio::select! {
                    biased;
                    _ = scheduler.shutdown.cancelled() => {
                        break;
                    }
                    _ = ticker.tick() => {
                        if !scheduler.on_tick() {
                            break;
                        }
                    }
                }
            }

            debug!(engine = %scheduler.cycle.name, "scheduler stopped");
        });
        *self.ticker.lock() = Some(handle);
    }

    /// Returns `false` once the scheduler has been stopped.
    fn on_tick(&self) -> bool {
        let active = self.active.lock();
        if !*active {
            return false;
        }

        match CycleGuard::try_acquire(&self.running) {
            Some(guard) => {
                self.cycle.metrics.cycles_started.inc();
                tokio::spawn(run_guarded(self.cycle.clone(), guard));
            }
            None => {
                self.cycle.metrics.ticks_skipped.inc();
                warn!(engine = %self.cycle.name, "previous cycle still running, tick skipped");
            }
        }
        true
    }

    /// Stops ticking. Returns `false` if already stopped.
    ///
    /// A cycle already in flight is left to finish; it stops delivering
    /// callbacks at its next item boundary.
    pub(crate) fn stop(&self) -> bool {
        {
            let mut active = self.active.lock();
            if !*active {
                return false;
            }
            *active = false;
        }

        self.shutdown.cancel();
        if let Some(handle) = self.ticker.lock().take() {
            handle.abort();
        }
        info!(engine = %self.cycle.name, "scheduler stop requested");
        true
    }

    pub(crate) fn is_active(&self) -> bool {
        *self.active.lock()
    }

    pub(crate) fn is_cycle_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

async fn run_guarded(
    cycle: Arc<SamplingCycle>,
    _guard: CycleGuard,
) {
    if AssertUnwindSafe(cycle.run()).catch_unwind().await.is_err() {
        cycle.metrics.cycles_panicked.inc();
        error!(engine = %cycle.name, "sampling cycle panicked, scheduler keeps ticking");
    }
}
