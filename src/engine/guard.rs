//! CycleGuard: RAII guard ensuring at most one sampling cycle runs at a time.
//!
//! Acquisition is a single `compare_exchange` on a shared `AtomicBool`. It
//! never blocks: when a cycle is already running the caller gets `None` and
//! is expected to drop its tick. The flag is released when the guard is
//! dropped, including when the cycle unwinds.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct CycleGuard {
    flag: Arc<AtomicBool>,
}

impl CycleGuard {
    pub(crate) fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
