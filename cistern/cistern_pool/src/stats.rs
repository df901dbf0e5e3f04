//! Counters describing how a pool has been used.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Snapshot of pool statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Resources produced by the factory
    pub created: usize,

    /// Acquisitions served from the idle cache
    pub reused: usize,

    /// Factory invocations that returned an error
    pub factory_failures: usize,

    /// Releases that put the resource back into the idle cache
    pub recycled: usize,

    /// Resources closed on release, because the cache was full or the pool closed
    pub discarded: usize,

    /// Idle resources closed while draining the pool
    pub drained: usize,

    /// Resource close calls that returned an error
    pub close_failures: usize,

    /// Resources currently idle
    pub idle: usize,
}

impl PoolStats {
    /// Resources closed by the pool, whether discarded or drained
    pub fn closed(&self) -> usize {
        self.discarded + self.drained
    }

    /// Resources currently held by callers
    ///
    /// Every resource the factory produced is either closed, idle or held.
    pub fn outstanding(&self) -> usize {
        self.created.saturating_sub(self.closed() + self.idle)
    }
}

/// Live counters updated by the pools
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub(crate) created: AtomicUsize,
    pub(crate) reused: AtomicUsize,
    pub(crate) factory_failures: AtomicUsize,
    pub(crate) recycled: AtomicUsize,
    pub(crate) discarded: AtomicUsize,
    pub(crate) drained: AtomicUsize,
    pub(crate) close_failures: AtomicUsize,
}

impl PoolCounters {
    pub(crate) fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, idle: usize) -> PoolStats {
        PoolStats {
            created: self.created.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            factory_failures: self.factory_failures.load(Ordering::Relaxed),
            recycled: self.recycled.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
            close_failures: self.close_failures.load(Ordering::Relaxed),
            idle,
        }
    }
}
