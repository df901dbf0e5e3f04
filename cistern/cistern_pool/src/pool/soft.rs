//! Soft-capped resource pool.
//!
//! The pool keeps at most `target_size` idle resources cached. Acquire takes
//! a cached resource when one is available and otherwise calls the factory
//! right away; it never waits for another caller to release. Under load the
//! number of resources in use can therefore exceed `target_size`. Surplus
//! resources are closed when they are released into a full cache.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, info, trace};
use parking_lot::RwLock;
use std::fmt;

use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::pool::Pool;
use crate::resource::{boxed_factory, close_quietly, BoxError, Factory, Resource};
use crate::stats::{PoolCounters, PoolStats};

/// A soft-capped pool of reusable resources
pub struct ResourcePool<R: Resource> {
    /// Sending half of the idle cache
    idle_tx: Sender<R>,

    /// Receiving half of the idle cache
    idle_rx: Receiver<R>,

    /// Creates a resource when the cache is empty
    factory: Factory<R>,

    /// Set once by `close`. Releases hold the read lock across the
    /// check-and-push so a concurrent close either drains what they pushed
    /// or makes them close the resource themselves.
    closed: RwLock<bool>,

    /// Capacity of the idle cache
    target_size: usize,

    counters: PoolCounters,
}

impl<R: Resource> ResourcePool<R> {
    /// Create a pool that caches up to `target_size` idle resources.
    ///
    /// No resource is created up front.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidSize`] if `target_size` is zero.
    pub fn new<F, E>(target_size: usize, factory: F) -> Result<Self>
    where
        F: Fn() -> std::result::Result<R, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        if target_size == 0 {
            return Err(PoolError::InvalidSize(target_size));
        }

        let (idle_tx, idle_rx) = bounded(target_size);
        debug!("Created resource pool with target size {}", target_size);

        Ok(Self {
            idle_tx,
            idle_rx,
            factory: boxed_factory(factory),
            closed: RwLock::new(false),
            target_size,
            counters: PoolCounters::default(),
        })
    }

    /// Create a pool sized from a configuration
    pub fn with_config<F, E>(config: &PoolConfig, factory: F) -> Result<Self>
    where
        F: Fn() -> std::result::Result<R, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        config.validate()?;
        Self::new(config.target_size, factory)
    }

    /// Take a resource from the idle cache, or create one if it is empty.
    ///
    /// Never waits on other callers. Blocks only for the duration of the
    /// factory call.
    ///
    /// # Errors
    ///
    /// [`PoolError::Closed`] once the pool is closed, and
    /// [`PoolError::Factory`] if resource creation fails. Creation is not
    /// retried.
    pub fn acquire(&self) -> Result<R> {
        if *self.closed.read() {
            return Err(PoolError::Closed);
        }

        match self.idle_rx.try_recv() {
            Ok(resource) => {
                PoolCounters::incr(&self.counters.reused);
                trace!("Reusing idle resource");
                Ok(resource)
            }
            Err(_) => self.create(),
        }
    }

    fn create(&self) -> Result<R> {
        match (self.factory)() {
            Ok(resource) => {
                PoolCounters::incr(&self.counters.created);
                trace!("Idle cache empty, created new resource");
                Ok(resource)
            }
            Err(e) => {
                PoolCounters::incr(&self.counters.factory_failures);
                Err(PoolError::factory(e))
            }
        }
    }

    /// Return a resource to the pool.
    ///
    /// The resource is cached when the pool is open and the cache has room.
    /// Otherwise it is closed and dropped.
    pub fn release(&self, resource: R) {
        let closed = self.closed.read();
        if *closed {
            drop(closed);
            trace!("Pool is closed, closing released resource");
            self.discard(resource);
            return;
        }

        match self.idle_tx.try_send(resource) {
            Ok(()) => PoolCounters::incr(&self.counters.recycled),
            Err(TrySendError::Full(resource)) | Err(TrySendError::Disconnected(resource)) => {
                drop(closed);
                debug!(
                    "Idle cache holds {} resources, closing released resource",
                    self.target_size
                );
                self.discard(resource);
            }
        }
    }

    fn discard(&self, resource: R) {
        PoolCounters::incr(&self.counters.discarded);
        if !close_quietly(resource) {
            PoolCounters::incr(&self.counters.close_failures);
        }
    }

    /// Close the pool, draining and closing every idle resource.
    ///
    /// Calling this more than once has no further effect. Resources still
    /// held by callers are closed when they are released.
    pub fn close(&self) {
        let mut closed = self.closed.write();
        if *closed {
            trace!("Resource pool already closed");
            return;
        }
        *closed = true;

        let mut drained = 0;
        while let Ok(resource) = self.idle_rx.try_recv() {
            drained += 1;
            PoolCounters::incr(&self.counters.drained);
            if !close_quietly(resource) {
                PoolCounters::incr(&self.counters.close_failures);
            }
        }

        info!("Resource pool closed, drained {} idle resources", drained);
    }

    /// Whether the pool has been closed
    pub fn is_closed(&self) -> bool {
        *self.closed.read()
    }

    /// Capacity of the idle cache
    pub fn target_size(&self) -> usize {
        self.target_size
    }

    /// Number of idle resources currently cached
    pub fn idle_count(&self) -> usize {
        self.idle_rx.len()
    }

    /// Current usage statistics
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.idle_count())
    }
}

impl<R: Resource> Pool<R> for ResourcePool<R> {
    fn acquire(&self) -> Result<R> {
        ResourcePool::acquire(self)
    }

    fn release(&self, resource: R) {
        ResourcePool::release(self, resource)
    }

    fn close(&self) {
        ResourcePool::close(self)
    }

    fn is_closed(&self) -> bool {
        ResourcePool::is_closed(self)
    }

    fn stats(&self) -> PoolStats {
        ResourcePool::stats(self)
    }
}

impl<R: Resource> Drop for ResourcePool<R> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<R: Resource> fmt::Debug for ResourcePool<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePool")
            .field("target_size", &self.target_size)
            .field("idle", &self.idle_count())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
