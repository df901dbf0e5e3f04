//! Hard-capped resource pool with blocking acquisition.
//!
//! Unlike [`ResourcePool`](super::ResourcePool), this pool never lets more
//! than `max_size` resources exist at once. When every slot is taken,
//! `acquire` waits for a release until the acquire timeout expires.

use log::{debug, info, trace};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::pool::Pool;
use crate::resource::{boxed_factory, close_quietly, BoxError, Factory, Resource};
use crate::stats::{PoolCounters, PoolStats};

struct State<R> {
    /// Idle resources ready for reuse
    idle: VecDeque<R>,

    /// Slots held by callers, including resources still being created
    outstanding: usize,

    closed: bool,
}

/// A pool that blocks callers once `max_size` resources are in use
pub struct BoundedPool<R: Resource> {
    state: Mutex<State<R>>,

    /// Signalled when a slot or an idle resource becomes available
    available: Condvar,

    factory: Factory<R>,

    max_size: usize,

    acquire_timeout: Duration,

    counters: PoolCounters,
}

impl<R: Resource> BoundedPool<R> {
    /// Create a pool holding at most `max_size` resources
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidSize`] if `max_size` is zero.
    pub fn new<F, E>(max_size: usize, acquire_timeout: Duration, factory: F) -> Result<Self>
    where
        F: Fn() -> std::result::Result<R, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        if max_size == 0 {
            return Err(PoolError::InvalidSize(max_size));
        }

        debug!(
            "Created bounded resource pool with max size {} and acquire timeout {:?}",
            max_size, acquire_timeout
        );

        Ok(Self {
            state: Mutex::new(State {
                idle: VecDeque::with_capacity(max_size),
                outstanding: 0,
                closed: false,
            }),
            available: Condvar::new(),
            factory: boxed_factory(factory),
            max_size,
            acquire_timeout,
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
        Self::new(config.target_size, config.acquire_timeout(), factory)
    }

    /// Acquire a resource, waiting up to the configured acquire timeout
    pub fn acquire(&self) -> Result<R> {
        self.acquire_timeout(self.acquire_timeout)
    }

    /// Acquire a resource, waiting up to `timeout` for one to be released
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<R> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        let mut timed_out = false;

        loop {
            if state.closed {
                return Err(PoolError::Closed);
            }

            if let Some(resource) = state.idle.pop_front() {
                state.outstanding += 1;
                PoolCounters::incr(&self.counters.reused);
                return Ok(resource);
            }

            if state.outstanding < self.max_size {
                state.outstanding += 1;
                drop(state);
                return self.create();
            }

            if timed_out {
                return Err(PoolError::Timeout(timeout));
            }

            trace!("All {} resources in use, waiting for a release", self.max_size);
            match deadline {
                Some(deadline) => {
                    timed_out = self.available.wait_until(&mut state, deadline).timed_out();
                }
                None => self.available.wait(&mut state),
            }
        }
    }

    /// Acquire a resource without waiting
    ///
    /// # Errors
    ///
    /// [`PoolError::Exhausted`] when every slot is in use.
    pub fn try_acquire(&self) -> Result<R> {
        let mut state = self.state.lock();

        if state.closed {
            return Err(PoolError::Closed);
        }

        if let Some(resource) = state.idle.pop_front() {
            state.outstanding += 1;
            PoolCounters::incr(&self.counters.reused);
            return Ok(resource);
        }

        if state.outstanding >= self.max_size {
            return Err(PoolError::Exhausted);
        }

        state.outstanding += 1;
        drop(state);
        self.create()
    }

    /// Run the factory for a slot already reserved by the caller
    fn create(&self) -> Result<R> {
        match (self.factory)() {
            Ok(resource) => {
                PoolCounters::incr(&self.counters.created);
                Ok(resource)
            }
            Err(e) => {
                PoolCounters::incr(&self.counters.factory_failures);
                let mut state = self.state.lock();
                state.outstanding = state.outstanding.saturating_sub(1);
                drop(state);
                self.available.notify_one();
                Err(PoolError::factory(e))
            }
        }
    }

    /// Return a resource to the pool and wake one waiting caller
    ///
    /// Only resources issued by this pool may be released here, each at most
    /// once. A release arriving while no slot is held cannot belong to the
    /// pool and is closed instead of cached.
    pub fn release(&self, resource: R) {
        let mut state = self.state.lock();
        let unowned = state.outstanding == 0;
        state.outstanding = state.outstanding.saturating_sub(1);

        if unowned || state.closed || state.idle.len() + state.outstanding >= self.max_size {
            drop(state);
            PoolCounters::incr(&self.counters.discarded);
            if !close_quietly(resource) {
                PoolCounters::incr(&self.counters.close_failures);
            }
            self.available.notify_one();
            return;
        }

        state.idle.push_back(resource);
        PoolCounters::incr(&self.counters.recycled);
        drop(state);
        self.available.notify_one();
    }

    /// Give back the slot of a resource the caller has taken out of the pool
    pub fn forget(&self) {
        let mut state = self.state.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
        drop(state);
        self.available.notify_one();
    }

    /// Close the pool, closing every idle resource and failing every waiter
    /// with [`PoolError::Closed`]. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;

        let mut drained = 0;
        while let Some(resource) = state.idle.pop_front() {
            drained += 1;
            PoolCounters::incr(&self.counters.drained);
            if !close_quietly(resource) {
                PoolCounters::incr(&self.counters.close_failures);
            }
        }
        drop(state);
        self.available.notify_all();

        info!("Bounded resource pool closed, drained {} idle resources", drained);
    }

    /// Whether the pool has been closed
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Maximum number of resources in existence
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of idle resources
    pub fn idle_count(&self) -> usize {
        self.state.lock().idle.len()
    }

    /// Number of slots held by callers
    pub fn in_use(&self) -> usize {
        self.state.lock().outstanding
    }

    /// Current usage statistics
    pub fn stats(&self) -> PoolStats {
        let idle = self.idle_count();
        self.counters.snapshot(idle)
    }
}

impl<R: Resource> Pool<R> for BoundedPool<R> {
    fn acquire(&self) -> Result<R> {
        BoundedPool::acquire(self)
    }

    fn release(&self, resource: R) {
        BoundedPool::release(self, resource)
    }

    fn close(&self) {
        BoundedPool::close(self)
    }

    fn is_closed(&self) -> bool {
        BoundedPool::is_closed(self)
    }

    fn stats(&self) -> PoolStats {
        BoundedPool::stats(self)
    }

    fn forget(&self) {
        BoundedPool::forget(self)
    }
}

impl<R: Resource> Drop for BoundedPool<R> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<R: Resource> fmt::Debug for BoundedPool<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BoundedPool")
            .field("max_size", &self.max_size)
            .field("idle", &state.idle.len())
            .field("in_use", &state.outstanding)
            .field("closed", &state.closed)
            .finish_non_exhaustive()
    }
}
