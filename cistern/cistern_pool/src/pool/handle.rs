//! RAII checkout of pooled resources.

use log::debug;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use crate::pool::Pool;
use crate::resource::{close_quietly, Resource};

/// A resource checked out of a pool, released back when dropped
///
/// The handle keeps only a weak reference to its pool. If the pool has been
/// dropped by the time the handle goes away, the resource is closed instead.
pub struct PooledResource<R: Resource, P: Pool<R>> {
    /// The resource itself
    resource: Option<R>,

    /// Reference to the pool this resource belongs to
    pool: Weak<P>,

    /// When this resource was acquired
    acquired_at: Instant,
}

impl<R: Resource, P: Pool<R>> PooledResource<R, P> {
    pub(crate) fn new(resource: R, pool: &Arc<P>) -> Self {
        Self {
            resource: Some(resource),
            pool: Arc::downgrade(pool),
            acquired_at: Instant::now(),
        }
    }

    /// Get the time since this resource was acquired
    pub fn held_duration(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// Take the resource out of pool management.
    ///
    /// The caller becomes responsible for closing it.
    pub fn detach(mut self) -> R {
        let resource = self.resource.take().expect("resource present until drop");
        if let Some(pool) = self.pool.upgrade() {
            pool.forget();
        }
        resource
    }

    /// Return the resource to the pool now
    pub fn release(self) {
        drop(self);
    }
}

impl<R: Resource, P: Pool<R>> Deref for PooledResource<R, P> {
    type Target = R;

    fn deref(&self) -> &R {
        self.resource.as_ref().expect("resource present until drop")
    }
}

impl<R: Resource, P: Pool<R>> DerefMut for PooledResource<R, P> {
    fn deref_mut(&mut self) -> &mut R {
        self.resource.as_mut().expect("resource present until drop")
    }
}

impl<R: Resource, P: Pool<R>> Drop for PooledResource<R, P> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            match self.pool.upgrade() {
                Some(pool) => pool.release(resource),
                None => {
                    debug!("Pool dropped before resource was returned, closing it");
                    close_quietly(resource);
                }
            }
        }
    }
}

impl<R: Resource + fmt::Debug, P: Pool<R>> fmt::Debug for PooledResource<R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledResource")
            .field("resource", &self.resource)
            .field("held", &self.held_duration())
            .finish()
    }
}
