//! Resource pooling and efficient reuse of expensive resources.
//!
//! Two admission policies are available:
//!
//! - [`ResourcePool`] keeps a soft cap and never blocks
//! - [`BoundedPool`] enforces a hard cap and blocks with a timeout

pub mod bounded;
pub mod handle;
pub mod soft;

pub use bounded::BoundedPool;
pub use handle::PooledResource;
pub use soft::ResourcePool;

use std::sync::Arc;

use crate::error::Result;
use crate::resource::Resource;
use crate::stats::PoolStats;

/// Common interface of every pool mode
pub trait Pool<R: Resource>: Send + Sync + 'static {
    /// Take a resource out of the pool, creating one if needed
    fn acquire(&self) -> Result<R>;

    /// Hand a resource back to the pool
    fn release(&self, resource: R);

    /// Close the pool and every idle resource it holds. Idempotent.
    fn close(&self);

    /// Whether the pool has been closed
    fn is_closed(&self) -> bool;

    /// Current usage statistics
    fn stats(&self) -> PoolStats;

    /// Called when a checked-out resource leaves pool management for good.
    ///
    /// Pools that count slots per caller give the slot back here.
    fn forget(&self) {}

    /// Acquire a resource wrapped in a guard that releases it on drop
    fn checkout(self: &Arc<Self>) -> Result<PooledResource<R, Self>>
    where
        Self: Sized,
    {
        let resource = self.acquire()?;
        Ok(PooledResource::new(resource, self))
    }
}
