#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # Cistern Pool
//!
//! A concurrency-safe pool for expensive, closable resources such as
//! network or database connections.
//!
//! The crate provides two pooling modes:
//!
//! - [`ResourcePool`]: soft cap, never blocks. The pool keeps at most
//!   `target_size` idle resources cached for reuse, creates new ones through
//!   the factory whenever the cache is empty, and closes surplus resources on
//!   release. Under load, more than `target_size` resources may be in use at
//!   once (overshoot).
//! - [`BoundedPool`]: hard admission control. At most `max_size` resources
//!   exist at any time and `acquire` waits for a release, up to a timeout.
//!
//! Both implement the [`Pool`] trait, which also offers RAII checkout through
//! [`PooledResource`].
//!
//! The pool never logs on behalf of callers' errors and never retries; it
//! reports lifecycle events through the `log` facade so the owning
//! application decides where they go.

/// Pool configuration
pub mod config;

/// Error types for pool operations
pub mod error;

/// Resource pools and checkout handles
pub mod pool;

/// The resource and factory contracts
pub mod resource;

/// Pool statistics
pub mod stats;

// Re-export key types for easier access
pub use config::{PoolConfig, PoolMode};
pub use error::{PoolError, Result};
pub use pool::{BoundedPool, Pool, PooledResource, ResourcePool};
pub use resource::{BoxError, Resource};
pub use stats::PoolStats;
