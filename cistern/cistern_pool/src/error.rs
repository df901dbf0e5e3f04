//! Error taxonomy shared by every pool mode.

use thiserror::Error;

use crate::resource::BoxError;

/// Error returned by pool construction and acquisition
#[derive(Error, Debug)]
pub enum PoolError {
    /// The requested pool size is zero
    #[error("invalid pool size {0}: a pool must hold at least one resource")]
    InvalidSize(usize),

    /// The factory failed to produce a resource
    #[error("resource creation failed: {source}")]
    Factory {
        /// The error returned by the factory, unchanged
        #[source]
        source: BoxError,
    },

    /// The pool has been closed
    #[error("resource pool is closed")]
    Closed,

    /// No resource became available within the acquire timeout
    #[error("timed out after {0:?} waiting for a resource")]
    Timeout(std::time::Duration),

    /// Every slot of a bounded pool is in use
    #[error("resource pool exhausted")]
    Exhausted,
}

impl PoolError {
    /// Wrap a factory error
    pub(crate) fn factory(source: BoxError) -> Self {
        Self::Factory { source }
    }

    /// Whether this error came from the resource factory
    pub fn is_factory(&self) -> bool {
        matches!(self, Self::Factory { .. })
    }
}

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, PoolError>;
