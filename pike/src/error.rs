//! Top-level error type for cache orchestration.

use pike_backend::BackendError;
use thiserror::Error;

/// Errors that can occur while orchestrating a cache operation.
///
/// Covers the three places a cache-aware request can fail outside of the
/// upstream call itself: the storage backend, cache key generation, and
/// coalescing via the [`concurrency`](crate::concurrency) module.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The storage backend failed to read or write a value.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// The upstream call (origin fetch) failed.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Cache key generation failed, e.g. a malformed extractor configuration.
    #[error("cache key error: {0}")]
    Key(String),

    /// A waiter exceeded its coalescing wait budget.
    #[error("coalesce timeout after waiting for identity")]
    CoalesceTimeout,
}
