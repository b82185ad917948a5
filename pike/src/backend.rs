//! Backend traits and utilities for cache storage.
//!
//! This module re-exports types from `pike-backend` for implementing
//! custom cache storage backends:
//!
//! - `Backend` - Core trait for cache storage operations
//! - `CacheBackend` - Extended trait with response-aware operations
//! - `BackendError` - Error type for backend operations
//! - `DeleteStatus` - Result of cache entry deletion
//!
//! ## Built-in Backends
//!
//! | Backend | Crate | Use Case |
//! |---------|-------|----------|
//! | Moka | [`pike-moka`] | In-memory, single instance |
//! | Redis | [`pike-redis`] | Distributed, multi-instance |
//! | FeOxDB | [`pike-feoxdb`] | Embedded persistent storage |
//!
//! See [`pike-backend`] documentation for implementing custom backends.
//!
//! [`pike-backend`]: https://docs.rs/pike-backend
//! [`pike-moka`]: https://docs.rs/pike-moka
//! [`pike-redis`]: https://docs.rs/pike-redis
//! [`pike-feoxdb`]: https://docs.rs/pike-feoxdb

pub use pike_backend::{Backend, BackendError, CacheBackend, DeleteStatus};
