#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Tower layer that records whether a connection was TLS-terminated.
pub mod connection_scheme;
/// The concrete cache-aware HTTP dispatcher, as a fixed-policy Tower layer/service.
pub mod dispatcher;
/// Future types for the cache service.
pub mod future;
/// Tower layer and builder for cache configuration.
pub mod layer;
/// The Tower service implementation that performs caching.
pub mod service;
/// Upstream adapter for bridging Tower services to Pike.
pub mod upstream;

pub use ::http::{Method, StatusCode};
pub use pike::config::CacheConfig;
pub use pike::{Config, ConfigBuilder};
pub use pike_http::DEFAULT_CACHE_STATUS_HEADER;
pub use connection_scheme::{ConnectionSchemeLayer, ConnectionSchemeService};
pub use dispatcher::{Dispatcher, DispatcherConfig, DispatcherLayer};
pub use layer::{Cache, CacheBuilder, NotSet};
pub use upstream::TowerUpstream;
