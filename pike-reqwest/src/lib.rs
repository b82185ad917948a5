#![doc = include_str!("../README.md")]

mod middleware;
mod upstream;

pub use middleware::{CacheMiddleware, CacheMiddlewareBuilder, NotSet};
pub use upstream::ReqwestUpstream;

// Re-export pike-http types for convenience
pub use pike_http::{
    BufferedBody, CacheableHttpRequest, CacheableHttpResponse, DEFAULT_CACHE_STATUS_HEADER,
    SerializableHttpResponse, extractors, predicates,
};

/// Re-export reqwest body type for convenience in type annotations
pub use reqwest::Body as ReqwestBody;

// Re-export common types
pub use pike::config::CacheConfig;
pub use pike::policy::PolicyConfig;
pub use pike::{Config, ConfigBuilder};
pub use pike_core::DisabledOffload;

// Re-export concurrency types
pub use pike::concurrency::{
    BroadcastConcurrencyManager, ConcurrencyManager, NoopConcurrencyManager,
};
