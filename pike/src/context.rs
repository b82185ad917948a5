//! Cache context types for tracking cache operation results.
//!
//! Re-exported from `pike-core`.

pub use pike_core::{
    BoxContext, CacheContext, CacheStatus, CacheStatusExt, Context, ResponseSource,
};
