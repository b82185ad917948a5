#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod body;
mod cache_status;
mod cacheable;
pub mod extractors;

/// The identity function: compiles a cache key format string into a closure
/// that extracts and concatenates the matching pieces of an HTTP request.
pub mod identity;
pub mod predicates;
pub mod query;

/// The persisted response record and its versioned wire envelope.
pub mod record;
mod request;
mod response;

pub use body::{BufferedBody, CollectExactResult, PartialBufferedBody, Remaining};
pub use cache_status::DEFAULT_CACHE_STATUS_HEADER;
pub use cacheable::CacheableSubject;
pub use identity::{ConnectionScheme, Identity, IdentityFormatError};
pub use record::{
    AcceptedEncoding, CONDITIONAL_ELIGIBLE_STATUSES, CONDITIONAL_HEADER_ALLOWLIST, HeaderEntry,
    RecordError, ResponseRecord, is_default_cacheable_status, negotiate_encoding,
};
pub use request::CacheableHttpRequest;
pub use response::{CacheableHttpResponse, SerializableHttpResponse};
