//! Error taxonomy for the cache-aware request dispatcher.
//!
//! The dispatcher itself — encoding selection, conditional-response negotiation,
//! and record persistence — is protocol-specific and lives in `pike-http`
//! (wired as Tower middleware in `pike-tower`). This module holds the error
//! vocabulary shared by any such dispatcher, along with the disposition each
//! error kind gets.

use pike_backend::{BackendError, CompressionError};
use thiserror::Error;

use crate::registry::AcquireError;

/// What the dispatcher should do in response to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Treat the failure as a cache miss and continue to the upstream fetch.
    TreatAsMiss,
    /// Serve the response that was already produced, but mark the identity
    /// `HitForPass` with a short TTL so retries don't stampede the store.
    ServeAndHitForPass,
    /// Fail the request with a `502 Bad Gateway` and invalidate the identity.
    BadGateway,
    /// Skip the compressed form and store the identity-encoded body instead.
    StoreUncompressed,
    /// Fall through to an uncoalesced, direct upstream fetch.
    DirectFetch,
}

/// Errors that can occur while dispatching a cache-aware request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The response store failed to read a record.
    #[error("store read failed: {0}")]
    StoreRead(#[source] BackendError),

    /// The response store failed to persist a record.
    #[error("store write failed: {0}")]
    StoreWrite(#[source] BackendError),

    /// Decoding a stored compressed body failed at serve time.
    #[error("decode failed: {0}")]
    Decode(#[source] CompressionError),

    /// Encoding a body for storage failed at save time.
    #[error("encode failed: {0}")]
    Encode(#[source] CompressionError),

    /// A waiter exceeded the coalescing wait budget.
    #[error("coalesce timeout: {0}")]
    CoalesceTimeout(#[from] AcquireError),

    /// The upstream fetch itself failed; the dispatcher's only responsibility
    /// here is to make sure `abandon` has been called on the registry entry.
    #[error("upstream error: {0}")]
    Upstream(String),
}

impl DispatchError {
    /// What the dispatcher should do in response to this error.
    pub fn disposition(&self) -> Disposition {
        match self {
            DispatchError::StoreRead(_) => Disposition::TreatAsMiss,
            DispatchError::StoreWrite(_) => Disposition::ServeAndHitForPass,
            DispatchError::Decode(_) => Disposition::BadGateway,
            DispatchError::Encode(_) => Disposition::StoreUncompressed,
            DispatchError::CoalesceTimeout(_) => Disposition::DirectFetch,
            DispatchError::Upstream(_) => Disposition::BadGateway,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispositions_match_the_error_table() {
        assert_eq!(
            DispatchError::CoalesceTimeout(AcquireError::RetryCapExceeded).disposition(),
            Disposition::DirectFetch
        );
    }
}
