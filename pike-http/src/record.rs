//! The persisted response record and its wire envelope.
//!
//! This is the concrete value the dispatcher stores per identity. It generalizes
//! [`SerializableHttpResponse`](crate::response::SerializableHttpResponse) with the
//! fields the dispatcher needs to serve either compressed encoding without a
//! serve-time recompression: `CreatedAt`/`TTL` for expiry, and both a gzip and a
//! brotli body alongside (or instead of) the identity-encoded one.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use http::{HeaderMap, StatusCode, header::HeaderName};
use pike_backend::{CompressionError, brotli_decode, brotli_encode, gzip_decode, gzip_encode};
use thiserror::Error;

const WIRE_VERSION: u8 = 1;

/// Statuses the dispatcher is willing to serve a `304 Not Modified` for in place
/// of, per RFC 7232 §4.1.
pub const CONDITIONAL_ELIGIBLE_STATUSES: &[StatusCode] = &[
    StatusCode::OK,
    StatusCode::NON_AUTHORITATIVE_INFORMATION,
    StatusCode::NO_CONTENT,
    StatusCode::MULTIPLE_CHOICES,
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::NOT_MODIFIED,
    StatusCode::NOT_FOUND,
    StatusCode::GONE,
];

/// Response headers RFC 7232 permits (and this dispatcher copies) onto a `304`.
pub const CONDITIONAL_HEADER_ALLOWLIST: &[&str] = &[
    "etag",
    "cache-control",
    "vary",
    "date",
    "expires",
    "content-location",
];

/// A client's negotiated content-coding preference, per the dispatcher's
/// fixed `br` > `gzip` > identity precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptedEncoding {
    /// Client's `Accept-Encoding` includes `br`.
    Brotli,
    /// Client's `Accept-Encoding` includes `gzip` but not `br`.
    Gzip,
    /// Client sent no `Accept-Encoding`, or one this dispatcher doesn't speak.
    Identity,
}

/// Negotiates the dispatcher's fixed brotli-over-gzip-over-identity
/// preference against a client's `Accept-Encoding` header value.
pub fn negotiate_encoding(accept_encoding: Option<&str>) -> AcceptedEncoding {
    let Some(accept_encoding) = accept_encoding else {
        return AcceptedEncoding::Identity;
    };
    let codings: Vec<&str> = accept_encoding
        .split(',')
        .map(|c| c.split(';').next().unwrap_or("").trim())
        .collect();
    if codings.iter().any(|c| c.eq_ignore_ascii_case("br")) {
        AcceptedEncoding::Brotli
    } else if codings.iter().any(|c| c.eq_ignore_ascii_case("gzip")) {
        AcceptedEncoding::Gzip
    } else {
        AcceptedEncoding::Identity
    }
}

/// Whether `status` is cacheable by default absent any explicit directive,
/// per RFC 7231 §6.1.
pub fn is_default_cacheable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::OK
            | StatusCode::NON_AUTHORITATIVE_INFORMATION
            | StatusCode::NO_CONTENT
            | StatusCode::MULTIPLE_CHOICES
            | StatusCode::MOVED_PERMANENTLY
            | StatusCode::NOT_FOUND
            | StatusCode::GONE
    )
}

/// Errors produced while building, compressing, or serializing a [`ResponseRecord`].
#[derive(Debug, Error)]
pub enum RecordError {
    /// A compression or decompression step failed.
    #[error(transparent)]
    Compression(#[from] CompressionError),
    /// The wire envelope was truncated or otherwise malformed.
    #[error("malformed response record envelope: {0}")]
    Malformed(String),
    /// The wire envelope declared an unsupported version.
    #[error("unsupported response record envelope version: {0}")]
    UnsupportedVersion(u8),
}

/// A single stored header value, preserving the original header name's case for
/// the wire while the map key itself is matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    /// The header name as first observed (original case preserved).
    pub name: String,
    /// All values for this header name, in the order they were observed.
    pub values: Vec<Bytes>,
}

/// The persisted value for one cache identity.
///
/// See the module documentation and the data-model section of this crate's
/// design notes for the exact mutual-exclusivity invariants between `body`,
/// `gzip_body`, and `br_body`.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    /// Unix seconds when the origin produced this response.
    pub created_at: u32,
    /// Seconds of freshness from `created_at`. Zero means not cacheable.
    pub ttl: u32,
    /// The origin status code.
    pub status: StatusCode,
    /// Response headers, preserving original case and value order.
    pub headers: Vec<HeaderEntry>,
    /// Identity-encoded (uncompressed) body. Empty when only compressed forms
    /// are retained.
    pub body: Bytes,
    /// Gzip-encoded body. Empty if not applicable.
    pub gzip_body: Bytes,
    /// Brotli-encoded body. Empty if not applicable.
    pub br_body: Bytes,
    /// Threshold, in bytes, above which this record's body is kept compressed.
    pub compress_min_length: u32,
}

impl ResponseRecord {
    /// Builds a record directly from an origin response, before any compression
    /// normalization. `body` is the raw, identity-encoded bytes.
    pub fn from_origin(
        status: StatusCode,
        headers: &HeaderMap,
        body: Bytes,
        ttl: u32,
        compress_min_length: u32,
    ) -> Self {
        Self {
            created_at: unix_now(),
            ttl,
            status,
            headers: collect_headers(headers),
            body,
            gzip_body: Bytes::new(),
            br_body: Bytes::new(),
            compress_min_length,
        }
    }

    /// Whether this record's content type marks it eligible for compression,
    /// per the `text/`, `json`, `javascript` rule.
    pub fn is_compressible_content_type(&self) -> bool {
        let Some(content_type) = self.header_value("content-type") else {
            return false;
        };
        let content_type = content_type.to_ascii_lowercase();
        content_type.starts_with("text/")
            || content_type.contains("json")
            || content_type.contains("javascript")
    }

    /// Looks up a header's first value, case-insensitively, as a UTF-8 string.
    pub fn header_value(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .and_then(|entry| entry.values.first())
            .map(|value| String::from_utf8_lossy(value).into_owned())
    }

    /// `CreatedAt + TTL` has passed as of `now`.
    pub fn is_expired(&self, now: u32) -> bool {
        self.created_at.saturating_add(self.ttl) < now
    }

    /// Normalizes the record to satisfy the §3 storage invariants, deriving
    /// whichever compressed form is missing and clearing the fields the
    /// invariants say must be empty.
    ///
    /// Compression is only attempted when the record is content-type
    /// compressible; otherwise `body` is always retained regardless of length.
    pub fn normalize(
        &mut self,
        gzip_level: i32,
        brotli_quality: u32,
    ) -> Result<(), RecordError> {
        let threshold = self.compress_min_length;
        let attempt_compression = threshold > 0 && self.is_compressible_content_type();

        if !attempt_compression {
            if !self.gzip_body.is_empty() {
                self.body = gzip_decode(&self.gzip_body)?.into();
            } else if !self.br_body.is_empty() {
                self.body = brotli_decode(&self.br_body)?.into();
            }
            self.gzip_body = Bytes::new();
            self.br_body = Bytes::new();
            return Ok(());
        }

        if self.body.len() as u64 >= threshold as u64 {
            match encode_both(&self.body, gzip_level, brotli_quality) {
                Ok((gz, br)) => {
                    self.gzip_body = gz;
                    self.br_body = br;
                    self.body = Bytes::new();
                }
                Err(_) => {
                    // EncodeError at save: skip compressed forms, keep the
                    // identity body (§7 disposition for EncodeError).
                    self.gzip_body = Bytes::new();
                    self.br_body = Bytes::new();
                }
            }
        } else if !self.gzip_body.is_empty() && self.br_body.is_empty() {
            let decoded = gzip_decode(&self.gzip_body)?;
            self.br_body = brotli_encode(&decoded, brotli_quality)?.into();
            self.body = Bytes::new();
        } else if !self.br_body.is_empty() && self.gzip_body.is_empty() {
            let decoded = brotli_decode(&self.br_body)?;
            self.gzip_body = gzip_encode(&decoded, gzip_level)?.into();
            self.body = Bytes::new();
        } else {
            self.gzip_body = Bytes::new();
            self.br_body = Bytes::new();
        }

        Ok(())
    }

    /// Serializes this record to the versioned wire envelope described in §6.
    pub fn encode(&self) -> Bytes {
        let mut out = Vec::new();
        out.push(WIRE_VERSION);
        out.extend_from_slice(&self.created_at.to_le_bytes());
        out.extend_from_slice(&self.ttl.to_le_bytes());
        out.extend_from_slice(&(self.status.as_u16()).to_le_bytes());
        out.extend_from_slice(&(self.headers.len() as u16).to_le_bytes());
        for entry in &self.headers {
            let name_bytes = entry.name.as_bytes();
            out.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
            out.extend_from_slice(name_bytes);
            out.extend_from_slice(&(entry.values.len() as u16).to_le_bytes());
            for value in &entry.values {
                out.extend_from_slice(&(value.len() as u32).to_le_bytes());
                out.extend_from_slice(value);
            }
        }
        write_block(&mut out, &self.body);
        write_block(&mut out, &self.gzip_body);
        write_block(&mut out, &self.br_body);
        out.into()
    }

    /// Parses the versioned wire envelope described in §6.
    pub fn decode(data: &[u8], compress_min_length: u32) -> Result<Self, RecordError> {
        let mut cursor = Cursor::new(data);
        let version = cursor.take_u8()?;
        if version != WIRE_VERSION {
            return Err(RecordError::UnsupportedVersion(version));
        }
        let created_at = cursor.take_u32()?;
        let ttl = cursor.take_u32()?;
        let status_code = cursor.take_u16()?;
        let status = StatusCode::from_u16(status_code)
            .map_err(|_| RecordError::Malformed(format!("invalid status code {status_code}")))?;

        let header_count = cursor.take_u16()?;
        let mut headers = Vec::with_capacity(header_count as usize);
        for _ in 0..header_count {
            let name_len = cursor.take_u16()? as usize;
            let name_bytes = cursor.take_bytes(name_len)?;
            let name = String::from_utf8(name_bytes.to_vec())
                .map_err(|err| RecordError::Malformed(err.to_string()))?;
            let value_count = cursor.take_u16()?;
            let mut values = Vec::with_capacity(value_count as usize);
            for _ in 0..value_count {
                let value_len = cursor.take_u32()? as usize;
                values.push(Bytes::copy_from_slice(cursor.take_bytes(value_len)?));
            }
            headers.push(HeaderEntry { name, values });
        }

        let body = Bytes::copy_from_slice(cursor.take_block()?);
        let gzip_body = Bytes::copy_from_slice(cursor.take_block()?);
        let br_body = Bytes::copy_from_slice(cursor.take_block()?);

        Ok(Self {
            created_at,
            ttl,
            status,
            headers,
            body,
            gzip_body,
            br_body,
            compress_min_length,
        })
    }

    /// Picks the stored (or decoded) body bytes for a negotiated client
    /// encoding, along with the `Content-Encoding` value to send, if any.
    ///
    /// Falls back to decoding whichever form is actually stored when the
    /// negotiated encoding isn't available, rather than failing the request.
    pub fn body_for_encoding(
        &self,
        encoding: AcceptedEncoding,
    ) -> Result<(Bytes, Option<&'static str>), RecordError> {
        match encoding {
            AcceptedEncoding::Brotli if !self.br_body.is_empty() => {
                Ok((self.br_body.clone(), Some("br")))
            }
            AcceptedEncoding::Gzip if !self.gzip_body.is_empty() => {
                Ok((self.gzip_body.clone(), Some("gzip")))
            }
            _ if !self.body.is_empty() => Ok((self.body.clone(), None)),
            _ if !self.gzip_body.is_empty() => {
                Ok((gzip_decode(&self.gzip_body)?.into(), None))
            }
            _ if !self.br_body.is_empty() => {
                Ok((brotli_decode(&self.br_body)?.into(), None))
            }
            _ => Ok((Bytes::new(), None)),
        }
    }

    /// Whether `if_none_match` (the client's `If-None-Match` request header
    /// value) matches this record's stored `ETag`, per RFC 7232 §3.2.
    pub fn matches_if_none_match(&self, if_none_match: &str) -> bool {
        let Some(etag) = self.header_value("etag") else {
            return false;
        };
        if_none_match
            .split(',')
            .map(|candidate| candidate.trim().trim_start_matches("W/"))
            .any(|candidate| candidate == etag || candidate == "*")
    }

    /// Reconstructs a [`HeaderMap`] from the stored header entries.
    pub fn header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        for entry in &self.headers {
            let Ok(name) = HeaderName::from_bytes(entry.name.as_bytes()) else {
                continue;
            };
            for value in &entry.values {
                if let Ok(header_value) = http::HeaderValue::from_bytes(value) {
                    map.append(name.clone(), header_value);
                }
            }
        }
        map
    }
}

fn encode_both(body: &[u8], gzip_level: i32, brotli_quality: u32) -> Result<(Bytes, Bytes), CompressionError> {
    let gz = gzip_encode(body, gzip_level)?;
    let br = brotli_encode(body, brotli_quality)?;
    Ok((gz.into(), br.into()))
}

fn collect_headers(headers: &HeaderMap) -> Vec<HeaderEntry> {
    let mut entries: Vec<HeaderEntry> = Vec::new();
    for name in headers.keys() {
        if entries.iter().any(|e| e.name.eq_ignore_ascii_case(name.as_str())) {
            continue;
        }
        let values = headers
            .get_all(name)
            .iter()
            .map(|v| Bytes::copy_from_slice(v.as_bytes()))
            .collect();
        entries.push(HeaderEntry {
            name: name.as_str().to_string(),
            values,
        });
    }
    entries
}

fn write_block(out: &mut Vec<u8>, data: &Bytes) {
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
}

fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take_bytes(&mut self, len: usize) -> Result<&'a [u8], RecordError> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or_else(|| RecordError::Malformed("length overflow".into()))?;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or_else(|| RecordError::Malformed("envelope truncated".into()))?;
        self.pos = end;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, RecordError> {
        Ok(self.take_bytes(1)?[0])
    }

    fn take_u16(&mut self) -> Result<u16, RecordError> {
        let bytes = self.take_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn take_u32(&mut self) -> Result<u32, RecordError> {
        let bytes = self.take_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn take_block(&mut self) -> Result<&'a [u8], RecordError> {
        let len = self.take_u32()? as usize;
        self.take_bytes(len)
    }
}
