//! The identity function: compiles a cache key format string into a closure
//! that extracts and concatenates the matching pieces of an HTTP request.
//!
//! The grammar recognizes eight built-in tokens (`host`, `method`, `path`,
//! `proto`, `scheme`, `uri`, `userAgent`, `query`) plus three prefixed forms
//! for looking up an arbitrary name at request time:
//!
//! - `~name` — cookie named `name`
//! - `>name` — request header named `name`
//! - `?name` — query string field named `name`
//!
//! Tokens are space-separated in the format string and the extracted values
//! are rejoined with single spaces; a token with no value at request time
//! contributes a zero-length segment rather than being dropped, so the number
//! of spaces in the output is always `tokens.len() - 1`.

use bytes::{BufMut, Bytes, BytesMut};
use http::Request;
use thiserror::Error;

/// The default format used when none is configured: `METHOD SP HOST SP
/// REQUEST-URI`.
pub const DEFAULT_FORMAT: &str = "method host uri";

/// Records whether a request arrived over a TLS connection.
///
/// Inbound server requests built by hyper/tower carry only a relative
/// `path-and-query` URI; the scheme the client actually connected with is
/// connection state, not request state, so it has to be handed down from
/// wherever the connection was accepted. A server integration inserts this
/// into `req.extensions_mut()` before the request reaches [`Identity::evaluate`]
/// (see `pike_tower`'s connection-scheme layer). Absent this extension,
/// `scheme` falls back to the request URI's own advertised scheme, which is
/// only ever populated for requests built with an absolute URI (e.g. in tests
/// or behind a forward proxy that rewrites it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionScheme {
    /// `true` if the connection this request arrived on was TLS-terminated.
    pub is_tls: bool,
}

/// A compiled identity format, ready to be evaluated against any number of
/// requests without re-parsing the format string.
#[derive(Debug, Clone)]
pub struct Identity {
    tokens: Vec<Token>,
}

#[derive(Debug, Clone)]
enum Token {
    Host,
    Method,
    Path,
    Proto,
    Scheme,
    Uri,
    UserAgent,
    Query,
    Cookie(String),
    Header(String),
    QueryField(String),
}

/// The format string referenced an unrecognized token or an empty prefixed
/// name.
#[derive(Debug, Error)]
pub enum IdentityFormatError {
    /// The format string was empty.
    #[error("identity format must name at least one token")]
    Empty,
    /// A token didn't match any built-in name and didn't use a recognized
    /// `~`/`>`/`?` prefix.
    #[error("unrecognized identity token: {0:?}")]
    UnrecognizedToken(String),
    /// A prefixed token (`~`, `>`, `?`) had no name after the prefix.
    #[error("identity token {0:?} is missing a name after its prefix")]
    EmptyPrefixedName(String),
}

impl Identity {
    /// Compiles a space-separated format string, rejecting unrecognized
    /// tokens at this point rather than at evaluation time.
    pub fn compile(format: &str) -> Result<Self, IdentityFormatError> {
        let tokens = format
            .split(' ')
            .filter(|segment| !segment.is_empty())
            .map(parse_token)
            .collect::<Result<Vec<_>, _>>()?;
        if tokens.is_empty() {
            return Err(IdentityFormatError::Empty);
        }
        Ok(Self { tokens })
    }

    /// The default identity: `method host uri`.
    pub fn default_format() -> Self {
        Self::compile(DEFAULT_FORMAT).expect("DEFAULT_FORMAT is always valid")
    }

    /// Evaluates this identity against a request, producing the
    /// space-joined byte string used as the cache key's identity component.
    pub fn evaluate<B>(&self, req: &Request<B>) -> Bytes {
        let mut values: Vec<String> = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            values.push(resolve(token, req));
        }

        let size: usize = values.iter().map(|v| v.len()).sum();
        let spaces = values.len().saturating_sub(1);
        let mut buffer = BytesMut::with_capacity(size + spaces);
        for (i, value) in values.iter().enumerate() {
            buffer.put_slice(value.as_bytes());
            if i + 1 < values.len() {
                buffer.put_u8(b' ');
            }
        }
        buffer.freeze()
    }
}

fn parse_token(segment: &str) -> Result<Token, IdentityFormatError> {
    match segment {
        "host" => return Ok(Token::Host),
        "method" => return Ok(Token::Method),
        "path" => return Ok(Token::Path),
        "proto" => return Ok(Token::Proto),
        "scheme" => return Ok(Token::Scheme),
        "uri" => return Ok(Token::Uri),
        "userAgent" => return Ok(Token::UserAgent),
        "query" => return Ok(Token::Query),
        _ => {}
    }

    let mut chars = segment.chars();
    let prefix = chars.next().ok_or(IdentityFormatError::Empty)?;
    let name = chars.as_str();
    match prefix {
        '~' if !name.is_empty() => Ok(Token::Cookie(name.to_string())),
        '>' if !name.is_empty() => Ok(Token::Header(name.to_string())),
        '?' if !name.is_empty() => Ok(Token::QueryField(name.to_string())),
        '~' | '>' | '?' => Err(IdentityFormatError::EmptyPrefixedName(segment.to_string())),
        _ => Err(IdentityFormatError::UnrecognizedToken(segment.to_string())),
    }
}

fn resolve<B>(token: &Token, req: &Request<B>) -> String {
    match token {
        Token::Host => req
            .headers()
            .get(http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| req.uri().host())
            .unwrap_or_default()
            .to_string(),
        Token::Method => req.method().as_str().to_string(),
        Token::Path => req.uri().path().to_string(),
        Token::Proto => format!("{:?}", req.version()),
        Token::Scheme => req
            .extensions()
            .get::<ConnectionScheme>()
            .map(|c| if c.is_tls { "https" } else { "http" })
            .or_else(|| req.uri().scheme_str())
            .unwrap_or("http")
            .to_uppercase(),
        Token::Uri => req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string()),
        Token::UserAgent => req
            .headers()
            .get(http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        Token::Query => req.uri().query().unwrap_or_default().to_string(),
        Token::Cookie(name) => cookie_value(req, name).unwrap_or_default(),
        Token::Header(name) => req
            .headers()
            .get(name.as_str())
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        Token::QueryField(name) => query_field(req.uri().query().unwrap_or_default(), name)
            .unwrap_or_default(),
    }
}

fn cookie_value<B>(req: &Request<B>, name: &str) -> Option<String> {
    let header = req.headers().get(http::header::COOKIE)?;
    let header = header.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let pair = pair.trim();
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim().to_string())
    })
}

fn query_field(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next()?;
        if key != name {
            return None;
        }
        Some(parts.next().unwrap_or_default().to_string())
    })
}
