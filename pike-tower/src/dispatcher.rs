//! The concrete cache-aware HTTP dispatcher, as a Tower [`Layer`]/[`Service`] pair.
//!
//! Unlike [`Cache`](crate::Cache)/[`CacheService`](crate::service::CacheService), which
//! stay generic over predicates, extractors, and policy so any [`pike_core`] cache shape
//! can be plugged in, `Dispatcher` implements one fixed policy end to end: GET/HEAD only,
//! a single compiled [`Identity`], brotli-over-gzip-over-identity content negotiation,
//! RFC 7232 conditional short-circuiting, and anti-dogpile coalescing via
//! [`StateRegistry`]. Reach for this when that fixed policy is what you want; reach for
//! `Cache` when you need to compose your own.

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use chrono::Utc;
use http::{HeaderValue, Method, Request, Response, StatusCode, header::HeaderName};
use http_body_util::Full;
use hyper::body::Body as HttpBody;
use pike::{CacheKey, CacheValue, KeyPart, Raw};
use pike::registry::{Acquired, AcquireError, CancellationToken, EntryState, FetchGuard, StateRegistry};
use pike_backend::Backend;
use pike_http::{
    AcceptedEncoding, BufferedBody, RecordError, ResponseRecord, is_default_cacheable_status,
    negotiate_encoding,
};
use tower::{Layer, Service};
use tracing::debug;

/// Fixed configuration for a [`Dispatcher`].
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// The compiled identity format used to key requests.
    pub identity: pike_http::Identity,
    /// Bodies at or above this size (in bytes) are stored compressed; smaller
    /// bodies are always kept in their identity encoding. Zero disables
    /// compression entirely.
    pub compress_min_length: u32,
    /// Gzip compression level (`0` selects the codec's default).
    pub gzip_level: i32,
    /// Brotli quality (`0` selects quality 9).
    pub brotli_quality: u32,
    /// TTL applied when the origin gives no explicit freshness directive.
    pub default_ttl: Duration,
    /// TTL of the negative-cache (`HitForPass`) marker.
    pub hit_for_pass_ttl: Duration,
    /// Header used to report `HIT` / `MISS` / `PASS` on every response.
    pub cache_status_header: HeaderName,
    /// Longest a request waits on another in-flight fetch for the same
    /// identity before falling back to its own uncoalesced upstream call.
    pub max_concurrent_wait: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            identity: pike_http::Identity::default_format(),
            compress_min_length: 1024,
            gzip_level: 0,
            brotli_quality: 0,
            default_ttl: Duration::from_secs(60),
            hit_for_pass_ttl: Duration::from_secs(10),
            cache_status_header: crate::layer::DEFAULT_CACHE_STATUS_HEADER,
            max_concurrent_wait: Duration::from_secs(30),
        }
    }
}

/// A [`tower::Layer`] that wraps a service with [`Dispatcher`].
#[derive(Clone)]
pub struct DispatcherLayer<B> {
    backend: Arc<B>,
    registry: Arc<StateRegistry>,
    config: Arc<DispatcherConfig>,
}

impl<B> DispatcherLayer<B> {
    /// Builds a layer over the given response store, with a fresh coalescing
    /// registry bounded to `max_hit_for_pass` negative-cache entries.
    pub fn new(backend: Arc<B>, config: DispatcherConfig, max_hit_for_pass: usize) -> Self {
        let registry = StateRegistry::new(max_hit_for_pass, 8, config.max_concurrent_wait);
        Self {
            backend,
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }
}

impl<S, B> Layer<S> for DispatcherLayer<B> {
    type Service = Dispatcher<S, B>;

    fn layer(&self, upstream: S) -> Self::Service {
        Dispatcher {
            upstream,
            backend: self.backend.clone(),
            registry: self.registry.clone(),
            config: self.config.clone(),
        }
    }
}

/// Tower [`Service`] implementing the cache-aware request dispatcher.
///
/// Non-`GET`/`HEAD` requests pass straight through to `upstream`. Everything
/// else is keyed by `config.identity`, coalesced through `registry`, and
/// served from (or persisted to) `backend`.
pub struct Dispatcher<S, B> {
    upstream: S,
    backend: Arc<B>,
    registry: Arc<StateRegistry>,
    config: Arc<DispatcherConfig>,
}

impl<S: Clone, B> Clone for Dispatcher<S, B> {
    fn clone(&self) -> Self {
        Self {
            upstream: self.upstream.clone(),
            backend: self.backend.clone(),
            registry: self.registry.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S, B, ReqBody, ResBody> Service<Request<ReqBody>> for Dispatcher<S, B>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    B: Backend + Send + Sync + 'static,
    ReqBody: Send + 'static,
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Send,
{
    type Response = Response<Full<Bytes>>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.upstream.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let mut upstream = self.upstream.clone();
        let backend = self.backend.clone();
        let registry = self.registry.clone();
        let config = self.config.clone();

        Box::pin(async move {
            if !is_cacheable_method(req.method()) {
                let response = upstream.call(req).await?;
                return Ok(tag(bufferize(response).await, "PASS", &config.cache_status_header));
            }

            let identity = config.identity.evaluate(&req);
            let key = cache_key(&identity);
            let cancel = req
                .extensions()
                .get::<CancellationToken>()
                .cloned()
                .unwrap_or_else(CancellationToken::new);

            match registry.acquire(&identity, &cancel).await {
                Ok(Acquired::Ready(EntryState::Cacheable)) => {
                    if let Some(response) =
                        serve_from_store(&req, &key, &backend, &config).await
                    {
                        return Ok(response);
                    }
                    // Store read failed or the entry already expired: treat as a
                    // miss and re-fetch without the benefit of coalescing, since
                    // this request never became the fetch owner.
                    let response = upstream.call(req).await?;
                    Ok(tag(bufferize(response).await, "MISS", &config.cache_status_header))
                }
                Ok(Acquired::Ready(_)) => {
                    // `HitForPass`; the other variants never come back as `Ready`.
                    let response = upstream.call(req).await?;
                    Ok(tag(bufferize(response).await, "PASS", &config.cache_status_header))
                }
                Ok(Acquired::Owner(guard)) => {
                    fetch_and_store(req, guard, key, &mut upstream, &backend, &config).await
                }
                Err(AcquireError::RetryCapExceeded)
                | Err(AcquireError::Canceled)
                | Err(AcquireError::Timeout) => {
                    // Best-effort fallback: serve a direct, uncoalesced fetch rather
                    // than fail the request outright.
                    let response = upstream.call(req).await?;
                    Ok(tag(bufferize(response).await, "MISS", &config.cache_status_header))
                }
            }
        })
    }
}

fn is_cacheable_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

fn cache_key(identity: &Bytes) -> CacheKey {
    CacheKey::new(
        "dispatch",
        1,
        vec![KeyPart::new(
            "id",
            Some(String::from_utf8_lossy(identity).into_owned()),
        )],
    )
}

fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

/// Reads `Cache-Control: max-age` from the origin response, falling back to
/// `default_ttl` when absent or unparseable.
fn compute_ttl(headers: &http::HeaderMap, default_ttl: Duration) -> Duration {
    let Some(cache_control) = headers.get(http::header::CACHE_CONTROL) else {
        return default_ttl;
    };
    let Ok(cache_control) = cache_control.to_str() else {
        return default_ttl;
    };
    for directive in cache_control.split(',') {
        let directive = directive.trim();
        if let Some(value) = directive.strip_prefix("max-age=") {
            if let Ok(seconds) = value.trim().parse::<u64>() {
                return Duration::from_secs(seconds);
            }
        }
        if directive.eq_ignore_ascii_case("no-store") || directive.eq_ignore_ascii_case("private")
        {
            return Duration::ZERO;
        }
    }
    default_ttl
}

/// Collects a Tower response body into an owned `Response<Full<Bytes>>`.
async fn bufferize<ResBody>(response: Response<ResBody>) -> Response<Full<Bytes>>
where
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Send,
{
    let (parts, body) = response.into_parts();
    let bytes = BufferedBody::Passthrough(body)
        .collect()
        .await
        .unwrap_or_default();
    Response::from_parts(parts, Full::new(bytes))
}

fn tag(
    mut response: Response<Full<Bytes>>,
    status: &'static str,
    header: &HeaderName,
) -> Response<Full<Bytes>> {
    response
        .headers_mut()
        .insert(header.clone(), HeaderValue::from_static(status));
    response
}

/// Attempts to serve a `Cacheable` identity straight from the store: a fresh
/// `304` when the request is conditional and matches, otherwise the
/// negotiated encoding of the stored body. Returns `None` when the store
/// read fails or the record turns out to already be expired, so the caller
/// falls back to an uncoalesced fetch.
async fn serve_from_store<ReqBody, B>(
    req: &Request<ReqBody>,
    key: &CacheKey,
    backend: &Arc<B>,
    config: &DispatcherConfig,
) -> Option<Response<Full<Bytes>>>
where
    B: Backend + Send + Sync,
{
    let value = backend.read(key).await.ok().flatten()?;
    let record = ResponseRecord::decode(value.data(), config.compress_min_length).ok()?;
    if record.is_expired(unix_now()) {
        return None;
    }

    if let Some(if_none_match) = req
        .headers()
        .get(http::header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        && record.matches_if_none_match(if_none_match)
    {
        pike::metrics::record_not_modified();
        return Some(tag(build_not_modified(&record), "HIT", &config.cache_status_header));
    }

    let encoding = negotiate_encoding(
        req.headers()
            .get(http::header::ACCEPT_ENCODING)
            .and_then(|v| v.to_str().ok()),
    );
    pike::metrics::record_dispatch_encoding(encoding_label(encoding));
    response_from_record(&record, encoding)
        .ok()
        .map(|response| tag(response, "HIT", &config.cache_status_header))
}

fn encoding_label(encoding: AcceptedEncoding) -> &'static str {
    match encoding {
        AcceptedEncoding::Brotli => "br",
        AcceptedEncoding::Gzip => "gzip",
        AcceptedEncoding::Identity => "identity",
    }
}

fn build_not_modified(record: &ResponseRecord) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(StatusCode::NOT_MODIFIED);
    for name in pike_http::CONDITIONAL_HEADER_ALLOWLIST {
        if let Some(value) = record.header_value(name) {
            builder = builder.header(*name, value);
        }
    }
    builder.body(Full::new(Bytes::new())).unwrap_or_default()
}

fn response_from_record(
    record: &ResponseRecord,
    encoding: AcceptedEncoding,
) -> Result<Response<Full<Bytes>>, RecordError> {
    let (body, content_encoding) = record.body_for_encoding(encoding)?;
    let mut builder = Response::builder().status(record.status);
    let mut last_name: Option<HeaderName> = None;
    for (name, value) in record.header_map() {
        let name = name.or_else(|| last_name.clone());
        if let Some(name) = name {
            builder = builder.header(name.clone(), value);
            last_name = Some(name);
        }
    }
    if let Some(encoding) = content_encoding {
        builder = builder.header(http::header::CONTENT_ENCODING, encoding);
    }
    Ok(builder.body(Full::new(body)).unwrap_or_default())
}

/// Performs the upstream fetch this request owns, then persists the result
/// per the dispatcher's save-path invariants before releasing the registry
/// entry. Persistence only ever happens here, on the fetch owner's path.
async fn fetch_and_store<S, ReqBody, ResBody, B>(
    req: Request<ReqBody>,
    guard: FetchGuard<'_>,
    key: CacheKey,
    upstream: &mut S,
    backend: &Arc<B>,
    config: &DispatcherConfig,
) -> Result<Response<Full<Bytes>>, S::Error>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    B: Backend + Send + Sync,
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Send,
{
    let response = match upstream.call(req).await {
        Ok(response) => response,
        Err(err) => {
            guard.abandon();
            return Err(err);
        }
    };

    let (parts, body) = response.into_parts();
    let collected = BufferedBody::Passthrough(body).collect().await.ok();
    let Some(collected) = collected else {
        guard.abandon();
        let response = Response::builder()
            .status(StatusCode::BAD_GATEWAY)
            .body(Full::new(Bytes::new()))
            .unwrap_or_default();
        return Ok(tag(response, "MISS", &config.cache_status_header));
    };

    let ttl = compute_ttl(&parts.headers, config.default_ttl);
    let cacheable = !ttl.is_zero() && is_default_cacheable_status(parts.status);
    debug!(status = %parts.status, ttl_secs = ttl.as_secs(), cacheable, "fetched from upstream");

    if !cacheable {
        guard.publish(EntryState::HitForPass, config.hit_for_pass_ttl);
        let response = Response::from_parts(parts, Full::new(collected));
        return Ok(tag(response, "MISS", &config.cache_status_header));
    }

    let mut record = ResponseRecord::from_origin(
        parts.status,
        &parts.headers,
        collected.clone(),
        ttl.as_secs() as u32,
        config.compress_min_length,
    );

    if record.normalize(config.gzip_level, config.brotli_quality).is_err() {
        // Encode failure: fall back to storing the identity-encoded body only.
        record.gzip_body = Bytes::new();
        record.br_body = Bytes::new();
        record.body = collected.clone();
    }
    pike::metrics::record_dispatch_encoding(if record.body.is_empty() {
        "gzip+br"
    } else {
        "identity"
    });

    let expires_at = Utc::now() + chrono::Duration::seconds(ttl.as_secs().max(1) as i64);
    let write_result = backend
        .write(&key, CacheValue::<Raw>::new(record.encode(), Some(expires_at), None))
        .await;

    match write_result {
        Ok(()) => guard.publish(EntryState::Cacheable, ttl),
        Err(error) => {
            debug!(%error, "store write failed, serving and marking hit-for-pass");
            guard.publish(EntryState::HitForPass, config.hit_for_pass_ttl);
        }
    }

    let response = Response::from_parts(parts, Full::new(collected));
    Ok(tag(response, "MISS", &config.cache_status_header))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pike_backend::{BackendResult, DeleteStatus};
    use std::convert::Infallible;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tower::{Service, ServiceExt, service_fn};

    /// In-memory `Backend` for exercising the dispatcher without a real store.
    #[derive(Default)]
    struct MemoryBackend {
        entries: Mutex<std::collections::HashMap<CacheKey, CacheValue<Raw>>>,
    }

    #[async_trait::async_trait]
    impl Backend for MemoryBackend {
        async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheValue<Raw>>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn write(&self, key: &CacheKey, value: CacheValue<Raw>) -> BackendResult<()> {
            self.entries.lock().unwrap().insert(key.clone(), value);
            Ok(())
        }

        async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
            match self.entries.lock().unwrap().remove(key) {
                Some(_) => Ok(DeleteStatus::Deleted(1)),
                None => Ok(DeleteStatus::Missing),
            }
        }
    }

    fn dispatcher_for_test(
        upstream_hits: Arc<AtomicUsize>,
        body: &'static str,
        headers: &'static [(&'static str, &'static str)],
    ) -> Dispatcher<
        impl Service<
            Request<Full<Bytes>>,
            Response = Response<Full<Bytes>>,
            Error = Infallible,
            Future = impl Future<Output = Result<Response<Full<Bytes>>, Infallible>> + Send,
        > + Clone,
        MemoryBackend,
    > {
        let upstream = service_fn(move |_req: Request<Full<Bytes>>| {
            let upstream_hits = upstream_hits.clone();
            async move {
                upstream_hits.fetch_add(1, Ordering::SeqCst);
                let mut builder = Response::builder().status(StatusCode::OK);
                for (name, value) in headers {
                    builder = builder.header(*name, *value);
                }
                Ok::<_, Infallible>(builder.body(Full::new(Bytes::from_static(body.as_bytes()))).unwrap())
            }
        });
        let layer = DispatcherLayer::new(
            Arc::new(MemoryBackend::default()),
            DispatcherConfig::default(),
            64,
        );
        layer.layer(upstream)
    }

    fn get(uri: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(http::header::HOST, "example.com")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn cold_get_is_miss_then_warm_hit() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = dispatcher_for_test(
            hits.clone(),
            "hello world",
            &[("cache-control", "max-age=60"), ("content-type", "text/plain")],
        );

        let first = dispatcher.ready().await.unwrap().call(get("/a")).await.unwrap();
        assert_eq!(first.headers().get("x-cache-status").unwrap(), "MISS");

        let second = dispatcher.ready().await.unwrap().call(get("/a")).await.unwrap();
        assert_eq!(second.headers().get("x-cache-status").unwrap(), "HIT");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn large_compressible_body_served_to_a_gzip_client() {
        let hits = Arc::new(AtomicUsize::new(0));
        let body: &'static str = Box::leak(vec!['x'; 4096].into_iter().collect::<String>().into_boxed_str());
        let mut dispatcher = dispatcher_for_test(
            hits.clone(),
            body,
            &[("cache-control", "max-age=60"), ("content-type", "text/plain")],
        );

        dispatcher.ready().await.unwrap().call(get("/big")).await.unwrap();

        let mut req = get("/big");
        req.headers_mut()
            .insert(http::header::ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        let response = dispatcher.ready().await.unwrap().call(req).await.unwrap();
        assert_eq!(response.headers().get("x-cache-status").unwrap(), "HIT");
        assert_eq!(response.headers().get(http::header::CONTENT_ENCODING).unwrap(), "gzip");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn conditional_request_short_circuits_to_not_modified() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = dispatcher_for_test(
            hits.clone(),
            "hello world",
            &[("cache-control", "max-age=60"), ("etag", "\"v1\"")],
        );

        dispatcher.ready().await.unwrap().call(get("/etag")).await.unwrap();

        let mut req = get("/etag");
        req.headers_mut()
            .insert(http::header::IF_NONE_MATCH, HeaderValue::from_static("\"v1\""));
        let response = dispatcher.ready().await.unwrap().call(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers().get("x-cache-status").unwrap(), "HIT");
    }

    #[tokio::test]
    async fn post_requests_always_pass_through() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = dispatcher_for_test(hits.clone(), "created", &[]);

        let mut req = get("/create");
        *req.method_mut() = Method::POST;
        let first = dispatcher.ready().await.unwrap().call(req).await.unwrap();
        assert_eq!(first.headers().get("x-cache-status").unwrap(), "PASS");

        let mut req = get("/create");
        *req.method_mut() = Method::POST;
        dispatcher.ready().await.unwrap().call(req).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn uncacheable_response_is_marked_hit_for_pass() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = dispatcher_for_test(hits.clone(), "secret", &[("cache-control", "no-store")]);

        let first = dispatcher.ready().await.unwrap().call(get("/private")).await.unwrap();
        assert_eq!(first.headers().get("x-cache-status").unwrap(), "MISS");

        let second = dispatcher.ready().await.unwrap().call(get("/private")).await.unwrap();
        assert_eq!(second.headers().get("x-cache-status").unwrap(), "PASS");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_requests_for_the_same_identity_coalesce_into_one_fetch() {
        let hits = Arc::new(AtomicUsize::new(0));
        let dispatcher = dispatcher_for_test(
            hits.clone(),
            "hello world",
            &[("cache-control", "max-age=60")],
        );
        let dispatcher = Arc::new(tokio::sync::Mutex::new(dispatcher));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let dispatcher = dispatcher.clone();
            tasks.push(tokio::spawn(async move {
                let mut dispatcher = dispatcher.lock().await.clone();
                dispatcher.ready().await.unwrap().call(get("/stampede")).await.unwrap()
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
