//! The forwarding engine: one full request/response cycle per call.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → ignored path?            → empty 200, nothing else
//!     → route table              → 401 / 500 envelope on failure
//!     → upstream URI             → base URL + path and query
//!     → buffer request body      → on_request_body
//!     → upstream round trip      (deadline-bounded)
//!     → buffer upstream body
//!     → relay end-to-end headers, status, body verbatim
//!     → gunzip copy for the hook → on_response_body
//! ```
//!
//! # Design Decisions
//! - The caller always receives the upstream's raw bytes; decompression only
//!   feeds the response-body hook
//! - Every failure is answered with a JSON envelope unless the response is
//!   already committed, in which case the envelope is skipped and logged
//! - A matcher error is reported but does not deny the request by itself;
//!   only an exhausted route table does

use std::collections::HashSet;
use std::future::Future;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{
        header::{
            CONNECTION, CONTENT_ENCODING, CONTENT_LENGTH, HOST, PROXY_AUTHENTICATE,
            PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING, UPGRADE,
        },
        HeaderName, Method, Request, Response, StatusCode, Uri,
    },
};
use flate2::read::GzDecoder;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time::Instant;

use crate::config::{validation::validate_upstream_url, ProxyConfig};
use crate::http::request::ExchangeContext;
use crate::http::response::{ErrorBody, ResponseWriter};
use crate::http::sink::ResponseSink;
use crate::observability::metrics;
use crate::proxy::error::{ProxyError, UpstreamError};
use crate::proxy::hooks::Hooks;
use crate::routing::{RouteTable, RoutingError};

/// HTTP client shared by all exchanges of an engine.
pub type UpstreamClient = Client<HttpConnector, Body>;

const DEFAULT_REQUEST_BODY_LIMIT: usize = 2 * 1024 * 1024;
const DEFAULT_RESPONSE_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Upstream headers that describe the upstream connection, not the payload.
/// The relayed body is already buffered, so hyper frames it anew.
const HOP_BY_HOP: [HeaderName; 9] = [
    CONNECTION,
    HeaderName::from_static("keep-alive"),
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
    CONTENT_LENGTH,
];

/// Build the default upstream client.
pub fn build_client(connect_timeout: Option<Duration>) -> UpstreamClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(connect_timeout);
    Client::builder(TokioExecutor::new()).build(connector)
}

/// Relays authorized requests to one fixed upstream.
#[derive(Debug)]
pub struct ForwardingEngine {
    upstream_url: String,
    routes: Arc<RouteTable>,
    client: UpstreamClient,
    writer: ResponseWriter,
    ignored_paths: HashSet<String>,
    hooks: Hooks,
    upstream_timeout: Option<Duration>,
    request_body_limit: usize,
    response_body_limit: usize,
}

impl ForwardingEngine {
    pub fn builder(upstream_url: impl Into<String>, routes: Arc<RouteTable>) -> EngineBuilder {
        EngineBuilder {
            upstream_url: upstream_url.into(),
            routes,
            client: None,
            writer: ResponseWriter::new(),
            ignored_paths: HashSet::new(),
            hooks: Hooks::default(),
            upstream_timeout: None,
            connect_timeout: None,
            request_body_limit: DEFAULT_REQUEST_BODY_LIMIT,
            response_body_limit: DEFAULT_RESPONSE_BODY_LIMIT,
        }
    }

    /// Build an engine from a validated configuration.
    pub fn from_config(config: &ProxyConfig, hooks: Hooks) -> Result<Self, RoutingError> {
        let routes = Arc::new(RouteTable::from_config(&config.routes)?);
        let secs = |s: u64| (s > 0).then(|| Duration::from_secs(s));

        Self::builder(config.upstream.url.clone(), routes)
            .ignored_paths(config.upstream.ignored_paths.iter().cloned())
            .upstream_timeout(secs(config.upstream.timeout_secs))
            .connect_timeout(secs(config.upstream.connect_timeout_secs))
            .request_body_limit(config.limits.max_request_body_bytes)
            .response_body_limit(config.limits.max_response_body_bytes)
            .hooks(hooks)
            .build()
    }

    pub fn upstream_url(&self) -> &str {
        &self.upstream_url
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Run one exchange, writing the outcome to `sink`.
    pub async fn handle(&self, request: Request<Body>, sink: &mut dyn ResponseSink) {
        if self.ignored_paths.contains(request.uri().path()) {
            tracing::trace!(path = %request.uri().path(), "Ignored path");
            sink.write_status(StatusCode::OK);
            return;
        }

        let ctx = ExchangeContext::from_request(&request);
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        tracing::debug!(
            session_id = %ctx.session_id(),
            method = %method,
            path = %path,
            "Forwarding exchange"
        );

        // 1. Authorize
        if !self.authorize(&ctx, &method, &path, sink) {
            self.fail(&ctx, sink, ProxyError::Unauthorized { method, path });
            return;
        }

        // 2. Upstream URI
        let uri = match self.upstream_uri(request.uri()) {
            Ok(uri) => uri,
            Err(e) => {
                self.fail(&ctx, sink, e.into());
                return;
            }
        };

        // 3. Buffer request body
        let (parts, body) = request.into_parts();
        let request_bytes = match axum::body::to_bytes(body, self.request_body_limit).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.fail(&ctx, sink, ProxyError::BodyRead(e));
                return;
            }
        };
        self.hooks.request_body(&ctx, &request_bytes);

        // 4. Forward
        let deadline = self.deadline(&ctx);
        let mut upstream_request = Request::new(Body::from(request_bytes));
        *upstream_request.method_mut() = parts.method;
        *upstream_request.uri_mut() = uri;
        for (name, value) in parts.headers.iter() {
            // The client derives Host from the upstream URI.
            if name != HOST {
                upstream_request
                    .headers_mut()
                    .append(name.clone(), value.clone());
            }
        }

        let response = match self.dispatch(upstream_request, deadline).await {
            Ok(response) => response,
            Err(e) => {
                self.fail(&ctx, sink, e.into());
                return;
            }
        };

        // 5. Buffer upstream body; the body is dropped here whatever the outcome.
        let (head, body) = response.into_parts();
        let limit = self.response_body_limit;
        let response_bytes =
            match within_deadline(deadline, axum::body::to_bytes(Body::new(body), limit)).await {
                Ok(Ok(bytes)) => bytes,
                Ok(Err(e)) => {
                    self.fail(&ctx, sink, ProxyError::ResponseRead(e));
                    return;
                }
                Err(e) => {
                    self.fail(&ctx, sink, e.into());
                    return;
                }
            };

        tracing::debug!(
            session_id = %ctx.session_id(),
            status = %head.status,
            bytes = response_bytes.len(),
            "Upstream responded"
        );

        // 6. Relay headers, status and body
        for (name, value) in head.headers.iter() {
            if !HOP_BY_HOP.contains(name) {
                sink.headers_mut().append(name.clone(), value.clone());
            }
        }
        if head.status != StatusCode::OK {
            sink.write_status(head.status);
        }
        if let Err(e) = sink.write(&response_bytes) {
            self.fail(&ctx, sink, ProxyError::RelayWrite(e));
            return;
        }

        // 7. Decoded copy for the hook only. Only the first Content-Encoding
        // value counts, and it must be exactly "gzip".
        let gzipped = head
            .headers
            .get(CONTENT_ENCODING)
            .is_some_and(|v| v.as_bytes() == b"gzip");
        if gzipped {
            match gunzip(&response_bytes, self.response_body_limit) {
                Ok(decoded) => {
                    self.hooks.response_body(&ctx, &decoded);
                    return;
                }
                Err(e) => {
                    // The caller already has the full response; this only
                    // reaches the error hook.
                    self.fail(&ctx, sink, ProxyError::Decompression(e));
                }
            }
        }

        self.hooks.response_body(&ctx, &response_bytes);
    }

    /// Scan the route table. A matcher error is reported and the scan goes on.
    fn authorize(
        &self,
        ctx: &ExchangeContext,
        method: &Method,
        path: &str,
        sink: &mut dyn ResponseSink,
    ) -> bool {
        for rule in self.routes.rules() {
            match rule.accepts(method, path) {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => self.fail(ctx, sink, e.into()),
            }
        }
        false
    }

    /// `upstream_url` followed by the original path and query.
    fn upstream_uri(&self, original: &Uri) -> Result<Uri, RoutingError> {
        let path_and_query = original
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = format!("{}{}", self.upstream_url, path_and_query);

        let uri: Uri = url.parse().map_err(|e: axum::http::uri::InvalidUri| {
            RoutingError::InvalidUrl {
                url: url.clone(),
                reason: e.to_string(),
            }
        })?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(RoutingError::InvalidUrl {
                url,
                reason: "not an absolute URL".to_string(),
            });
        }
        Ok(uri)
    }

    /// Earliest of the context deadline and the configured upstream timeout.
    fn deadline(&self, ctx: &ExchangeContext) -> Option<Instant> {
        let configured = self.upstream_timeout.map(|t| Instant::now() + t);
        match (ctx.deadline(), configured) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    async fn dispatch(
        &self,
        request: Request<Body>,
        deadline: Option<Instant>,
    ) -> Result<Response<Incoming>, UpstreamError> {
        within_deadline(deadline, self.client.request(request))
            .await?
            .map_err(UpstreamError::Transport)
    }

    /// Report `error` and answer with its JSON envelope when still possible.
    fn fail(&self, ctx: &ExchangeContext, sink: &mut dyn ResponseSink, error: ProxyError) {
        tracing::warn!(
            session_id = %ctx.session_id(),
            kind = error.kind(),
            error = %error,
            "Exchange failed"
        );
        metrics::record_proxy_error(error.kind());
        self.hooks.error(ctx, &error);

        if sink.is_committed() {
            tracing::warn!(
                session_id = %ctx.session_id(),
                status = %error.status(),
                "Response already committed, error envelope not written"
            );
            return;
        }

        let body = ErrorBody {
            message: error.public_message(),
        };
        match self.writer.write_json(sink, error.status(), &body) {
            Ok(written) => self.hooks.response_body(ctx, &written),
            Err(e) => {
                let error = ProxyError::from(e);
                tracing::error!(
                    session_id = %ctx.session_id(),
                    error = %error,
                    "Failed to write error envelope"
                );
                metrics::record_proxy_error(error.kind());
                self.hooks.error(ctx, &error);
            }
        }
    }
}

/// Await `fut`, giving up at `deadline` if there is one.
async fn within_deadline<F: Future>(
    deadline: Option<Instant>,
    fut: F,
) -> Result<F::Output, UpstreamError> {
    let started = Instant::now();
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| UpstreamError::TimedOut(started.elapsed())),
        None => Ok(fut.await),
    }
}

/// Inflate `bytes`, failing once the output grows past `limit`.
fn gunzip(bytes: &[u8], limit: usize) -> std::io::Result<Vec<u8>> {
    let mut decoded = Vec::new();
    GzDecoder::new(bytes)
        .take(limit as u64 + 1)
        .read_to_end(&mut decoded)?;
    if decoded.len() > limit {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("decompressed body exceeds {limit} bytes"),
        ));
    }
    Ok(decoded)
}

/// Builder for [`ForwardingEngine`].
#[derive(Debug)]
pub struct EngineBuilder {
    upstream_url: String,
    routes: Arc<RouteTable>,
    client: Option<UpstreamClient>,
    writer: ResponseWriter,
    ignored_paths: HashSet<String>,
    hooks: Hooks,
    upstream_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    request_body_limit: usize,
    response_body_limit: usize,
}

impl EngineBuilder {
    /// Share an existing client instead of building one.
    pub fn client(mut self, client: UpstreamClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn response_writer(mut self, writer: ResponseWriter) -> Self {
        self.writer = writer;
        self
    }

    /// Exact paths answered with an empty 200.
    pub fn ignored_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn upstream_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Only used when no client is supplied.
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn request_body_limit(mut self, limit: usize) -> Self {
        self.request_body_limit = limit;
        self
    }

    pub fn response_body_limit(mut self, limit: usize) -> Self {
        self.response_body_limit = limit;
        self
    }

    pub fn build(self) -> Result<ForwardingEngine, RoutingError> {
        validate_upstream_url(&self.upstream_url).map_err(|e| RoutingError::InvalidUrl {
            url: self.upstream_url.clone(),
            reason: e.to_string(),
        })?;

        let client = self
            .client
            .unwrap_or_else(|| build_client(self.connect_timeout));

        Ok(ForwardingEngine {
            upstream_url: self.upstream_url,
            routes: self.routes,
            client,
            writer: self.writer,
            ignored_paths: self.ignored_paths,
            hooks: self.hooks,
            upstream_timeout: self.upstream_timeout,
            request_body_limit: self.request_body_limit,
            response_body_limit: self.response_body_limit,
        })
    }
}
