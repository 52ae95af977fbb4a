//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router that sends every request to the forwarding engine
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener
//! - Record per-exchange metrics
//! - Stop gracefully on the shutdown broadcast

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::sink::BufferedResponse;
use crate::observability::metrics;
use crate::proxy::{ForwardingEngine, Hooks};
use crate::routing::RoutingError;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ForwardingEngine>,
}

/// HTTP server fronting one forwarding engine.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    engine: Arc<ForwardingEngine>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and hooks.
    pub fn new(config: ProxyConfig, hooks: Hooks) -> Result<Self, RoutingError> {
        let engine = Arc::new(ForwardingEngine::from_config(&config, hooks)?);
        Ok(Self::with_engine(config, engine))
    }

    /// Serve an engine that was built elsewhere.
    pub fn with_engine(config: ProxyConfig, engine: Arc<ForwardingEngine>) -> Self {
        let state = AppState {
            engine: engine.clone(),
        };
        Self {
            router: Self::build_router(state),
            config,
            engine,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http()),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.engine.upstream_url(),
            routes = self.engine.routes().len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<ForwardingEngine> {
        &self.engine
    }
}

/// Runs one exchange through the engine.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let mut sink = BufferedResponse::new();
    state.engine.handle(request, &mut sink).await;
    let response = sink.into_response();

    metrics::record_exchange(&method, response.status().as_u16(), start);
    response
}
