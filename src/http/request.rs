//! Request-scoped exchange context.
//!
//! # Responsibilities
//! - Carry the session identifier that correlates hook events of one exchange
//! - Carry an optional deadline for the upstream round trip
//! - Derive both from an inbound request (extensions or `x-request-id`)
//!
//! # Design Decisions
//! - The session ID is whatever request ID the router layer assigned, so logs,
//!   hooks and the upstream all see the same token
//! - Requests without an ID get a fresh UUID v4

use std::fmt;
use std::sync::Arc;

use axum::http::Request;
use tokio::time::Instant;
use tower_http::request_id::RequestId;

/// Header carrying the request/session identifier.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Correlation token shared by every hook event of one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(Arc<str>);

impl SessionId {
    /// Generate a new random session ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Context handed to every hook invocation.
#[derive(Debug, Clone)]
pub struct ExchangeContext {
    session_id: SessionId,
    deadline: Option<Instant>,
}

impl ExchangeContext {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            deadline: None,
        }
    }

    /// Set the instant after which the upstream round trip is abandoned.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Build the context for an inbound request.
    ///
    /// Lookup order: an `ExchangeContext` extension, a `RequestId` extension,
    /// the `x-request-id` header, then a freshly generated ID.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        if let Some(ctx) = request.extensions().get::<ExchangeContext>() {
            return ctx.clone();
        }

        let from_extension = request
            .extensions()
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok());
        let from_header = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok());

        match from_extension.or(from_header).filter(|id| !id.is_empty()) {
            Some(id) => Self::new(id),
            None => Self::new(SessionId::generate()),
        }
    }
}
