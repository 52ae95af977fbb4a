//! Errors raised while forwarding one exchange.

use std::io;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::http::response::WriteError;
use crate::routing::RoutingError;

/// Failure reaching the upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection refused, DNS failure, protocol error...
    #[error("{0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    /// The exchange deadline passed before the upstream answered.
    #[error("upstream did not answer within {0:?}")]
    TimedOut(Duration),
}

/// Every failure the forwarding engine reports through the error hook.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("routing error: {0}")]
    Routing(#[from] RoutingError),

    #[error("path is not allowed: {method} {path}")]
    Unauthorized { method: Method, path: String },

    #[error("error reading request body: {0}")]
    BodyRead(#[source] axum::Error),

    #[error("error executing upstream request: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("error reading upstream response body: {0}")]
    ResponseRead(#[source] axum::Error),

    #[error("error writing upstream response to client: {0}")]
    RelayWrite(#[source] io::Error),

    #[error("error decompressing upstream response: {0}")]
    Decompression(#[source] io::Error),

    #[error("write response error: {0}")]
    Write(#[from] WriteError),
}

impl ProxyError {
    /// Status of the JSON error envelope sent for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message of the JSON error envelope. Never leaks internal details.
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::Unauthorized { .. } => "unauthorized call",
            ProxyError::Routing(RoutingError::Matcher { .. }) => "internal server error",
            _ => "internal error",
        }
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Routing(_) => "routing",
            ProxyError::Unauthorized { .. } => "unauthorized",
            ProxyError::BodyRead(_) => "body_read",
            ProxyError::Upstream(UpstreamError::TimedOut(_)) => "upstream_timeout",
            ProxyError::Upstream(_) => "upstream",
            ProxyError::ResponseRead(_) => "response_read",
            ProxyError::RelayWrite(_) => "relay_write",
            ProxyError::Decompression(_) => "decompression",
            ProxyError::Write(_) => "write",
        }
    }
}
