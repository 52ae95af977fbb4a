//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from configuration
//! - Provide hooks that turn exchange events into log records
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides the configured level
//! - Every exchange record carries the session ID field

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};
use crate::proxy::Hooks;

/// Bodies longer than this are cut in log records.
const MAX_LOGGED_BODY: usize = 4096;

/// Install the global subscriber.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "gatekeeper_proxy={level},tower_http={level}",
            level = config.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Hooks that log every exchange event under its session ID.
pub fn exchange_hooks(log_bodies: bool) -> Hooks {
    Hooks::new()
        .on_error(|ctx, err| {
            tracing::error!(
                session_id = %ctx.session_id(),
                kind = err.kind(),
                error = %err,
                "Proxy error"
            );
        })
        .on_request_body(move |ctx, body| {
            if log_bodies {
                tracing::info!(
                    session_id = %ctx.session_id(),
                    bytes = body.len(),
                    body = %printable(body),
                    "Request body"
                );
            } else {
                tracing::debug!(session_id = %ctx.session_id(), bytes = body.len(), "Request body");
            }
        })
        .on_response_body(move |ctx, body| {
            if log_bodies {
                tracing::info!(
                    session_id = %ctx.session_id(),
                    bytes = body.len(),
                    body = %printable(body),
                    "Response body"
                );
            } else {
                tracing::debug!(session_id = %ctx.session_id(), bytes = body.len(), "Response body");
            }
        })
}

/// Lossy UTF-8 view of a body, truncated for log output.
fn printable(body: &[u8]) -> String {
    let cut = body.len().min(MAX_LOGGED_BODY);
    let mut text = String::from_utf8_lossy(&body[..cut]).into_owned();
    if body.len() > cut {
        text.push_str("...");
    }
    text
}
