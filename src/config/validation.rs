//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the upstream URL can be concatenated with request paths
//! - Check every route compiles
//! - Validate value ranges (limits > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;
use crate::routing::{RouteRule, RoutingError};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("upstream.url is required")]
    MissingUpstream,

    #[error("upstream.url '{url}' is invalid: {reason}")]
    InvalidUpstream { url: String, reason: String },

    #[error("routes[{index}]: {source}")]
    InvalidRoute {
        index: usize,
        #[source]
        source: RoutingError,
    },

    #[error("upstream.ignored_paths[{index}] '{path}' must be a non-empty absolute path")]
    InvalidIgnoredPath { index: usize, path: String },

    #[error("{field} must be greater than zero")]
    ZeroLimit { field: &'static str },

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = validate_upstream_url(&config.upstream.url) {
        errors.push(e);
    }

    for (index, route) in config.routes.iter().enumerate() {
        if let Err(source) = RouteRule::from_config(route) {
            errors.push(ValidationError::InvalidRoute { index, source });
        }
    }

    for (index, path) in config.upstream.ignored_paths.iter().enumerate() {
        if !path.starts_with('/') {
            errors.push(ValidationError::InvalidIgnoredPath {
                index,
                path: path.clone(),
            });
        }
    }

    if config.limits.max_request_body_bytes == 0 {
        errors.push(ValidationError::ZeroLimit {
            field: "limits.max_request_body_bytes",
        });
    }
    if config.limits.max_response_body_bytes == 0 {
        errors.push(ValidationError::ZeroLimit {
            field: "limits.max_response_body_bytes",
        });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that `url` is a plain `http` origin (optionally with a base path)
/// onto which a request path and query can be appended.
pub fn validate_upstream_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() {
        return Err(ValidationError::MissingUpstream);
    }

    let invalid = |reason: &str| ValidationError::InvalidUpstream {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    if parsed.scheme() != "http" {
        return Err(invalid("only the http scheme is supported"));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed"));
    }
    if url.ends_with('/') {
        return Err(invalid("must not end with '/'"));
    }

    Ok(())
}
