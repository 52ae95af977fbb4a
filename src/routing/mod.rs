//! Routing subsystem: decides whether a request may be forwarded.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (rule scan in table order)
//!     → matcher.rs (evaluate path pattern)
//!     → Return: accepted, rejected, or matcher error
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Parse methods, compile templates
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always yields the same decision
//! - First match wins (configuration order)

pub mod matcher;
pub mod router;

use thiserror::Error;

pub use matcher::{ExactMatcher, PathMatcher, PathPrefixMatcher, TemplateMatcher};
pub use router::{RouteRule, RouteTable};

/// Errors raised while compiling or evaluating routes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// A matcher could not evaluate the request path.
    #[error("unable to match path '{path}': {reason}")]
    Matcher { path: String, reason: String },

    /// A route pattern failed to compile.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A route names a method that is not a valid HTTP token.
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    /// The upstream URL for a request could not be built.
    #[error("unable to parse URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
