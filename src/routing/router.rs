//! Route table used as the authorization oracle.
//!
//! # Responsibilities
//! - Store compiled `(method, matcher)` rules in configuration order
//! - Answer whether a method/path pair is permitted
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in table order, first accepting rule wins
//! - Method comparison is exact, as sent on the wire

use axum::http::Method;

use crate::config::{MatchType, RouteConfig};
use crate::routing::matcher::{ExactMatcher, PathMatcher, PathPrefixMatcher, TemplateMatcher};
use crate::routing::RoutingError;

/// One forwarding rule.
#[derive(Debug)]
pub struct RouteRule {
    method: Method,
    matcher: Box<dyn PathMatcher>,
}

impl RouteRule {
    pub fn new(method: Method, matcher: impl PathMatcher + 'static) -> Self {
        Self {
            method,
            matcher: Box::new(matcher),
        }
    }

    /// Compile a rule from its configuration entry.
    pub fn from_config(config: &RouteConfig) -> Result<Self, RoutingError> {
        let method = Method::from_bytes(config.method.as_bytes())
            .map_err(|_| RoutingError::InvalidMethod(config.method.clone()))?;

        let matcher: Box<dyn PathMatcher> = match config.match_type {
            MatchType::Template => Box::new(TemplateMatcher::compile(&config.path)?),
            MatchType::Prefix => Box::new(PathPrefixMatcher::new(config.path.clone())),
            MatchType::Exact => Box::new(ExactMatcher::new(config.path.clone())),
        };

        Ok(Self { method, matcher })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// A method mismatch is a plain `false`; only the matcher can fail.
    pub fn accepts(&self, method: &Method, path: &str) -> Result<bool, RoutingError> {
        if self.method != method {
            return Ok(false);
        }
        self.matcher.matches(path)
    }
}

/// Ordered set of forwarding rules.
#[derive(Debug, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    pub fn from_config(routes: &[RouteConfig]) -> Result<Self, RoutingError> {
        let rules = routes
            .iter()
            .map(RouteRule::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First-match answer for the whole table. Stops at the first matcher error.
    pub fn accepts(&self, method: &Method, path: &str) -> Result<bool, RoutingError> {
        for rule in &self.rules {
            if rule.accepts(method, path)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
