//! Path matching logic.
//!
//! # Responsibilities
//! - Test a request path against one rule's compiled pattern
//! - Report paths that cannot be evaluated as errors, not as mismatches
//!
//! # Design Decisions
//! - Path matching is case-sensitive and works on the raw, un-normalized path
//! - Patterns are compiled once at startup; evaluation never allocates
//! - No regex: templates are split into literal, parameter and wildcard segments

use crate::routing::RoutingError;

/// Trait for testing a request path against a rule.
pub trait PathMatcher: Send + Sync + std::fmt::Debug {
    /// Returns `Ok(true)` if the path is accepted by this matcher.
    fn matches(&self, path: &str) -> Result<bool, RoutingError>;
}

/// Matches one path exactly.
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    path: String,
}

impl ExactMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl PathMatcher for ExactMatcher {
    fn matches(&self, path: &str) -> Result<bool, RoutingError> {
        Ok(path == self.path)
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl PathMatcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> Result<bool, RoutingError> {
        Ok(path.starts_with(&self.prefix))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

/// Matches templated paths such as `/users/{id}/orders` or `/static/*`.
///
/// `{name}` accepts exactly one non-empty segment; a trailing `*` accepts any
/// remaining segments, including none.
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    pattern: String,
    segments: Vec<Segment>,
}

impl TemplateMatcher {
    /// Compile a template pattern.
    pub fn compile(pattern: &str) -> Result<Self, RoutingError> {
        let invalid = |reason: &str| RoutingError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let rest = pattern
            .strip_prefix('/')
            .ok_or_else(|| invalid("pattern must start with '/'"))?;

        let raw: Vec<&str> = rest.split('/').collect();
        let mut segments = Vec::with_capacity(raw.len());

        for (i, seg) in raw.iter().enumerate() {
            let segment = if *seg == "*" {
                if i != raw.len() - 1 {
                    return Err(invalid("'*' is only allowed as the last segment"));
                }
                Segment::Wildcard
            } else if let Some(name) = seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                if name.is_empty() || name.contains(['{', '}']) {
                    return Err(invalid("parameter name must be non-empty"));
                }
                Segment::Param(name.to_string())
            } else if seg.contains(['{', '}', '*']) {
                return Err(invalid("'{', '}' and '*' must span a whole segment"));
            } else {
                Segment::Literal(seg.to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl PathMatcher for TemplateMatcher {
    fn matches(&self, path: &str) -> Result<bool, RoutingError> {
        // Only origin-form paths have segments; `*` (OPTIONS) and
        // authority-form targets cannot be evaluated.
        let rest = path.strip_prefix('/').ok_or_else(|| RoutingError::Matcher {
            path: path.to_string(),
            reason: format!("'{}' requires an absolute path", self.pattern),
        })?;

        let mut parts = rest.split('/');
        for segment in &self.segments {
            match segment {
                Segment::Wildcard => return Ok(true),
                Segment::Literal(expected) => match parts.next() {
                    Some(part) if part == expected => {}
                    _ => return Ok(false),
                },
                Segment::Param(_) => match parts.next() {
                    Some(part) if !part.is_empty() => {}
                    _ => return Ok(false),
                },
            }
        }

        Ok(parts.next().is_none())
    }
}
