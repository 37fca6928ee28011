//! Request matching: method filters and path patterns.
//!
//! Patterns use the same token syntax as endpoint path templates, so a
//! descriptor's path can be registered as-is. Segment rules:
//! `:name` captures exactly one non-empty segment, `*` matches whatever is
//! left (including nothing), anything else must match literally. Empty
//! segments are ignored on both sides, so trailing slashes do not matter.
//! Segments are percent-decoded before they are compared or captured.

use std::fmt;

use endpoint_core::path::{PATH_SEPARATOR, TOKEN_PREFIX};
use endpoint_core::{HttpMethod, Params};

use crate::request::split_target;

const WILDCARD: &str = "*";

/// Percent-decode one path segment. Invalid UTF-8 is kept as sent.
fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodFilter {
    All,
    Only(HttpMethod),
}

impl MethodFilter {
    pub fn matches(&self, method: HttpMethod) -> bool {
        match self {
            MethodFilter::All => true,
            MethodFilter::Only(expected) => *expected == method,
        }
    }
}

impl From<HttpMethod> for MethodFilter {
    fn from(method: HttpMethod) -> Self {
        MethodFilter::Only(method)
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::All => f.write_str("ALL"),
            MethodFilter::Only(method) => fmt::Display::fmt(method, f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a path template. An absolute url is reduced to its path.
    pub fn parse(pattern: &str) -> Self {
        let (path, _) = split_target(pattern);
        let segments = path
            .split(PATH_SEPARATOR)
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(TOKEN_PREFIX) {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                _ if s == WILDCARD => Segment::Wildcard,
                _ => Segment::Literal(decode_segment(s)),
            })
            .collect();
        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Captured params when `path` matches.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let mut actual = path.split(PATH_SEPARATOR).filter(|s| !s.is_empty());
        let mut params = Params::new();

        for segment in &self.segments {
            match segment {
                Segment::Wildcard => return Some(params),
                Segment::Param(name) => {
                    let value = actual.next()?;
                    params.insert(name.clone(), decode_segment(value));
                }
                Segment::Literal(expected) => {
                    if decode_segment(actual.next()?) != *expected {
                        return None;
                    }
                }
            }
        }

        actual.next().is_none().then_some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
