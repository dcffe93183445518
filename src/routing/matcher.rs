//! Source pattern parsing and path matching.
//!
//! # Responsibilities
//! - Parse `/prefix/segments/*name` (or `/prefix/:name*`) patterns
//! - Match a request path against the literal prefix on segment boundaries
//! - Hand back the captured tail exactly as it appeared in the request
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - `/graphql/*p` matches `/graphql`, `/graphql/` and `/graphql/a/b`, never `/graphqlx`
//! - Only the final segment may be a capture; named single-segment params are rejected

use super::{is_ident_char, RoutingError};

/// A compiled source pattern: literal prefix plus optional trailing capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePattern {
    raw: String,
    /// Literal prefix without trailing slash. Empty for a root pattern.
    prefix: String,
    capture: Option<String>,
}

impl SourcePattern {
    /// Parse a source pattern.
    pub fn parse(raw: &str) -> Result<Self, RoutingError> {
        let invalid = |reason: &str| RoutingError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let rest = raw
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with `/`"))?;

        let segments: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };

        let mut literals = Vec::with_capacity(segments.len());
        let mut capture = None;

        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(invalid("empty path segment"));
            }
            if let Some(name) = capture_name(segment) {
                if i + 1 != segments.len() {
                    return Err(invalid("wildcard capture must be the final segment"));
                }
                if name.is_empty() || !name.chars().all(is_ident_char) {
                    return Err(invalid("capture name must be alphanumeric"));
                }
                capture = Some(name.to_string());
            } else if segment.contains('*') || segment.starts_with(':') {
                return Err(invalid("only a trailing multi-segment wildcard is supported"));
            } else {
                literals.push(*segment);
            }
        }

        let prefix = if literals.is_empty() {
            String::new()
        } else {
            format!("/{}", literals.join("/"))
        };

        Ok(Self {
            raw: raw.to_string(),
            prefix,
            capture,
        })
    }

    /// The pattern as declared.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The literal prefix (`/graphql` for `/graphql/*path`).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Name of the trailing capture, if any.
    pub fn capture(&self) -> Option<&str> {
        self.capture.as_deref()
    }

    /// Match a request path (no query string). Returns the captured tail.
    ///
    /// Patterns without a capture only match their prefix exactly (an
    /// optional trailing slash is tolerated) and yield an empty capture.
    pub fn matches<'a>(&self, path: &'a str) -> Option<&'a str> {
        if path == self.prefix {
            return Some("");
        }
        let tail = path.strip_prefix(self.prefix.as_str())?.strip_prefix('/')?;
        if self.capture.is_some() || tail.is_empty() {
            Some(tail)
        } else {
            None
        }
    }

    /// True if either literal prefix is a segment-aligned prefix of the other.
    pub fn overlaps(&self, other: &SourcePattern) -> bool {
        segment_prefix_of(&self.prefix, &other.prefix) || segment_prefix_of(&other.prefix, &self.prefix)
    }
}

impl std::fmt::Display for SourcePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// `*name` or `:name*`.
fn capture_name(segment: &str) -> Option<&str> {
    if let Some(name) = segment.strip_prefix('*') {
        return Some(name);
    }
    segment.strip_prefix(':').and_then(|s| s.strip_suffix('*'))
}

/// True if `path` has a `.` or `..` segment, literal or percent-encoded.
///
/// URL parsers collapse these segments (and treat `\` as `/`), so a path
/// containing one cannot be forwarded verbatim.
pub fn has_dot_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}

fn segment_prefix_of(short: &str, long: &str) -> bool {
    match long.strip_prefix(short) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
