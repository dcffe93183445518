//! Rewrite rules: source pattern bound to a destination template.
//!
//! # Responsibilities
//! - Parse absolute destination templates (`https://host/base/*path`)
//! - Validate the template with `url` and bind its placeholder to the source capture
//! - Produce the outbound URL for a matched request path and query

use url::Url;

use super::{is_ident_char, RoutingError, SourcePattern};

/// An absolute URL template with at most one placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationTemplate {
    raw: String,
    head: String,
    placeholder: Option<String>,
    tail: String,
}

impl DestinationTemplate {
    /// Parse a destination template.
    pub fn parse(raw: &str) -> Result<Self, RoutingError> {
        let invalid = |reason: String| RoutingError::InvalidDestination {
            destination: raw.to_string(),
            reason,
        };

        let (head, placeholder, tail) = match find_placeholder(raw) {
            Some((start, end, name)) => (&raw[..start], Some(name.to_string()), &raw[end..]),
            None => (raw, None, ""),
        };

        if tail.contains('*') {
            return Err(invalid("at most one placeholder is allowed".into()));
        }
        if placeholder.is_none() && raw.contains('*') {
            return Err(invalid("stray `*` outside a placeholder".into()));
        }

        let probe = format!("{head}{tail}");
        let url = Url::parse(&probe).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
            return Err(invalid("must be an absolute http(s) URL".into()));
        }

        Ok(Self {
            raw: raw.to_string(),
            head: head.to_string(),
            placeholder,
            tail: tail.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// The template with the placeholder removed, parsed as a URL.
    pub fn base_url(&self) -> Option<Url> {
        Url::parse(&format!("{}{}", self.head, self.tail)).ok()
    }

    /// Substitute the captured tail into the template.
    pub fn expand(&self, captured: &str) -> String {
        if self.placeholder.is_none() {
            return self.raw.clone();
        }
        let mut out = String::with_capacity(self.raw.len() + captured.len());
        if captured.is_empty() {
            out.push_str(self.head.strip_suffix('/').unwrap_or(&self.head));
        } else {
            out.push_str(&self.head);
            out.push_str(captured);
        }
        out.push_str(&self.tail);
        out
    }
}

impl std::fmt::Display for DestinationTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Locate a `*name` or `:name*` token. Returns (start, end, name).
fn find_placeholder(raw: &str) -> Option<(usize, usize, &str)> {
    let star = raw.find('*')?;

    // `:name*`
    let before = &raw[..star];
    let ident_start = before
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident_char(*c))
        .last()
        .map(|(i, _)| i);
    if let Some(start) = ident_start {
        if start > 0 && before.as_bytes()[start - 1] == b':' {
            return Some((start - 1, star + 1, &raw[start..star]));
        }
    }

    // `*name`
    let after = &raw[star + 1..];
    let len = after.chars().take_while(|c| is_ident_char(*c)).count();
    if len > 0 {
        return Some((star, star + 1 + len, &after[..len]));
    }
    None
}

/// A single prefix-rewrite rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    source: SourcePattern,
    destination: DestinationTemplate,
}

impl RewriteRule {
    /// Compile a rule from its declared source pattern and destination template.
    pub fn new(source: &str, destination: &str) -> Result<Self, RoutingError> {
        let source = SourcePattern::parse(source)?;
        let destination = DestinationTemplate::parse(destination)?;

        if let Some(placeholder) = destination.placeholder() {
            if source.capture() != Some(placeholder) {
                return Err(RoutingError::UnknownPlaceholder {
                    source_pattern: source.to_string(),
                    destination: destination.to_string(),
                    placeholder: placeholder.to_string(),
                });
            }
        }

        Ok(Self { source, destination })
    }

    pub fn source(&self) -> &SourcePattern {
        &self.source
    }

    pub fn destination(&self) -> &DestinationTemplate {
        &self.destination
    }

    /// Rewrite a request target (`/path?query`) into the outbound URL.
    ///
    /// The query string is appended unchanged. Returns `None` when the path
    /// does not match this rule.
    pub fn rewrite(&self, path_and_query: &str) -> Option<String> {
        let (path, query) = match path_and_query.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path_and_query, None),
        };

        let captured = self.source.matches(path)?;
        let mut target = self.destination.expand(captured);

        if let Some(query) = query {
            target.push(if target.contains('?') { '&' } else { '?' });
            target.push_str(query);
        }
        Some(target)
    }
}
