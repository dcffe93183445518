//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RouteDeclaration[] (source pattern, destination template)
//!     → matcher.rs (parse source pattern: literal prefix + trailing capture)
//!     → rule.rs (parse destination template, bind placeholder to capture)
//!     → router.rs (ambiguity check, freeze as immutable RouteTable)
//!
//! Incoming Request (path + query)
//!     → router.rs (first rule whose prefix matches)
//!     → rule.rs (substitute captured tail, append query)
//!     → Return: destination URL or NoMatch
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex: literal prefix plus one trailing multi-segment wildcard
//! - Captured tail is forwarded byte-for-byte (no decoding, no normalization);
//!   tails with dot segments are refused since URL parsing would collapse them
//! - Overlapping prefixes are rejected at construction; lookups are first match wins

pub mod matcher;
pub mod router;
pub mod rule;

pub use matcher::{has_dot_segment, SourcePattern};
pub use router::{find_ambiguities, Ambiguity, RouteMatch, RouteTable};
pub use rule::{DestinationTemplate, RewriteRule};

use thiserror::Error;

/// Errors raised while compiling the rewrite table.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("invalid source pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid destination `{destination}`: {reason}")]
    InvalidDestination { destination: String, reason: String },

    #[error("destination `{destination}` references `{placeholder}` which `{source_pattern}` does not capture")]
    UnknownPlaceholder {
        source_pattern: String,
        destination: String,
        placeholder: String,
    },

    #[error("ambiguous rewrite rules: {}", format_ambiguities(.0))]
    Ambiguous(Vec<Ambiguity>),
}

fn format_ambiguities(list: &[Ambiguity]) -> String {
    list.iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Returns true for characters allowed in a capture name.
pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
