//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Compile declared rewrite rules into an ordered table
//! - Detect overlapping prefixes (pure check over the declared rules)
//! - Look up the rule for a request target and produce the outbound URL
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan in declaration order (tables are small)
//! - Explicit NoMatch rather than silent default

use crate::config::RouteDeclaration;
use super::{RewriteRule, RoutingError};

/// Two rules whose literal prefixes overlap. Indices are declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    pub first: usize,
    pub first_pattern: String,
    pub second: usize,
    pub second_pattern: String,
}

impl std::fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "`{}` (rule #{}) overlaps `{}` (rule #{}); the earlier rule would shadow the later one",
            self.first_pattern,
            self.first + 1,
            self.second_pattern,
            self.second + 1
        )
    }
}

/// Report every pair of rules whose prefixes overlap.
pub fn find_ambiguities(rules: &[RewriteRule]) -> Vec<Ambiguity> {
    let mut found = Vec::new();
    for (i, a) in rules.iter().enumerate() {
        for (j, b) in rules.iter().enumerate().skip(i + 1) {
            if a.source().overlaps(b.source()) {
                found.push(Ambiguity {
                    first: i,
                    first_pattern: a.source().to_string(),
                    second: j,
                    second_pattern: b.source().to_string(),
                });
            }
        }
    }
    found
}

/// A successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub index: usize,
    pub rule: &'a RewriteRule,
    /// Fully substituted outbound URL.
    pub destination: String,
}

/// Ordered, immutable rewrite table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<RewriteRule>,
}

impl RouteTable {
    /// Build a table, rejecting overlapping prefixes.
    pub fn build(rules: Vec<RewriteRule>) -> Result<Self, RoutingError> {
        let (table, ambiguities) = Self::build_lenient(rules);
        if ambiguities.is_empty() {
            Ok(table)
        } else {
            Err(RoutingError::Ambiguous(ambiguities))
        }
    }

    /// Build a table even when prefixes overlap. The first declared rule wins.
    pub fn build_lenient(rules: Vec<RewriteRule>) -> (Self, Vec<Ambiguity>) {
        let ambiguities = find_ambiguities(&rules);
        for a in &ambiguities {
            tracing::warn!(
                first = %a.first_pattern,
                second = %a.second_pattern,
                "Overlapping rewrite rules"
            );
        }
        (Self { rules }, ambiguities)
    }

    /// Compile declarations from configuration.
    pub fn from_declarations(declarations: &[RouteDeclaration]) -> Result<Self, RoutingError> {
        let rules = declarations
            .iter()
            .map(|d| RewriteRule::new(&d.source, &d.destination))
            .collect::<Result<Vec<_>, _>>()?;
        Self::build(rules)
    }

    /// Find the first rule matching `path_and_query` and rewrite it.
    pub fn lookup(&self, path_and_query: &str) -> Option<RouteMatch<'_>> {
        self.rules.iter().enumerate().find_map(|(index, rule)| {
            rule.rewrite(path_and_query).map(|destination| RouteMatch {
                index,
                rule,
                destination,
            })
        })
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
