//! Configuration schema definitions.
//!
//! This module defines the gateway's own configuration: listener, timeouts,
//! rewrite declarations, asset declarations and observability. All types
//! derive Serde traits for deserialization from a TOML file, and every
//! section has defaults so an empty file yields the reference deployment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::assets::AppliesTo;

/// Upstream host used by the reference rewrite table.
pub const REFERENCE_UPSTREAM: &str = "https://octocx";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rewrite declarations, in match order.
    pub routes: Vec<RouteDeclaration>,

    /// Asset staging configuration.
    pub assets: AssetsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            routes: reference_routes(),
            assets: AssetsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Largest request body forwarded upstream, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_body_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// A declared rewrite rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteDeclaration {
    /// Source pattern, e.g. `/graphql/*path`.
    pub source: String,

    /// Absolute destination template, e.g. `https://octocx/graphql/*path`.
    pub destination: String,
}

impl RouteDeclaration {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// The reference proxy table: each prefix forwarded to the same path upstream.
pub fn reference_routes() -> Vec<RouteDeclaration> {
    ["graphql", "geoserver", "tile-proxy", "docs", "transfer"]
        .iter()
        .map(|prefix| {
            RouteDeclaration::new(
                format!("/{prefix}/*path"),
                format!("{REFERENCE_UPSTREAM}/{prefix}/*path"),
            )
        })
        .collect()
}

/// Asset staging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Root that copy sources are resolved against.
    pub dependency_root: PathBuf,

    /// Served-assets root that copy destinations are resolved against.
    pub public_root: PathBuf,

    /// Declared copies.
    pub copies: Vec<CopyDeclaration>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dependency_root: PathBuf::from("node_modules"),
            public_root: PathBuf::from("public"),
            copies: reference_copies(),
        }
    }
}

/// A declared asset copy. Paths are relative to their roots.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CopyDeclaration {
    /// Source, relative to `dependency_root`.
    pub source: PathBuf,

    /// Destination, relative to `public_root`.
    pub destination: PathBuf,

    /// Build variants this copy runs for.
    #[serde(default)]
    pub variant: AppliesTo,
}

impl CopyDeclaration {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>, variant: AppliesTo) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            variant,
        }
    }
}

/// Player bundle and MGRS grid datasets, staged for client builds only.
pub fn reference_copies() -> Vec<CopyDeclaration> {
    let mgrs_features = PathBuf::from("@common-mgrs/mgrs/src/scripts/features");
    vec![
        CopyDeclaration::new("hls.js/dist/hls.min.js", "hls.js/hls.min.js", AppliesTo::Client),
        CopyDeclaration::new(
            mgrs_features.join("grid_zones_mgrs_grid.json"),
            "mgrs/grid_zones_mgrs_grid.json",
            AppliesTo::Client,
        ),
        CopyDeclaration::new(
            mgrs_features.join("mgrs.pmtiles"),
            "mgrs/mgrs.pmtiles",
            AppliesTo::Client,
        ),
    ]
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
