//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every rewrite declaration and detect overlapping prefixes
//! - Detect asset destination collisions for each build variant
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Advisory check that rewrite upstreams agree with runtime base URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Route/runtime disagreement is a warning, never an error

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::assets::{plan_copies, AssetError, BuildVariant};
use crate::config::resolver::RuntimeConfig;
use crate::config::schema::GatewayConfig;
use crate::routing::{find_ambiguities, RewriteRule, RouteTable, RoutingError};

/// A single semantic problem in a gateway configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("listener.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("routes[{index}]: {error}")]
    Route { index: usize, error: RoutingError },

    #[error(transparent)]
    Routing(RoutingError),

    #[error(transparent)]
    Assets(AssetError),
}

/// Validate a gateway configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    // Routes: compile individually so every bad declaration is reported
    let mut rules = Vec::with_capacity(config.routes.len());
    for (index, decl) in config.routes.iter().enumerate() {
        match RewriteRule::new(&decl.source, &decl.destination) {
            Ok(rule) => rules.push(rule),
            Err(error) => errors.push(ValidationError::Route { index, error }),
        }
    }
    let ambiguities = find_ambiguities(&rules);
    if !ambiguities.is_empty() {
        errors.push(ValidationError::Routing(RoutingError::Ambiguous(ambiguities)));
    }

    // Assets: collisions per variant
    for variant in [BuildVariant::Server, BuildVariant::Client] {
        if let Err(e) = plan_copies(&config.assets, variant) {
            errors.push(ValidationError::Assets(e));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A rewrite upstream that disagrees with the runtime base URL for the same backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyWarning {
    pub prefix: String,
    pub env_key: &'static str,
    pub runtime_origin: String,
    pub routed_origin: String,
}

impl std::fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "`{}` forwards to {} but {} points at {}",
            self.prefix, self.routed_origin, self.env_key, self.runtime_origin
        )
    }
}

/// Compare the origin of each backend's rewrite destination with the
/// matching runtime base URL. Unset or unparseable runtime URLs are skipped.
pub fn check_backend_consistency(routes: &RouteTable, runtime: &RuntimeConfig) -> Vec<ConsistencyWarning> {
    let pairs: [(&str, &'static str, Option<&str>); 4] = [
        ("/graphql", "GRAPHQL_BASE_URL", runtime.graphql_base_url.as_deref()),
        ("/geoserver", "GEOSERVER_BASE_URL", runtime.geoserver_base_url.as_deref()),
        ("/docs", "DOCUMENTATION_SERVER", runtime.documentation_server.as_deref()),
        ("/transfer", "TRANSFER_BASE_URL", runtime.transfer_base_url.as_deref()),
    ];

    let mut warnings = Vec::new();
    for (prefix, env_key, configured) in pairs {
        let Some(runtime_url) = configured.and_then(|raw| Url::parse(raw).ok()) else {
            continue;
        };
        let Some(rule) = routes.rules().iter().find(|r| r.source().prefix() == prefix) else {
            continue;
        };
        let Some(routed_url) = rule.destination().base_url() else {
            continue;
        };

        let runtime_origin = runtime_url.origin().ascii_serialization();
        let routed_origin = routed_url.origin().ascii_serialization();
        if runtime_origin != routed_origin {
            warnings.push(ConsistencyWarning {
                prefix: prefix.to_string(),
                env_key,
                runtime_origin,
                routed_origin,
            });
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{CopyDeclaration, RouteDeclaration};
    use crate::assets::AppliesTo;

    #[test]
    fn test_reference_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-addr".into();
        config.timeouts.request_secs = 0;
        config.routes.push(RouteDeclaration::new("/docs/api/*path", "https://other/*path"));
        config.routes.push(RouteDeclaration::new("no-slash", "https://other/"));
        config.assets.copies.push(CopyDeclaration::new(
            "elsewhere/hls.min.js",
            "hls.js/hls.min.js",
            AppliesTo::Both,
        ));

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidBindAddress(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ZeroTimeout("request_secs"))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Route { index: 6, .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Routing(RoutingError::Ambiguous(_)))));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Assets(AssetError::DestinationCollision { .. }))));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_backend_consistency() {
        let routes = RouteTable::from_declarations(&GatewayConfig::default().routes).unwrap();
        let runtime = RuntimeConfig::resolve(&[
            ("GRAPHQL_BASE_URL", "https://octocx/graphql"),
            ("GEOSERVER_BASE_URL", "https://maps.internal/geoserver"),
            ("TRANSFER_BASE_URL", "not a url"),
        ]);

        let warnings = check_backend_consistency(&routes, &runtime);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].prefix, "/geoserver");
        assert_eq!(warnings[0].env_key, "GEOSERVER_BASE_URL");
        assert_eq!(warnings[0].runtime_origin, "https://maps.internal");
        assert_eq!(warnings[0].routed_origin, "https://octocx");
    }
}
