//! Startup orchestration.
//!
//! # Responsibilities
//! - Compile the rewrite table from validated configuration
//! - Resolve the process-wide runtime configuration
//! - Report route/runtime disagreements
//! - Start metrics, bind the listener, run until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::runtime;
use crate::config::validation::{check_backend_consistency, ConsistencyWarning};
use crate::config::{GatewayConfig, RuntimeConfig};
use crate::http::GatewayServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::{RouteTable, RoutingError};

/// Errors that stop the gateway from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Everything the server needs, before any socket is opened.
#[derive(Debug)]
pub struct Prepared {
    pub routes: RouteTable,
    pub runtime: Arc<RuntimeConfig>,
    pub warnings: Vec<ConsistencyWarning>,
}

/// Compile routes and compare them against the runtime configuration.
pub fn prepare(config: &GatewayConfig, runtime: Arc<RuntimeConfig>) -> Result<Prepared, StartupError> {
    let routes = RouteTable::from_declarations(&config.routes)?;
    tracing::info!(rules = routes.len(), "Rewrite table compiled");

    let warnings = check_backend_consistency(&routes, &runtime);
    for w in &warnings {
        tracing::warn!(
            prefix = %w.prefix,
            env_key = w.env_key,
            runtime_origin = %w.runtime_origin,
            routed_origin = %w.routed_origin,
            "Rewrite upstream disagrees with runtime base URL"
        );
    }

    Ok(Prepared {
        routes,
        runtime,
        warnings,
    })
}

/// Boot the gateway and serve until SIGINT/SIGTERM.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    let prepared = prepare(&config, runtime::global())?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    tracing::info!(
        address = %listener.local_addr()?,
        public_root = %config.assets.public_root.display(),
        "Listening for connections"
    );

    let server = GatewayServer::new(&config, prepared.routes, prepared.runtime)?;
    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    server.run(listener, shutdown.subscribe()).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteDeclaration;

    #[test]
    fn test_prepare_reports_disagreement() {
        let runtime = Arc::new(RuntimeConfig::resolve(&[("GRAPHQL_BASE_URL", "http://api.local/graphql")]));
        let prepared = prepare(&GatewayConfig::default(), runtime).unwrap();

        assert_eq!(prepared.routes.len(), 5);
        assert_eq!(prepared.warnings.len(), 1);
        assert_eq!(prepared.warnings[0].env_key, "GRAPHQL_BASE_URL");
    }

    #[test]
    fn test_prepare_rejects_ambiguous_routes() {
        let mut config = GatewayConfig::default();
        config
            .routes
            .push(RouteDeclaration::new("/graphql/v2/*path", "https://other/*path"));
        let runtime = Arc::new(RuntimeConfig::resolve(&[("SITE", "x")]));

        assert!(matches!(
            prepare(&config, runtime),
            Err(StartupError::Routing(RoutingError::Ambiguous(_)))
        ));
    }
}
