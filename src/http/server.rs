//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind server to listener
//! - Dispatch requests to the rewrite table
//! - Forward matched requests to their upstream
//! - Serve everything else from the served-assets root
//! - Expose the redacted runtime configuration

use axum::{
    body::{Body, Bytes},
    extract::{
        rejection::{BytesRejection, FailedToBufferBody},
        DefaultBodyLimit, FromRequest, State,
    },
    http::{Request, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{GatewayConfig, RuntimeConfig};
use crate::http::request::{self, MakeRequestUuidV4};
use crate::http::response::{self, GatewayError};
use crate::observability::metrics;
use crate::routing::{has_dot_segment, RouteTable};

/// Path of the runtime configuration endpoint.
pub const RUNTIME_CONFIG_PATH: &str = "/__runtime-config";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub runtime: Arc<RuntimeConfig>,
    pub client: reqwest::Client,
    pub public_root: PathBuf,
    pub max_body_bytes: usize,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    /// Create a new server from validated configuration.
    pub fn new(
        config: &GatewayConfig,
        routes: RouteTable,
        runtime: Arc<RuntimeConfig>,
    ) -> Result<Self, reqwest::Error> {
        // Upstream client: no redirect following, so responses pass through as-is
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .build()?;

        let state = AppState {
            routes: Arc::new(routes),
            runtime,
            client,
            public_root: config.assets.public_root.clone(),
            max_body_bytes: config.listener.max_body_bytes,
        };

        let router = Self::build_router(config, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route(RUNTIME_CONFIG_PATH, get(runtime_config_handler))
            .fallback(gateway_handler)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.listener.max_body_bytes))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Redacted runtime configuration.
async fn runtime_config_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.runtime.to_public_json())
}

/// Main gateway handler.
/// Rewrites and forwards matched requests, serves static assets otherwise.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request::request_id(request.headers()).to_string();
    let target = request::request_target(request.uri()).to_string();
    let method = request.method().clone();

    // 1. Match rewrite rule
    let Some(route) = state.routes.lookup(&target) else {
        return serve_static(&state, request).await;
    };
    let rule = route.rule.source().to_string();
    let destination = route.destination;

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        target = %target,
        rule = %rule,
        destination = %destination,
        "Proxying request"
    );

    // 2. Refuse tails the upstream client would normalize
    let path = target.split('?').next().unwrap_or_default();
    let result = if has_dot_segment(path) {
        Err(GatewayError::DotSegment { path: path.to_string() })
    } else {
        forward(&state, request, &destination).await
    };

    // 3. Relay
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                destination = %destination,
                error = %e,
                "Request not forwarded"
            );
            e.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), &rule, start_time);
    response
}

/// Send the request verbatim (method, headers, body) to `destination`.
async fn forward(state: &AppState, request: Request<Body>, destination: &str) -> Result<Response, GatewayError> {
    let method = request.method().clone();
    let headers = request::upstream_headers(request.headers());
    let body = Bytes::from_request(request, state)
        .await
        .map_err(|rejection| match rejection {
            BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
                GatewayError::PayloadTooLarge {
                    limit: state.max_body_bytes,
                }
            }
            other => GatewayError::UnreadableBody(other.body_text()),
        })?;

    let upstream = state
        .client
        .request(method, destination)
        .headers(headers)
        .body(body)
        .send()
        .await?;

    Ok(response::relay(upstream))
}

/// Serve from the served-assets root.
async fn serve_static(state: &AppState, request: Request<Body>) -> Response {
    let response = match ServeDir::new(&state.public_root).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    };
    metrics::record_static(response.status().as_u16());
    response
}
