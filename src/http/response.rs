//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay the upstream response (status, headers, streamed body)
//! - Strip hop-by-hop headers on the way back
//! - Map gateway failures to HTTP status codes
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Upstream status codes pass through untouched, including redirects
//! - Transport failures become 502, deadlines 504, oversized request bodies 413
//! - Paths with dot segments are refused with 400 instead of being normalized

use axum::{
    body::Body,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::request::is_hop_by_hop;

/// Failures produced by the gateway itself (as opposed to upstream statuses).
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("request body could not be read: {0}")]
    UnreadableBody(String),

    #[error("path `{path}` contains dot segments")]
    DotSegment { path: String },

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::UnreadableBody(_) | GatewayError::DotSegment { .. } => StatusCode::BAD_REQUEST,
            GatewayError::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = match &self {
            GatewayError::PayloadTooLarge { .. } => "Request body too large",
            GatewayError::UnreadableBody(_) => "Request body could not be read",
            GatewayError::DotSegment { .. } => "Path contains dot segments",
            GatewayError::Upstream(_) => "Upstream request failed",
        };
        (self.status(), body).into_response()
    }
}

/// Turn an upstream response into the client response.
pub fn relay(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = client_headers(upstream.headers());

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Upstream headers minus hop-by-hop headers.
pub fn client_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_hop_by_hop(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}
