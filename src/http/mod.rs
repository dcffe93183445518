//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → routing::RouteTable (rewrite lookup)
//!         matched   → request.rs (upstream headers) → reqwest → response.rs (relay)
//!         unmatched → ServeDir (served-assets root)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::GatewayError;
pub use server::{AppState, GatewayServer, RUNTIME_CONFIG_PATH};
