//! SPA gateway: rewrite-proxy table, build-time asset staging and
//! environment-derived runtime configuration for a single-page application.

pub mod assets;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use assets::{BuildVariant, CopyPlan, CopyReport};
pub use config::{GatewayConfig, RuntimeConfig};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use routing::RouteTable;
