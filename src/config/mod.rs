//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway configuration (build + boot):
//!     gateway.toml (optional)
//!     → loader.rs (parse & deserialize, defaults = reference deployment)
//!     → validation.rs (semantic checks, all errors collected)
//!     → GatewayConfig (validated, immutable)
//!
//! Runtime configuration (boot):
//!     env.rs (EnvironmentSource: process env or synthetic map)
//!     → resolver.rs (coerce each declared key, apply defaults)
//!     → runtime.rs (resolved once, shared as Arc<RuntimeConfig>)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Gateway config fails loudly; runtime config never fails

pub mod env;
pub mod loader;
pub mod resolver;
pub mod runtime;
pub mod schema;
pub mod validation;

pub use env::{EnvironmentSource, ProcessEnv};
pub use loader::{load_config, load_or_default, ConfigError};
pub use resolver::{ConfigEntry, ConfigValue, Coercion, NumericSetting, RuntimeConfig, DECLARED_ENTRIES};
pub use schema::{
    AssetsConfig, CopyDeclaration, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RouteDeclaration, TimeoutConfig,
};
