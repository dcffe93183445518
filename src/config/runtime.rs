//! Process-wide runtime configuration.
//!
//! The first caller resolves [`RuntimeConfig`] from the process environment;
//! every later caller gets the same `Arc`. There is no refresh path.

use std::sync::{Arc, OnceLock};

use super::env::{EnvironmentSource, ProcessEnv};
use super::resolver::RuntimeConfig;

static RUNTIME: OnceLock<Arc<RuntimeConfig>> = OnceLock::new();

/// The process-wide configuration, resolved from the real environment on first use.
pub fn global() -> Arc<RuntimeConfig> {
    install_from(&ProcessEnv)
}

/// Resolve from `env` unless a configuration is already installed.
///
/// Returns whichever configuration ends up installed.
pub fn install_from<E: EnvironmentSource + ?Sized>(env: &E) -> Arc<RuntimeConfig> {
    RUNTIME
        .get_or_init(|| {
            let config = RuntimeConfig::resolve(env);
            tracing::info!(
                deployment_type = %config.deployment_type,
                feature_flags = config.feature_flags.len(),
                "Runtime configuration resolved"
            );
            Arc::new(config)
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_reader_sees_the_same_value() {
        let first = install_from(&[("DEPLOYMENT_TYPE", "edge")]);
        let second = install_from(&[("DEPLOYMENT_TYPE", "hub")]);
        let third = global();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &third));
        assert_eq!(second.deployment_type, first.deployment_type);
    }
}
