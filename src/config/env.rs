//! Environment sources.
//!
//! All environment reads go through [`EnvironmentSource`] so resolution can be
//! driven by synthetic inputs in tests.

use std::collections::{BTreeMap, HashMap};

/// Read-only key/value view of the environment.
pub trait EnvironmentSource {
    /// Raw value for `key`, `None` when unset.
    fn get(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvironmentSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        // Non-unicode values are treated as unset.
        std::env::var(key).ok()
    }
}

impl EnvironmentSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl EnvironmentSource for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

impl EnvironmentSource for [(&str, &str)] {
    fn get(&self, key: &str) -> Option<String> {
        self.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
    }
}

impl<const N: usize> EnvironmentSource for [(&str, &str); N] {
    fn get(&self, key: &str) -> Option<String> {
        EnvironmentSource::get(self.as_slice(), key)
    }
}

impl<T: EnvironmentSource + ?Sized> EnvironmentSource for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}
