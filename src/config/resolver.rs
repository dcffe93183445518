//! Environment-to-runtime-configuration resolution.
//!
//! # Responsibilities
//! - Declare the complete environment surface (key + coercion + default)
//! - Apply coercions to raw environment strings
//! - Materialize the typed [`RuntimeConfig`] aggregate
//!
//! # Design Decisions
//! - Resolution is pure and total: missing or malformed input degrades to
//!   the documented default, an empty value, or `None`. It never fails.
//! - Booleans are strict `== "true"` checks, not truthy parses
//! - Lists split on `,` with no trimming and no de-duplication
//! - Defaulted keys treat an empty string the same as an unset variable
//! - Numeric thresholds keep a non-numeric raw value as a string; parsing is
//!   left to the consumer

use serde::Serialize;

use super::env::EnvironmentSource;

/// Static legal consent notice shown before login.
pub const SYSTEM_MESSAGE: &str = include_str!("consent_banner.html");

pub const DEFAULT_CLIENT_ID: &str = "login-client";
pub const DEFAULT_CLIENT_SECRET: &str = "secret";
pub const DEFAULT_CLIENT_SCOPE: &str = "openid profile email";
pub const DEFAULT_DEPLOYMENT_TYPE: &str = "hub";
pub const DEFAULT_SA_ICON_THRESHOLD: i64 = 11;
pub const DEFAULT_SA_GEO_THRESHOLD: i64 = 14;

/// How a raw environment string becomes a configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Raw value as-is, `None` when unset.
    Passthrough,
    /// Raw value, falling back to another key when unset or empty.
    PassthroughOr(&'static str),
    /// `true` iff the raw value is exactly `"true"`.
    Flag,
    /// Comma-separated list; unset or empty yields `[]`.
    List,
    /// Raw value, or the numeric default when unset or empty.
    IntegerOr(i64),
    /// Raw value, or the default when unset or empty.
    StringOr(&'static str),
    /// Fixed value, not read from the environment.
    Static(&'static str),
}

impl std::fmt::Display for Coercion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Coercion::Passthrough => write!(f, "string"),
            Coercion::PassthroughOr(other) => write!(f, "string (falls back to {})", other),
            Coercion::Flag => write!(f, "boolean"),
            Coercion::List => write!(f, "list"),
            Coercion::IntegerOr(n) => write!(f, "integer (default {})", n),
            Coercion::StringOr(s) => write!(f, "string (default {:?})", s),
            Coercion::Static(_) => write!(f, "static"),
        }
    }
}

/// A declared configuration key.
#[derive(Debug, Clone, Copy)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub coercion: Coercion,
    /// Excluded from any serialized or printed view.
    pub secret: bool,
}

const fn entry(key: &'static str, coercion: Coercion) -> ConfigEntry {
    ConfigEntry { key, coercion, secret: false }
}

const fn secret(key: &'static str, coercion: Coercion) -> ConfigEntry {
    ConfigEntry { key, coercion, secret: true }
}

/// The complete environment surface, in the order consumers see it.
pub static DECLARED_ENTRIES: &[ConfigEntry] = &[
    entry("SITE", Coercion::Passthrough),
    entry("NEXTAUTH_URL", Coercion::Passthrough),
    entry("GRAPHQL_BASE_URL", Coercion::Passthrough),
    entry("GEOSERVER_BASE_URL", Coercion::Passthrough),
    entry("NODE_BASE_URL", Coercion::Passthrough),
    entry("TILE_SERVER_ZYX_URL", Coercion::Passthrough),
    entry("TILE_SERVER_ZXY_URL", Coercion::Passthrough),
    entry("IDP_BASE_URL", Coercion::Passthrough),
    entry("IDP_REDIRECT_URL", Coercion::PassthroughOr("IDP_BASE_URL")),
    entry("AITR_BASE_URL", Coercion::Passthrough),
    entry("AITR_MAX_VLM_STREAMS", Coercion::Passthrough),
    entry("ONE_SHOT_BASE_URL", Coercion::Passthrough),
    entry("SEMANTIC_EDGE_URL", Coercion::Passthrough),
    entry("TRANSFER_BASE_URL", Coercion::Passthrough),
    secret("NEXTAUTH_SECRET", Coercion::Passthrough),
    entry("NEXTAUTH_URL_INTERNAL", Coercion::Passthrough),
    entry("CLIENT_ID", Coercion::StringOr(DEFAULT_CLIENT_ID)),
    secret("CLIENT_SECRET", Coercion::StringOr(DEFAULT_CLIENT_SECRET)),
    entry("CLIENT_SCOPE", Coercion::StringOr(DEFAULT_CLIENT_SCOPE)),
    entry("DOCUMENTATION_SERVER", Coercion::Passthrough),
    entry("FEATURE_FLAGS", Coercion::List),
    entry("SA_ICON_THRESHOLD", Coercion::IntegerOr(DEFAULT_SA_ICON_THRESHOLD)),
    entry("SA_GEO_THRESHOLD", Coercion::IntegerOr(DEFAULT_SA_GEO_THRESHOLD)),
    entry("DEPLOYMENT_TYPE", Coercion::StringOr(DEFAULT_DEPLOYMENT_TYPE)),
    entry("LOWEST_SYSTEM_CLASSIFICATION", Coercion::Passthrough),
    entry("SYSTEM_MESSAGE", Coercion::Static(SYSTEM_MESSAGE)),
    entry("STREAM_SERVER_HOST", Coercion::Passthrough),
    entry("STREAM_ABR_ENABLED", Coercion::Flag),
    entry("STREAM_SERVER_WEBRTC_PORT", Coercion::Passthrough),
    entry("STREAM_SERVER_LLHLS_PORT", Coercion::Passthrough),
    entry("STREAM_SERVER_LLHLS_ENABLED", Coercion::Flag),
    entry("STREAM_SERVER_WEBRTC_ENABLED", Coercion::Flag),
    entry("OVENPLAYER_DEBUG", Coercion::Flag),
    entry("USE_CUSTOM_BRANDING", Coercion::Flag),
    entry("BRAND_COLOR", Coercion::Passthrough),
    entry("TRANSFER_DESTINATIONS", Coercion::List),
    entry("APP_TYPE", Coercion::Passthrough),
    entry("VERSION", Coercion::Passthrough),
];

/// A numeric threshold: the declared default, or the raw environment string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NumericSetting {
    Default(i64),
    Raw(String),
}

impl NumericSetting {
    /// Parse for consumers that need a number. `None` for non-numeric input.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NumericSetting::Default(n) => Some(*n),
            NumericSetting::Raw(s) => s.trim().parse().ok(),
        }
    }
}

/// A resolved value of any coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Absent,
    Text(String),
    Flag(bool),
    List(Vec<String>),
    Numeric(NumericSetting),
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::Absent => write!(f, "<unset>"),
            ConfigValue::Text(s) => write!(f, "{:?}", s),
            ConfigValue::Flag(b) => write!(f, "{}", b),
            ConfigValue::List(items) => write!(f, "{:?}", items),
            ConfigValue::Numeric(NumericSetting::Default(n)) => write!(f, "{}", n),
            ConfigValue::Numeric(NumericSetting::Raw(s)) => write!(f, "{:?}", s),
        }
    }
}

impl ConfigEntry {
    /// Apply this entry's coercion to `env`.
    pub fn resolve<E: EnvironmentSource + ?Sized>(&self, env: &E) -> ConfigValue {
        match self.coercion {
            Coercion::Passthrough => passthrough(env, self.key).map_or(ConfigValue::Absent, ConfigValue::Text),
            Coercion::PassthroughOr(fallback) => {
                passthrough_or(env, self.key, fallback).map_or(ConfigValue::Absent, ConfigValue::Text)
            }
            Coercion::Flag => ConfigValue::Flag(flag(env, self.key)),
            Coercion::List => ConfigValue::List(list(env, self.key)),
            Coercion::IntegerOr(default) => ConfigValue::Numeric(integer_or(env, self.key, default)),
            Coercion::StringOr(default) => ConfigValue::Text(string_or(env, self.key, default)),
            Coercion::Static(text) => ConfigValue::Text(text.to_string()),
        }
    }
}

fn non_empty<E: EnvironmentSource + ?Sized>(env: &E, key: &str) -> Option<String> {
    env.get(key).filter(|v| !v.is_empty())
}

pub fn passthrough<E: EnvironmentSource + ?Sized>(env: &E, key: &str) -> Option<String> {
    env.get(key)
}

pub fn passthrough_or<E: EnvironmentSource + ?Sized>(env: &E, key: &str, fallback: &str) -> Option<String> {
    non_empty(env, key).or_else(|| env.get(fallback))
}

pub fn flag<E: EnvironmentSource + ?Sized>(env: &E, key: &str) -> bool {
    env.get(key).as_deref() == Some("true")
}

pub fn list<E: EnvironmentSource + ?Sized>(env: &E, key: &str) -> Vec<String> {
    match non_empty(env, key) {
        Some(raw) => raw.split(',').map(str::to_string).collect(),
        None => Vec::new(),
    }
}

pub fn integer_or<E: EnvironmentSource + ?Sized>(env: &E, key: &str, default: i64) -> NumericSetting {
    non_empty(env, key).map_or(NumericSetting::Default(default), NumericSetting::Raw)
}

pub fn string_or<E: EnvironmentSource + ?Sized>(env: &E, key: &str, default: &str) -> String {
    non_empty(env, key).unwrap_or_else(|| default.to_string())
}

/// Process-wide runtime settings, resolved once at boot.
///
/// Serializes under the environment key names. Secrets are never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct RuntimeConfig {
    pub site: Option<String>,
    pub nextauth_url: Option<String>,
    pub graphql_base_url: Option<String>,
    pub geoserver_base_url: Option<String>,
    pub node_base_url: Option<String>,
    pub tile_server_zyx_url: Option<String>,
    pub tile_server_zxy_url: Option<String>,
    pub idp_base_url: Option<String>,
    pub idp_redirect_url: Option<String>,
    pub aitr_base_url: Option<String>,
    pub aitr_max_vlm_streams: Option<String>,
    pub one_shot_base_url: Option<String>,
    pub semantic_edge_url: Option<String>,
    pub transfer_base_url: Option<String>,
    #[serde(skip_serializing)]
    pub nextauth_secret: Option<String>,
    pub nextauth_url_internal: Option<String>,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub client_scope: String,
    pub documentation_server: Option<String>,
    pub feature_flags: Vec<String>,
    pub sa_icon_threshold: NumericSetting,
    pub sa_geo_threshold: NumericSetting,
    pub deployment_type: String,
    pub lowest_system_classification: Option<String>,
    pub system_message: &'static str,
    pub stream_server_host: Option<String>,
    pub stream_abr_enabled: bool,
    pub stream_server_webrtc_port: Option<String>,
    pub stream_server_llhls_port: Option<String>,
    pub stream_server_llhls_enabled: bool,
    pub stream_server_webrtc_enabled: bool,
    pub ovenplayer_debug: bool,
    pub use_custom_branding: bool,
    pub brand_color: Option<String>,
    pub transfer_destinations: Vec<String>,
    pub app_type: Option<String>,
    pub version: Option<String>,
}

impl RuntimeConfig {
    /// Resolve every declared key from `env`. Never fails.
    pub fn resolve<E: EnvironmentSource + ?Sized>(env: &E) -> Self {
        Self {
            site: passthrough(env, "SITE"),
            nextauth_url: passthrough(env, "NEXTAUTH_URL"),
            graphql_base_url: passthrough(env, "GRAPHQL_BASE_URL"),
            geoserver_base_url: passthrough(env, "GEOSERVER_BASE_URL"),
            node_base_url: passthrough(env, "NODE_BASE_URL"),
            tile_server_zyx_url: passthrough(env, "TILE_SERVER_ZYX_URL"),
            tile_server_zxy_url: passthrough(env, "TILE_SERVER_ZXY_URL"),
            idp_base_url: passthrough(env, "IDP_BASE_URL"),
            idp_redirect_url: passthrough_or(env, "IDP_REDIRECT_URL", "IDP_BASE_URL"),
            aitr_base_url: passthrough(env, "AITR_BASE_URL"),
            aitr_max_vlm_streams: passthrough(env, "AITR_MAX_VLM_STREAMS"),
            one_shot_base_url: passthrough(env, "ONE_SHOT_BASE_URL"),
            semantic_edge_url: passthrough(env, "SEMANTIC_EDGE_URL"),
            transfer_base_url: passthrough(env, "TRANSFER_BASE_URL"),
            nextauth_secret: passthrough(env, "NEXTAUTH_SECRET"),
            nextauth_url_internal: passthrough(env, "NEXTAUTH_URL_INTERNAL"),
            client_id: string_or(env, "CLIENT_ID", DEFAULT_CLIENT_ID),
            client_secret: string_or(env, "CLIENT_SECRET", DEFAULT_CLIENT_SECRET),
            client_scope: string_or(env, "CLIENT_SCOPE", DEFAULT_CLIENT_SCOPE),
            documentation_server: passthrough(env, "DOCUMENTATION_SERVER"),
            feature_flags: list(env, "FEATURE_FLAGS"),
            sa_icon_threshold: integer_or(env, "SA_ICON_THRESHOLD", DEFAULT_SA_ICON_THRESHOLD),
            sa_geo_threshold: integer_or(env, "SA_GEO_THRESHOLD", DEFAULT_SA_GEO_THRESHOLD),
            deployment_type: string_or(env, "DEPLOYMENT_TYPE", DEFAULT_DEPLOYMENT_TYPE),
            lowest_system_classification: passthrough(env, "LOWEST_SYSTEM_CLASSIFICATION"),
            system_message: SYSTEM_MESSAGE,
            stream_server_host: passthrough(env, "STREAM_SERVER_HOST"),
            stream_abr_enabled: flag(env, "STREAM_ABR_ENABLED"),
            stream_server_webrtc_port: passthrough(env, "STREAM_SERVER_WEBRTC_PORT"),
            stream_server_llhls_port: passthrough(env, "STREAM_SERVER_LLHLS_PORT"),
            stream_server_llhls_enabled: flag(env, "STREAM_SERVER_LLHLS_ENABLED"),
            stream_server_webrtc_enabled: flag(env, "STREAM_SERVER_WEBRTC_ENABLED"),
            ovenplayer_debug: flag(env, "OVENPLAYER_DEBUG"),
            use_custom_branding: flag(env, "USE_CUSTOM_BRANDING"),
            brand_color: passthrough(env, "BRAND_COLOR"),
            transfer_destinations: list(env, "TRANSFER_DESTINATIONS"),
            app_type: passthrough(env, "APP_TYPE"),
            version: passthrough(env, "VERSION"),
        }
    }

    /// Redacted JSON view for clients and diagnostics.
    pub fn to_public_json(&self) -> serde_json::Value {
        // Serialization of plain strings, bools and vectors cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Resolve every declared entry in declaration order.
pub fn resolve_entries<E: EnvironmentSource + ?Sized>(env: &E) -> Vec<(&'static ConfigEntry, ConfigValue)> {
    DECLARED_ENTRIES.iter().map(|e| (e, e.resolve(env))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_empty_environment_is_total() {
        let config = RuntimeConfig::resolve(&env(&[]));

        assert_eq!(config.site, None);
        assert_eq!(config.graphql_base_url, None);
        assert_eq!(config.client_id, "login-client");
        assert_eq!(config.client_secret, "secret");
        assert_eq!(config.client_scope, "openid profile email");
        assert_eq!(config.deployment_type, "hub");
        assert_eq!(config.sa_icon_threshold, NumericSetting::Default(11));
        assert_eq!(config.sa_geo_threshold, NumericSetting::Default(14));
        assert!(config.feature_flags.is_empty());
        assert!(config.transfer_destinations.is_empty());
        assert!(!config.stream_abr_enabled);
        assert!(!config.use_custom_branding);
        assert!(config.system_message.starts_with("<div id=\"consent\">"));
        assert!(config.system_message.ends_with("</div>"));
    }

    #[test]
    fn test_boolean_is_strict_equality() {
        let on = RuntimeConfig::resolve(&env(&[("STREAM_ABR_ENABLED", "true")]));
        assert!(on.stream_abr_enabled);

        for raw in ["TRUE", "True", "1", "yes", " true", ""] {
            let off = RuntimeConfig::resolve(&env(&[("STREAM_ABR_ENABLED", raw)]));
            assert!(!off.stream_abr_enabled, "{raw:?} must not enable the flag");
        }
    }

    #[test]
    fn test_list_preserves_order_duplicates_and_blanks() {
        let config = RuntimeConfig::resolve(&env(&[
            ("FEATURE_FLAGS", "a,b,,c"),
            ("TRANSFER_DESTINATIONS", "x, y,x"),
        ]));
        assert_eq!(config.feature_flags, vec!["a", "b", "", "c"]);
        assert_eq!(config.transfer_destinations, vec!["x", " y", "x"]);

        let empty = RuntimeConfig::resolve(&env(&[("FEATURE_FLAGS", "")]));
        assert!(empty.feature_flags.is_empty());
    }

    #[test]
    fn test_defaults_are_overridden_by_environment() {
        let config = RuntimeConfig::resolve(&env(&[
            ("CLIENT_ID", "portal"),
            ("DEPLOYMENT_TYPE", "edge"),
            ("CLIENT_SCOPE", ""),
        ]));
        assert_eq!(config.client_id, "portal");
        assert_eq!(config.deployment_type, "edge");
        // Empty counts as unset for defaulted keys.
        assert_eq!(config.client_scope, "openid profile email");
    }

    #[test]
    fn test_threshold_keeps_raw_string() {
        let config = RuntimeConfig::resolve(&env(&[
            ("SA_ICON_THRESHOLD", "9"),
            ("SA_GEO_THRESHOLD", "lots"),
        ]));
        assert_eq!(config.sa_icon_threshold, NumericSetting::Raw("9".into()));
        assert_eq!(config.sa_icon_threshold.as_i64(), Some(9));
        assert_eq!(config.sa_geo_threshold, NumericSetting::Raw("lots".into()));
        assert_eq!(config.sa_geo_threshold.as_i64(), None);

        let json = config.to_public_json();
        assert_eq!(json["SA_ICON_THRESHOLD"], "9");
        let json = RuntimeConfig::resolve(&env(&[])).to_public_json();
        assert_eq!(json["SA_ICON_THRESHOLD"], 11);
    }

    #[test]
    fn test_passthrough_keeps_value_verbatim() {
        let config = RuntimeConfig::resolve(&env(&[
            ("GRAPHQL_BASE_URL", "not a url"),
            ("BRAND_COLOR", ""),
        ]));
        assert_eq!(config.graphql_base_url.as_deref(), Some("not a url"));
        assert_eq!(config.brand_color.as_deref(), Some(""));
    }

    #[test]
    fn test_idp_redirect_falls_back_to_base() {
        let config = RuntimeConfig::resolve(&env(&[("IDP_BASE_URL", "https://idp")]));
        assert_eq!(config.idp_redirect_url.as_deref(), Some("https://idp"));

        let config = RuntimeConfig::resolve(&env(&[
            ("IDP_BASE_URL", "https://idp"),
            ("IDP_REDIRECT_URL", "https://idp/redirect"),
        ]));
        assert_eq!(config.idp_redirect_url.as_deref(), Some("https://idp/redirect"));
    }

    #[test]
    fn test_public_json_omits_secrets() {
        let config = RuntimeConfig::resolve(&env(&[
            ("NEXTAUTH_SECRET", "s3cr3t"),
            ("CLIENT_SECRET", "hunter2"),
        ]));
        let json = config.to_public_json();
        let text = json.to_string();
        assert!(json.get("NEXTAUTH_SECRET").is_none());
        assert!(json.get("CLIENT_SECRET").is_none());
        assert!(!text.contains("s3cr3t"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn test_declared_entries_match_runtime_config() {
        let json = RuntimeConfig::resolve(&env(&[])).to_public_json();
        let object = json.as_object().unwrap();

        let public: Vec<_> = DECLARED_ENTRIES.iter().filter(|e| !e.secret).map(|e| e.key).collect();
        assert_eq!(object.len(), public.len());
        for key in public {
            assert!(object.contains_key(key), "{key} missing from RuntimeConfig");
        }
    }

    #[test]
    fn test_entry_resolution_agrees_with_struct() {
        let values: HashMap<String, String> = DECLARED_ENTRIES
            .iter()
            .map(|e| {
                let raw = match e.coercion {
                    Coercion::Flag => "true".to_string(),
                    Coercion::List => format!("{},x,,y", e.key),
                    Coercion::IntegerOr(_) => "37".to_string(),
                    _ => format!("{}-value", e.key),
                };
                (e.key.to_string(), raw)
            })
            .collect();

        for source in [values, env(&[])] {
            let config = RuntimeConfig::resolve(&source);
            let json = config.to_public_json();

            for (entry, value) in resolve_entries(&source) {
                let expected = match &value {
                    ConfigValue::Absent => serde_json::Value::Null,
                    other => serde_json::to_value(other).unwrap(),
                };
                let actual = match entry.key {
                    "NEXTAUTH_SECRET" => serde_json::to_value(&config.nextauth_secret).unwrap(),
                    "CLIENT_SECRET" => serde_json::to_value(&config.client_secret).unwrap(),
                    key => json[key].clone(),
                };
                assert_eq!(actual, expected, "{}", entry.key);
            }
        }
    }
}
