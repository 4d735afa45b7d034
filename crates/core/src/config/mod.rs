//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SAFETRACK_SW_*)
//! 2. TOML config file (if SAFETRACK_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::generation::CacheNames;
use crate::origin;
use crate::policy::Scope;

mod validation;

pub use validation::ConfigError;

/// Worker configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SAFETRACK_SW_*)
/// 2. TOML config file (if SAFETRACK_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Origin of the app shell; only requests to it are intercepted.
    ///
    /// Set via SAFETRACK_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Prefix of every partition name.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Generation tag shipped with this deployment.
    ///
    /// Set via SAFETRACK_SW_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Paths fetched and stored at install time.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Document served when a navigation fails with nothing cached.
    #[serde(default = "default_app_shell")]
    pub app_shell: String,

    /// Path substrings that are always forwarded live.
    #[serde(default = "default_bypass_markers")]
    pub bypass_markers: Vec<String>,

    /// Path to the SQLite partition store.
    ///
    /// Set via SAFETRACK_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for live fetches.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Transport timeout in milliseconds. Unset means no timeout.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Fallbacks for push payloads with missing fields.
    #[serde(default)]
    pub notification: NotificationConfig,
}

/// Defaults used when a push payload omits a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_title")]
    pub default_title: String,

    #[serde(default = "default_body")]
    pub default_body: String,

    #[serde(default = "default_app_shell")]
    pub default_url: String,

    #[serde(default = "default_icon")]
    pub icon: String,
}

fn default_origin() -> String {
    "http://localhost:5173".into()
}

fn default_app_name() -> String {
    "safetrack".into()
}

fn default_cache_version() -> String {
    "v1.1".into()
}

fn default_precache() -> Vec<String> {
    vec!["/".into(), "/index.html".into(), "/manifest.json".into(), "/favicon.svg".into()]
}

fn default_app_shell() -> String {
    "/".into()
}

fn default_bypass_markers() -> Vec<String> {
    vec!["/functions/".into(), "/auth/".into()]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./safetrack-sw-cache.sqlite")
}

fn default_user_agent() -> String {
    "safetrack-sw/0.1".into()
}

fn default_title() -> String {
    "SafeTrack".into()
}

fn default_body() -> String {
    "You have a new alert".into()
}

fn default_icon() -> String {
    "/favicon.svg".into()
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_title: default_title(),
            default_body: default_body(),
            default_url: default_app_shell(),
            icon: default_icon(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            app_name: default_app_name(),
            cache_version: default_cache_version(),
            precache: default_precache(),
            app_shell: default_app_shell(),
            bypass_markers: default_bypass_markers(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: None,
            notification: NotificationConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Timeout as Duration for use with reqwest, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Partition names for the configured generation.
    pub fn cache_names(&self) -> CacheNames {
        CacheNames::new(&self.app_name, &self.cache_version)
    }

    /// Interception scope built from the origin and bypass markers.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin does not parse.
    pub fn scope(&self) -> Result<Scope, ConfigError> {
        let origin = origin::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        Ok(Scope::new(origin, self.bypass_markers.clone()))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SAFETRACK_SW_`
    /// 2. TOML file from `SAFETRACK_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config_file = std::env::var("SAFETRACK_SW_CONFIG_FILE").ok().map(PathBuf::from);
        Self::load_from(config_file)
    }

    /// Load with an explicit config file, still honouring env overrides.
    pub fn load_from(config_file: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(
            Env::prefixed("SAFETRACK_SW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WorkerConfig::default();
        assert_eq!(config.origin, "http://localhost:5173");
        assert_eq!(config.cache_version, "v1.1");
        assert_eq!(config.precache, vec!["/", "/index.html", "/manifest.json", "/favicon.svg"]);
        assert_eq!(config.bypass_markers, vec!["/functions/", "/auth/"]);
        assert_eq!(config.db_path, PathBuf::from("./safetrack-sw-cache.sqlite"));
        assert!(config.timeout_ms.is_none());
        assert_eq!(config.notification.default_url, "/");
    }

    #[test]
    fn test_timeout_duration() {
        assert_eq!(WorkerConfig::default().timeout(), None);
        let config = WorkerConfig { timeout_ms: Some(5_000), ..Default::default() };
        assert_eq!(config.timeout(), Some(Duration::from_millis(5_000)));
    }

    #[test]
    fn test_cache_names_from_config() {
        let names = WorkerConfig::default().cache_names();
        assert_eq!(names.precache, "safetrack-v1.1");
        assert_eq!(names.runtime, "safetrack-runtime-v1.1");
    }

    #[test]
    fn test_scope_from_config() {
        let scope = WorkerConfig::default().scope().unwrap();
        assert_eq!(scope.origin.as_str(), "http://localhost:5173/");
        assert_eq!(scope.bypass_markers.len(), 2);
    }

    #[test]
    fn test_load_layers() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "sw.toml",
                r#"
                origin = "https://safetrack.app"
                cache_version = "v1.0"

                [notification]
                default_title = "Alert"
                "#,
            )?;
            jail.set_env("SAFETRACK_SW_CACHE_VERSION", "v2.0");

            let config = WorkerConfig::load_from(Some("sw.toml".into())).expect("config loads");
            assert_eq!(config.origin, "https://safetrack.app");
            assert_eq!(config.cache_version, "v2.0");
            assert_eq!(config.notification.default_title, "Alert");
            assert_eq!(config.notification.default_body, "You have a new alert");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SAFETRACK_SW_ORIGIN", "ftp://safetrack.app");
            assert!(matches!(WorkerConfig::load_from(None), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }
}
