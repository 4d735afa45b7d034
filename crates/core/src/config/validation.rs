//! Configuration validation rules.
//!
//! This module provides validation logic for `WorkerConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::WorkerConfig;
use crate::origin;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn check_tag(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(invalid(field, "must not contain whitespace"));
    }
    Ok(())
}

fn check_path(field: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with('/') {
        return Err(invalid(field, format!("{value:?} must start with '/'")));
    }
    Ok(())
}

impl WorkerConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not a bare http(s) origin
    /// - `app_name` or `cache_version` is empty or contains whitespace
    /// - a `precache` entry or `app_shell` does not start with `/`
    /// - a `bypass_markers` entry is empty
    /// - `timeout_ms` is set but below 100ms or above 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        origin::parse(&self.origin).map_err(|e| invalid("origin", e.to_string()))?;

        check_tag("app_name", &self.app_name)?;
        check_tag("cache_version", &self.cache_version)?;

        for path in &self.precache {
            check_path("precache", path)?;
        }
        check_path("app_shell", &self.app_shell)?;
        check_path("notification.default_url", &self.notification.default_url)?;

        if self.bypass_markers.iter().any(String::is_empty) {
            return Err(invalid("bypass_markers", "entries must not be empty"));
        }

        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms < 100 {
                return Err(invalid("timeout_ms", "must be at least 100ms"));
            }
            if timeout_ms > 300_000 {
                return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
            }
        }

        if !self.precache.contains(&self.app_shell) {
            tracing::warn!(
                app_shell = %self.app_shell,
                "app_shell is not precached; offline navigations have no fallback until it is captured at runtime"
            );
        }

        Ok(())
    }
}
