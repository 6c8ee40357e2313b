//! services/api/src/config.rs
//!
//! Defines the service's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chat_widget_core::{WidgetConfig, MAX_WINDOW_MS};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub state_path: PathBuf,
    pub rate_limit: u32,
    pub window_duration_ms: i64,
    pub staleness_threshold_ms: i64,
    pub chat_upstream_url: Option<String>,
    pub cors_allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_allowed_origin = lookup("CORS_ALLOWED_ORIGIN")
            .unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Widget Settings ---
        let state_path = lookup("WIDGET_STATE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/widget_state.json"));

        let rate_limit = parse_number(&lookup, "WIDGET_RATE_LIMIT", 20u32)?;
        if rate_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "WIDGET_RATE_LIMIT".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let window_duration_ms = parse_number(&lookup, "WIDGET_WINDOW_MS", 60_000i64)?;
        if window_duration_ms <= 0 {
            return Err(ConfigError::InvalidValue(
                "WIDGET_WINDOW_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        if window_duration_ms > MAX_WINDOW_MS {
            return Err(ConfigError::InvalidValue(
                "WIDGET_WINDOW_MS".to_string(),
                format!("must not exceed {} (one year)", MAX_WINDOW_MS),
            ));
        }

        let staleness_threshold_ms =
            parse_number(&lookup, "WIDGET_STALENESS_MS", 86_400_000i64)?;
        if staleness_threshold_ms < 0 {
            return Err(ConfigError::InvalidValue(
                "WIDGET_STALENESS_MS".to_string(),
                "must not be negative".to_string(),
            ));
        }

        // --- Optional Reply Upstream ---
        let chat_upstream_url =
            lookup("CHAT_UPSTREAM_URL").filter(|url| !url.trim().is_empty());

        Ok(Self {
            bind_address,
            log_level,
            state_path,
            rate_limit,
            window_duration_ms,
            staleness_threshold_ms,
            chat_upstream_url,
            cors_allowed_origin,
        })
    }

    /// The subset of settings the widget core needs.
    pub fn widget_config(&self) -> WidgetConfig {
        WidgetConfig::new(
            self.rate_limit,
            self.window_duration_ms,
            self.staleness_threshold_ms,
        )
    }
}

fn parse_number<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.rate_limit, 20);
        assert_eq!(config.window_duration_ms, 60_000);
        assert_eq!(config.staleness_threshold_ms, 86_400_000);
        assert!(config.chat_upstream_url.is_none());
        assert_eq!(config.widget_config(), WidgetConfig::default());
    }

    #[test]
    fn reads_widget_settings() {
        let config = config_from(&[
            ("WIDGET_RATE_LIMIT", "3"),
            ("WIDGET_WINDOW_MS", "1000"),
            ("WIDGET_STALENESS_MS", "0"),
            ("CHAT_UPSTREAM_URL", "http://localhost:9000/reply"),
        ])
        .unwrap();
        assert_eq!(config.widget_config(), WidgetConfig::new(3, 1_000, 0));
        assert_eq!(
            config.chat_upstream_url.as_deref(),
            Some("http://localhost:9000/reply")
        );
    }

    #[test]
    fn rejects_zero_limit() {
        let err = config_from(&[("WIDGET_RATE_LIMIT", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "WIDGET_RATE_LIMIT"));
    }

    #[test]
    fn rejects_non_numeric_window() {
        let err = config_from(&[("WIDGET_WINDOW_MS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "WIDGET_WINDOW_MS"));
    }

    #[test]
    fn rejects_window_longer_than_a_year() {
        let too_long = (i64::MAX / 2).to_string();
        let err = config_from(&[("WIDGET_WINDOW_MS", too_long.as_str())]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "WIDGET_WINDOW_MS"));

        let max = MAX_WINDOW_MS.to_string();
        let config = config_from(&[("WIDGET_WINDOW_MS", max.as_str())]).unwrap();
        assert_eq!(config.widget_config().window_duration.num_milliseconds(), MAX_WINDOW_MS);
    }

    #[test]
    fn rejects_negative_staleness() {
        assert!(config_from(&[("WIDGET_STALENESS_MS", "-1")]).is_err());
    }
}
