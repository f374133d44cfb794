//! Configuration management for the dashboard client

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Viewport width at or below which the sidebar is forced collapsed.
pub const MOBILE_BREAKPOINT: u32 = 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the lab backend
    pub backend_url: String,

    /// Interval between status/metrics refresh cycles
    pub status_poll_interval: Duration,

    /// Interval between security panel refresh cycles
    pub security_poll_interval: Duration,

    /// HTTP timeout for backend requests
    pub http_timeout: Duration,

    /// Path of the UI preferences file; resolved from the home
    /// directory when unset
    pub prefs_path: Option<PathBuf>,

    /// Viewport width reported by the hosting front-end
    pub viewport_width: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:3000".to_string(),
            status_poll_interval: Duration::from_secs(10),
            security_poll_interval: Duration::from_secs(30),
            http_timeout: Duration::from_secs(10),
            prefs_path: None,
            viewport_width: 1280,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(backend_url) = env::var("BACKEND_URL") {
            config.backend_url = backend_url;
        }

        if let Ok(interval) = env::var("STATUS_POLL_SECONDS") {
            if let Ok(seconds) = interval.parse::<u64>() {
                config.status_poll_interval = Duration::from_secs(seconds);
            }
        }

        if let Ok(interval) = env::var("SECURITY_POLL_SECONDS") {
            if let Ok(seconds) = interval.parse::<u64>() {
                config.security_poll_interval = Duration::from_secs(seconds);
            }
        }

        if let Ok(timeout) = env::var("HTTP_TIMEOUT_SECONDS") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.http_timeout = Duration::from_secs(seconds);
            }
        }

        if let Ok(path) = env::var("PREFS_PATH") {
            config.prefs_path = Some(PathBuf::from(path));
        }

        if let Ok(width) = env::var("VIEWPORT_WIDTH") {
            if let Ok(width) = width.parse() {
                config.viewport_width = width;
            }
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.backend_url.is_empty() {
            return Err("backend_url cannot be empty".to_string());
        }

        if self.status_poll_interval.is_zero() {
            return Err("status_poll_interval must be greater than 0".to_string());
        }

        if self.security_poll_interval.is_zero() {
            return Err("security_poll_interval must be greater than 0".to_string());
        }

        if self.http_timeout.is_zero() {
            return Err("http_timeout must be greater than 0".to_string());
        }

        if self.viewport_width == 0 {
            return Err("viewport_width must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.status_poll_interval, Duration::from_secs(10));
        assert_eq!(config.security_poll_interval, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_backend() {
        let config = Config {
            backend_url: String::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_intervals() {
        let config = Config {
            status_poll_interval: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            security_poll_interval: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
