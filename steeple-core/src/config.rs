//! Centralized configuration for Steeple.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::time::Duration;

use crate::mode::RuntimeMode;

/// Central configuration for all Steeple components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct SteepleConfig {
    /// Selects the remote or the in-memory backend
    pub mode: RuntimeMode,
    /// Remote data backend connection
    pub backend: BackendConfig,
    /// HTTP listener
    pub server: ServerConfig,
    /// Query normalization ceilings
    pub limits: QueryLimits,
}

/// Connection settings for the remote data backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the PostgREST-compatible gateway
    pub base_url: String,
    /// Anonymous API key sent as `apikey` and bearer token
    pub api_key: Option<String>,
    /// Per-request timeout enforced by the HTTP client
    pub request_timeout: Duration,
    /// User agent for outbound requests
    pub user_agent: &'static str,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(10),
            user_agent: "steeple/0.1.0",
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind; 0 picks an ephemeral port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding a listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Upper bounds applied while normalizing queries.
///
/// Prevents callers from requesting unbounded backend scans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryLimits {
    /// Largest accepted `limit` for any variant
    pub max_limit: u32,
    /// Largest accepted search radius in meters
    pub max_radius_m: f64,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_limit: 2000,
            max_radius_m: 100_000.0, // 100 km
        }
    }
}

impl SteepleConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(mode) = std::env::var("STEEPLE_MODE") {
            if let Ok(mode) = mode.parse::<RuntimeMode>() {
                config.mode = mode;
            }
        }

        // Backend overrides
        if let Ok(url) = std::env::var("STEEPLE_BACKEND_URL") {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                config.backend.base_url = url.to_string();
            }
        }

        if let Ok(key) = std::env::var("STEEPLE_BACKEND_KEY") {
            if !key.trim().is_empty() {
                config.backend.api_key = Some(key.trim().to_string());
            }
        }

        if let Ok(timeout) = std::env::var("STEEPLE_BACKEND_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.backend.request_timeout = Duration::from_secs(seconds);
            }
        }

        // Server overrides
        if let Ok(host) = std::env::var("STEEPLE_HOST") {
            if !host.trim().is_empty() {
                config.server.host = host.trim().to_string();
            }
        }

        if let Ok(port) = std::env::var("STEEPLE_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.server.port = port;
            }
        }

        // Query limit overrides
        if let Ok(max_limit) = std::env::var("STEEPLE_MAX_LIMIT") {
            if let Ok(value) = max_limit.parse::<u32>() {
                if value > 0 {
                    config.limits.max_limit = value;
                }
            }
        }

        if let Ok(max_radius) = std::env::var("STEEPLE_MAX_RADIUS_M") {
            if let Ok(value) = max_radius.parse::<f64>() {
                if value.is_finite() && value > 0.0 {
                    config.limits.max_radius_m = value;
                }
            }
        }

        config
    }

    /// Creates a configuration optimized for testing.
    pub fn for_testing() -> Self {
        Self {
            mode: RuntimeMode::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = SteepleConfig::default();

        assert_eq!(config.mode, RuntimeMode::Development);
        assert_eq!(config.backend.base_url, "http://localhost:54321");
        assert_eq!(config.backend.request_timeout, Duration::from_secs(10));
        assert!(config.backend.api_key.is_none());
        assert_eq!(config.server.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.limits.max_limit, 2000);
        assert_eq!(config.limits.max_radius_m, 100_000.0);
    }

    #[test]
    fn test_testing_preset_binds_ephemeral_port() {
        let config = SteepleConfig::for_testing();
        assert_eq!(config.server.port, 0);
        assert!(config.mode.is_development());
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("STEEPLE_MODE", "prod");
            std::env::set_var("STEEPLE_BACKEND_URL", "https://db.example.org/");
            std::env::set_var("STEEPLE_BACKEND_KEY", "anon-key");
            std::env::set_var("STEEPLE_BACKEND_TIMEOUT", "3");
            std::env::set_var("STEEPLE_PORT", "8080");
            std::env::set_var("STEEPLE_MAX_LIMIT", "0");
            std::env::set_var("STEEPLE_MAX_RADIUS_M", "25000");
        }

        let config = SteepleConfig::from_env();

        assert_eq!(config.mode, RuntimeMode::Production);
        assert_eq!(config.backend.base_url, "https://db.example.org");
        assert_eq!(config.backend.api_key.as_deref(), Some("anon-key"));
        assert_eq!(config.backend.request_timeout, Duration::from_secs(3));
        assert_eq!(config.server.port, 8080);
        // Zero is rejected and the default kept
        assert_eq!(config.limits.max_limit, 2000);
        assert_eq!(config.limits.max_radius_m, 25_000.0);

        // Cleanup
        unsafe {
            std::env::remove_var("STEEPLE_MODE");
            std::env::remove_var("STEEPLE_BACKEND_URL");
            std::env::remove_var("STEEPLE_BACKEND_KEY");
            std::env::remove_var("STEEPLE_BACKEND_TIMEOUT");
            std::env::remove_var("STEEPLE_PORT");
            std::env::remove_var("STEEPLE_MAX_LIMIT");
            std::env::remove_var("STEEPLE_MAX_RADIUS_M");
        }
    }
}
