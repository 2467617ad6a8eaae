//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Base URL values are fetched from on a miss
    pub origin_url: String,
    /// Per-request timeout for origin fetches, in seconds
    pub origin_timeout: u64,
    /// TTL in seconds for values fetched from the origin
    pub value_ttl: u64,
    /// Consecutive failures after which a placeholder is cached instead of
    /// hitting the origin again
    pub placeholder_after: u32,
    /// TTL in seconds for the placeholder
    pub placeholder_ttl: u64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `ORIGIN_URL` - Origin base URL (default: http://127.0.0.1:8080)
    /// - `ORIGIN_TIMEOUT` - Origin request timeout in seconds (default: 5)
    /// - `VALUE_TTL` - TTL of fetched values in seconds (default: 300)
    /// - `PLACEHOLDER_AFTER` - Failures before caching a placeholder (default: 3)
    /// - `PLACEHOLDER_TTL` - TTL of the placeholder in seconds (default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: env_or("CACHE_CAPACITY", defaults.capacity),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            origin_url: env::var("ORIGIN_URL").unwrap_or(defaults.origin_url),
            origin_timeout: env_or("ORIGIN_TIMEOUT", defaults.origin_timeout),
            value_ttl: env_or("VALUE_TTL", defaults.value_ttl),
            placeholder_after: env_or("PLACEHOLDER_AFTER", defaults.placeholder_after),
            placeholder_ttl: env_or("PLACEHOLDER_TTL", defaults.placeholder_ttl),
        }
    }

    /// Cleanup interval, never shorter than one second.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 1000,
            cleanup_interval: 1,
            server_port: 3000,
            origin_url: "http://127.0.0.1:8080".to_string(),
            origin_timeout: 5,
            value_ttl: 300,
            placeholder_after: 3,
            placeholder_ttl: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.cleanup_interval(), Duration::from_secs(1));
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.value_ttl, 300);
        assert_eq!(config.placeholder_after, 3);
        assert_eq!(config.placeholder_ttl, 10);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        env::set_var("LOADCACHE_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("LOADCACHE_TEST_GARBAGE", 42u32), 42);
        env::remove_var("LOADCACHE_TEST_GARBAGE");
    }

    #[test]
    fn test_env_or_parses_value() {
        env::set_var("LOADCACHE_TEST_PORT", "8081");
        assert_eq!(env_or("LOADCACHE_TEST_PORT", 3000u16), 8081);
        env::remove_var("LOADCACHE_TEST_PORT");
    }
}
