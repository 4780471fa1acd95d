//! Gateway connection settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backend used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

/// Timeout configuration for gateway requests.
///
/// Timeouts are enforced by the transport only. A request that times out
/// surfaces as [`crate::GatewayError::Timeout`] and is never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Connection timeout.
    pub connect: Duration,
    /// Total request timeout.
    pub total: Duration,
}

impl TimeoutConfig {
    pub fn new(connect: Duration, total: Duration) -> Self {
        Self { connect, total }
    }

    /// Create from a single total timeout.
    pub fn from_total(total: Duration) -> Self {
        Self {
            connect: (total / 3).max(Duration::from_millis(100)).min(total),
            total,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::from_total(Duration::from_secs(15))
    }
}

/// Where the backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Backend origin, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Total per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> TimeoutConfig {
        TimeoutConfig::from_total(Duration::from_secs(self.timeout_secs.max(1)))
    }

    /// Join a route onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join() {
        let config = GatewayConfig::new("https://shop.example/");
        assert_eq!(config.url("/api/cart/get"), "https://shop.example/api/cart/get");
        assert_eq!(config.url("api/product/list"), "https://shop.example/api/product/list");
    }

    #[test]
    fn test_timeout_from_total() {
        let t = TimeoutConfig::from_total(Duration::from_secs(9));
        assert_eq!(t.connect, Duration::from_secs(3));
        assert_eq!(t.total, Duration::from_secs(9));

        let tiny = TimeoutConfig::from_total(Duration::from_millis(50));
        assert!(tiny.connect <= tiny.total);
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let config = GatewayConfig { timeout_secs: 0, ..GatewayConfig::default() };
        assert_eq!(config.timeout().total, Duration::from_secs(1));
    }
}
