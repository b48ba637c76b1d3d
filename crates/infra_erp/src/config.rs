//! ERP connection configuration
//!
//! This module holds the settings of the default ERP session and the
//! bounds of the offload pool every client owns.

use std::time::Duration;

use crate::pool::PoolConfig;
use crate::session::{ClientKey, Credentials};

/// Default number of blocking calls a client runs at once
pub const DEFAULT_MAX_IN_FLIGHT: usize = 20;

/// Default time a caller waits for one ERP call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration of the default ERP session
///
/// # Example
///
/// ```rust
/// use infra_erp::ErpConfig;
/// use std::time::Duration;
///
/// let config = ErpConfig::new("https://erp.example.com", "prod", "api", "secret")
///     .max_in_flight(8)
///     .call_timeout(Some(Duration::from_secs(15)))
///     .queue_timeout(Some(Duration::from_secs(2)));
/// ```
#[derive(Debug, Clone)]
pub struct ErpConfig {
    /// Base URL of the ERP server, without the `/xmlrpc/2/...` suffix
    pub url: String,
    /// ERP database name
    pub database: String,
    /// Login of the integration user
    pub username: String,
    /// Password or API key of the integration user
    pub credentials: Credentials,
    /// Maximum number of blocking calls in flight per client
    pub max_in_flight: usize,
    /// How long a caller waits for a call before giving up; `None` waits forever
    pub call_timeout: Option<Duration>,
    /// How long a call may queue for a pool slot; `None` queues without limit
    pub queue_timeout: Option<Duration>,
}

impl ErpConfig {
    pub fn new(
        url: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            username: username.into(),
            credentials: Credentials::new(password),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
            queue_timeout: None,
        }
    }

    /// Sets the pool bound (default: 20, minimum 1)
    pub fn max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max.max(1);
        self
    }

    /// Sets the default per-call timeout (default: 60s)
    pub fn call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Sets the queue timeout (default: none)
    pub fn queue_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.queue_timeout = timeout;
        self
    }

    /// Key of the default session
    pub fn client_key(&self) -> ClientKey {
        ClientKey::new(&self.url, &self.database, &self.username)
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_in_flight: self.max_in_flight,
            queue_timeout: self.queue_timeout,
        }
    }
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self::new("http://localhost:8069", "odoo", "admin", "admin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ErpConfig::new("https://erp.example.com/", "prod", "api", "secret")
            .max_in_flight(5)
            .call_timeout(None)
            .queue_timeout(Some(Duration::from_millis(250)));

        assert_eq!(config.max_in_flight, 5);
        assert_eq!(config.call_timeout, None);
        assert_eq!(config.pool_config().queue_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.client_key().server_url, "https://erp.example.com");
    }

    #[test]
    fn test_defaults() {
        let config = ErpConfig::default();
        assert_eq!(config.max_in_flight, DEFAULT_MAX_IN_FLIGHT);
        assert_eq!(config.call_timeout, Some(DEFAULT_CALL_TIMEOUT));
        assert!(config.queue_timeout.is_none());
    }

    #[test]
    fn test_zero_bound_is_clamped() {
        assert_eq!(ErpConfig::default().max_in_flight(0).max_in_flight, 1);
    }
}
