//! API configuration

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use core_kernel::ProjectId;
use infra_erp::ErpConfig;

/// API configuration
///
/// Loaded from `API_`-prefixed environment variables; every field has a
/// default.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Log level
    pub log_level: String,
    /// ERP server base URL
    pub erp_url: String,
    pub erp_database: String,
    pub erp_username: String,
    pub erp_password: String,
    /// Concurrent ERP calls per client
    pub erp_max_in_flight: usize,
    /// Per-call timeout in seconds, 0 disables it
    pub erp_call_timeout_secs: u64,
    /// Longest wait for a free ERP slot in seconds, 0 waits indefinitely
    pub erp_queue_timeout_secs: u64,
    /// Projects searched by the task endpoint, all when empty
    pub project_ids: Vec<i64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            log_level: "info".to_string(),
            erp_url: "http://localhost:8069".to_string(),
            erp_database: "odoo".to_string(),
            erp_username: "admin".to_string(),
            erp_password: "admin".to_string(),
            erp_max_in_flight: infra_erp::config::DEFAULT_MAX_IN_FLIGHT,
            erp_call_timeout_secs: infra_erp::config::DEFAULT_CALL_TIMEOUT.as_secs(),
            erp_queue_timeout_secs: 0,
            project_ids: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    ///
    /// `API_PROJECT_IDS` is a comma-separated list.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("API")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("project_ids"),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings of the default ERP session
    pub fn erp_config(&self) -> ErpConfig {
        ErpConfig::new(
            &self.erp_url,
            &self.erp_database,
            &self.erp_username,
            &self.erp_password,
        )
        .max_in_flight(self.erp_max_in_flight)
        .call_timeout(seconds(self.erp_call_timeout_secs))
        .queue_timeout(seconds(self.erp_queue_timeout_secs))
    }

    pub fn project_ids(&self) -> Vec<ProjectId> {
        self.project_ids.iter().copied().map(ProjectId::new).collect()
    }
}

fn seconds(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("log_level", &self.log_level)
            .field("erp_url", &self.erp_url)
            .field("erp_database", &self.erp_database)
            .field("erp_username", &self.erp_username)
            .field("erp_max_in_flight", &self.erp_max_in_flight)
            .field("erp_call_timeout_secs", &self.erp_call_timeout_secs)
            .field("erp_queue_timeout_secs", &self.erp_queue_timeout_secs)
            .field("project_ids", &self.project_ids)
            .finish_non_exhaustive()
    }
}
