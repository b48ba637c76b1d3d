//! Ports and Adapters Infrastructure
//!
//! Domain services talk to the ERP through the `ErpPort` trait defined here.
//! The production adapter is the async XML-RPC client in `infra_erp`; tests
//! can substitute any other implementation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     HTTP Handlers                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │   Domain Services (partner, crm, helpdesk, sales, project)   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ ErpPort
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │      AsyncErpClient (offload pool + XML-RPC transport)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::error::CoreError;
use crate::identifiers::{IdList, RecordId};
use crate::query::{Domain, Record, SearchReadOptions};

/// Error type for port operations
///
/// Every domain service returns this type so the HTTP layer can map
/// failures to status codes without knowing which adapter produced them.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// A validation error occurred
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation timed out
    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },

    /// Authentication against the external system failed
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
    },

    /// The external system cannot take more work right now
    #[error("Service unavailable: {service}")]
    ServiceUnavailable {
        service: String,
    },

    /// A data transformation error occurred
    #[error("Transformation error: {message}")]
    Transformation {
        message: String,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Validation error with field information
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates a transient failure that may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. }
                | PortError::Timeout { .. }
                | PortError::ServiceUnavailable { .. }
        )
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

impl From<CoreError> for PortError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(message) => PortError::NotFound {
                entity_type: "record".to_string(),
                id: message,
            },
            CoreError::InvalidTaxId(message) => PortError::validation_field(message, "tax_id"),
            other if other.is_client_error() => PortError::validation(other.to_string()),
            other => PortError::internal(other.to_string()),
        }
    }
}

/// Access to the ERP's generic model methods
///
/// `execute` reports every failure; the convenience methods collapse
/// failures into "no data" (`[]`, `None`, `false`) after logging them.
#[async_trait]
pub trait ErpPort: Send + Sync {
    /// Invokes `method` on `model` with positional and keyword arguments
    async fn execute(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Option<Map<String, Value>>,
    ) -> Result<Value, PortError>;

    /// Searches and reads matching records; empty on failure
    async fn search_read(&self, model: &str, domain: Domain, options: SearchReadOptions) -> Vec<Record>;

    /// Creates a record; `None` on failure
    async fn create(&self, model: &str, values: Record) -> Option<RecordId>;

    /// Updates records; `false` on failure
    async fn write(&self, model: &str, ids: IdList, values: Record) -> bool;

    /// Deletes records; `false` on failure
    async fn unlink(&self, model: &str, ids: IdList) -> bool;
}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    /// Adapter is healthy and operational
    Healthy,
    /// Adapter is degraded but operational
    Degraded,
    /// Adapter is unhealthy and not operational
    Unhealthy,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Latency of the health check in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl HealthCheckResult {
    pub fn is_operational(&self) -> bool {
        matches!(self.status, AdapterHealth::Healthy | AdapterHealth::Degraded)
    }
}

/// Trait for adapters that support health checks
#[async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the adapter
    async fn health_check(&self) -> HealthCheckResult;
}
