//! ERP error types
//!
//! `ErpError` is the error taxonomy of the adapter. `execute` surfaces it
//! unchanged; the convenience methods log it and fall back to empty
//! results. At the port boundary it is mapped to `PortError`.

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur while talking to the ERP
#[derive(Debug, Error)]
pub enum ErpError {
    /// Credentials were rejected or the authentication call failed
    #[error("ERP authentication failed for {username}@{database}")]
    Authentication { database: String, username: String },

    /// The caller stopped waiting for a call
    #[error("ERP call timed out after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    /// Network or HTTP-level failure reaching the ERP
    #[error("ERP transport error: {0}")]
    Transport(String),

    /// The ERP answered with an XML-RPC fault
    #[error("ERP fault {code}: {message}")]
    Fault { code: i32, message: String },

    /// No pool slot became free within the queue timeout
    #[error("ERP worker pool saturated: no free slot after {waited_ms}ms")]
    PoolSaturated { waited_ms: u64 },

    /// The pool no longer accepts work
    #[error("ERP worker pool is closed")]
    PoolClosed,

    /// The registry has been shut down
    #[error("ERP client registry is shut down")]
    RegistryClosed,

    /// The ERP answered with a payload of the wrong shape
    #[error("Unexpected ERP response: {0}")]
    UnexpectedResponse(String),

    /// Invalid client configuration (bad URL, etc.)
    #[error("ERP configuration error: {0}")]
    Configuration(String),

    /// The blocking worker panicked or was aborted
    #[error("ERP worker failed: {0}")]
    Worker(String),
}

impl ErpError {
    pub fn transport(message: impl Into<String>) -> Self {
        ErpError::Transport(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        ErpError::UnexpectedResponse(message.into())
    }

    /// Checks if the call might succeed when retried later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErpError::Transport(_) | ErpError::Timeout { .. } | ErpError::PoolSaturated { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ErpError::Timeout { .. })
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, ErpError::Authentication { .. })
    }

    /// Checks if the fault is an ERP-side validation or user error
    fn is_user_fault(&self) -> bool {
        match self {
            ErpError::Fault { message, .. } => {
                message.contains("ValidationError")
                    || message.contains("UserError")
                    || message.contains("MissingError")
            }
            _ => false,
        }
    }
}

impl From<ErpError> for PortError {
    fn from(err: ErpError) -> Self {
        if err.is_user_fault() {
            return PortError::validation(err.to_string());
        }
        match err {
            ErpError::Authentication { .. } => PortError::Unauthorized {
                message: err.to_string(),
            },
            ErpError::Timeout { operation, duration_ms } => PortError::Timeout {
                operation,
                duration_ms,
            },
            ErpError::Transport(_) => PortError::Connection {
                message: err.to_string(),
                source: Some(Box::new(err)),
            },
            ErpError::PoolSaturated { .. } | ErpError::PoolClosed | ErpError::RegistryClosed => {
                PortError::ServiceUnavailable {
                    service: err.to_string(),
                }
            }
            ErpError::UnexpectedResponse(message) => PortError::Transformation { message },
            other => PortError::Internal {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}
