//! RPC transport abstraction
//!
//! The ERP exposes two endpoints under its base URL: `/xmlrpc/2/common`
//! for authentication and server metadata, and `/xmlrpc/2/object` for
//! `execute_kw` model method dispatch. A transport wraps both behind
//! blocking calls; the client runs them on the offload pool.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use core_kernel::Record;

use crate::error::ErpError;
use crate::session::AuthToken;

/// Path of the authentication endpoint
pub const COMMON_PATH: &str = "/xmlrpc/2/common";

/// Path of the model dispatch endpoint
pub const OBJECT_PATH: &str = "/xmlrpc/2/object";

/// One model method invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
    pub model: String,
    pub method: String,
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

impl RpcCall {
    pub fn new(
        model: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Value>,
        kwargs: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            model: model.into(),
            method: method.into(),
            args,
            kwargs: kwargs.unwrap_or_default(),
        }
    }

    /// `model.method`, used as the operation name in logs and timeouts
    pub fn operation(&self) -> String {
        format!("{}.{}", self.model, self.method)
    }
}

impl fmt::Display for RpcCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.model, self.method)
    }
}

/// Blocking access to one ERP server
pub trait RpcTransport: Send + Sync + 'static {
    /// Calls `common.version`; needs no authentication
    fn version(&self) -> Result<Value, ErpError>;

    /// Calls `common.authenticate`
    ///
    /// Returns `Ok(None)` when the ERP rejects the credentials.
    fn authenticate(
        &self,
        database: &str,
        username: &str,
        password: &str,
        context: &Record,
    ) -> Result<Option<AuthToken>, ErpError>;

    /// Calls `object.execute_kw`
    fn invoke(
        &self,
        database: &str,
        uid: AuthToken,
        password: &str,
        call: &RpcCall,
    ) -> Result<Value, ErpError>;
}

/// Builds transports for server URLs
pub trait TransportFactory: Send + Sync {
    fn connect(&self, server_url: &str) -> Result<Arc<dyn RpcTransport>, ErpError>;
}

/// Builds the full endpoint URL from a base URL and an endpoint path
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
