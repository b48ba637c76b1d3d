//! XML-RPC transport
//!
//! Speaks the ERP's XML-RPC protocol over blocking HTTP. Arguments and
//! results are `serde_json::Value` on our side and converted at this edge.

use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, instrument};

use core_kernel::Record;

use crate::error::ErpError;
use crate::session::AuthToken;
use crate::transport::{endpoint, RpcCall, RpcTransport, TransportFactory, COMMON_PATH, OBJECT_PATH};

/// Transport for one ERP server
#[derive(Debug, Clone)]
pub struct XmlRpcTransport {
    common_url: String,
    object_url: String,
    timeout: Option<Duration>,
    http: OnceLock<reqwest::blocking::Client>,
}

impl XmlRpcTransport {
    /// Validates `server_url` and derives both endpoint URLs
    pub fn new(server_url: &str, timeout: Option<Duration>) -> Result<Self, ErpError> {
        let parsed = reqwest::Url::parse(server_url)
            .map_err(|e| ErpError::Configuration(format!("invalid ERP url '{server_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ErpError::Configuration(format!(
                "unsupported ERP url scheme '{}'",
                parsed.scheme()
            )));
        }

        Ok(Self {
            common_url: endpoint(server_url, COMMON_PATH),
            object_url: endpoint(server_url, OBJECT_PATH),
            timeout,
            http: OnceLock::new(),
        })
    }

    pub fn common_url(&self) -> &str {
        &self.common_url
    }

    pub fn object_url(&self) -> &str {
        &self.object_url
    }

    /// The shared HTTP client, built by the first call
    ///
    /// The blocking client owns a runtime and must be created off the async
    /// executor, so it is built lazily on the worker thread making the call.
    fn http(&self) -> Result<&reqwest::blocking::Client, ErpError> {
        if let Some(http) = self.http.get() {
            return Ok(http);
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ErpError::transport(e.to_string()))?;
        Ok(self.http.get_or_init(|| http))
    }

    /// Sends one request to `url`
    fn call(&self, url: &str, method: &str, args: Vec<xmlrpc::Value>) -> Result<xmlrpc::Value, ErpError> {
        let http = self.http()?;

        let request = args
            .into_iter()
            .fold(xmlrpc::Request::new(method), |request, arg| request.arg(arg));

        request.call(http.post(url)).map_err(map_xmlrpc_error)
    }
}

impl RpcTransport for XmlRpcTransport {
    fn version(&self) -> Result<Value, ErpError> {
        let result = self.call(&self.common_url, "version", Vec::new())?;
        from_xmlrpc(result)
    }

    #[instrument(skip(self, password, context), fields(url = %self.common_url))]
    fn authenticate(
        &self,
        database: &str,
        username: &str,
        password: &str,
        context: &Record,
    ) -> Result<Option<AuthToken>, ErpError> {
        let args = vec![
            xmlrpc::Value::String(database.to_string()),
            xmlrpc::Value::String(username.to_string()),
            xmlrpc::Value::String(password.to_string()),
            to_xmlrpc(&Value::Object(context.clone())),
        ];
        let result = self.call(&self.common_url, "authenticate", args)?;

        match result {
            xmlrpc::Value::Int(uid) => Ok(AuthToken::new(i64::from(uid))),
            xmlrpc::Value::Int64(uid) => Ok(AuthToken::new(uid)),
            xmlrpc::Value::Bool(false) => Ok(None),
            other => Err(ErpError::unexpected(format!(
                "authenticate returned {other:?}"
            ))),
        }
    }

    fn invoke(
        &self,
        database: &str,
        uid: AuthToken,
        password: &str,
        call: &RpcCall,
    ) -> Result<Value, ErpError> {
        debug!(model = %call.model, method = %call.method, "execute_kw");
        let args = vec![
            xmlrpc::Value::String(database.to_string()),
            int_value(uid.uid()),
            xmlrpc::Value::String(password.to_string()),
            xmlrpc::Value::String(call.model.clone()),
            xmlrpc::Value::String(call.method.clone()),
            xmlrpc::Value::Array(call.args.iter().map(to_xmlrpc).collect()),
            to_xmlrpc(&Value::Object(call.kwargs.clone())),
        ];
        let result = self.call(&self.object_url, "execute_kw", args)?;
        from_xmlrpc(result)
    }
}

/// Factory for `XmlRpcTransport`
#[derive(Debug, Clone, Default)]
pub struct XmlRpcTransportFactory {
    timeout: Option<Duration>,
}

impl XmlRpcTransportFactory {
    /// `timeout` is applied to every HTTP request
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl TransportFactory for XmlRpcTransportFactory {
    fn connect(&self, server_url: &str) -> Result<Arc<dyn RpcTransport>, ErpError> {
        Ok(Arc::new(XmlRpcTransport::new(server_url, self.timeout)?))
    }
}

fn map_xmlrpc_error(err: xmlrpc::Error) -> ErpError {
    match err.fault() {
        Some(fault) => ErpError::Fault {
            code: fault.fault_code,
            message: fault.fault_string.clone(),
        },
        None => ErpError::transport(err.to_string()),
    }
}

fn int_value(value: i64) -> xmlrpc::Value {
    match i32::try_from(value) {
        Ok(small) => xmlrpc::Value::Int(small),
        Err(_) => xmlrpc::Value::Int64(value),
    }
}

/// Converts a JSON value to its XML-RPC form
pub fn to_xmlrpc(value: &Value) -> xmlrpc::Value {
    match value {
        Value::Null => xmlrpc::Value::Nil,
        Value::Bool(b) => xmlrpc::Value::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => int_value(i),
            None => xmlrpc::Value::Double(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => xmlrpc::Value::String(s.clone()),
        Value::Array(items) => xmlrpc::Value::Array(items.iter().map(to_xmlrpc).collect()),
        Value::Object(map) => xmlrpc::Value::Struct(
            map.iter()
                .map(|(k, v)| (k.clone(), to_xmlrpc(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

/// Converts an XML-RPC value to JSON
///
/// Non-finite doubles become `null`. Date-time and binary values are
/// rejected; the ERP sends both as strings over its external API.
pub fn from_xmlrpc(value: xmlrpc::Value) -> Result<Value, ErpError> {
    Ok(match value {
        xmlrpc::Value::Nil => Value::Null,
        xmlrpc::Value::Bool(b) => Value::Bool(b),
        xmlrpc::Value::Int(i) => Value::from(i),
        xmlrpc::Value::Int64(i) => Value::from(i),
        xmlrpc::Value::Double(d) => Number::from_f64(d).map(Value::Number).unwrap_or(Value::Null),
        xmlrpc::Value::String(s) => Value::String(s),
        xmlrpc::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(from_xmlrpc)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        xmlrpc::Value::Struct(members) => {
            let mut map = Map::with_capacity(members.len());
            for (key, member) in members {
                map.insert(key, from_xmlrpc(member)?);
            }
            Value::Object(map)
        }
        xmlrpc::Value::DateTime(_) => {
            return Err(ErpError::unexpected("dateTime.iso8601 values are not supported"))
        }
        xmlrpc::Value::Base64(_) => {
            return Err(ErpError::unexpected("base64 values are not supported"))
        }
    })
}
