//! Scriptable In-Memory ERP
//!
//! `MockTransport` implements `RpcTransport` without a network. Tests
//! script the authentication outcome and the reply of each
//! `(model, method)` pair, then inspect the calls the client made.
//!
//! # Example
//!
//! ```rust,ignore
//! let transport = Arc::new(
//!     MockTransport::new()
//!         .respond("res.partner", "search_read", json!([{"id": 1, "name": "Acme"}])),
//! );
//! let client = ErpFixtures::client(Arc::clone(&transport));
//!
//! client.search_read("res.partner", Domain::new(), SearchReadOptions::new()).await;
//! assert_eq!(transport.invoke_count(), 1);
//! ```

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use core_kernel::Record;
use infra_erp::{AuthToken, ErpError, RpcCall, RpcTransport, TransportFactory};

use crate::fixtures::TEST_UID;

/// Model name that matches every model in a scripted reply
pub const ANY_MODEL: &str = "*";

/// How the mock answers `common.authenticate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthBehavior {
    /// Accept the credentials with this uid
    Uid(i64),
    /// Answer `false`
    Reject,
    /// Fail as if the endpoint were unreachable
    ConnectionError(String),
}

/// A scripted answer to `execute_kw`
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    Value(Value),
    Fault { code: i32, message: String },
    ConnectionError(String),
}

impl MockReply {
    fn into_result(self) -> Result<Value, ErpError> {
        match self {
            MockReply::Value(value) => Ok(value),
            MockReply::Fault { code, message } => Err(ErpError::Fault { code, message }),
            MockReply::ConnectionError(message) => Err(ErpError::transport(message)),
        }
    }
}

#[derive(Debug)]
struct MockState {
    auth: AuthBehavior,
    replies: HashMap<(String, String), MockReply>,
    fallback: Option<MockReply>,
    version: Value,
    latency: Duration,
    calls: Vec<RpcCall>,
    auth_contexts: Vec<(String, String)>,
}

/// In-memory stand-in for an ERP server
#[derive(Debug)]
pub struct MockTransport {
    state: Mutex<MockState>,
    auth_calls: AtomicUsize,
    version_calls: AtomicUsize,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// A mock that accepts any credentials as uid 7 and has no scripted replies
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                auth: AuthBehavior::Uid(TEST_UID),
                replies: HashMap::new(),
                fallback: None,
                version: json!({"server_version": "17.0", "protocol_version": 1}),
                latency: Duration::ZERO,
                calls: Vec::new(),
                auth_contexts: Vec::new(),
            }),
            auth_calls: AtomicUsize::new(0),
            version_calls: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accepts credentials with `uid`
    pub fn with_uid(self, uid: i64) -> Self {
        self.set_authentication(AuthBehavior::Uid(uid));
        self
    }

    /// Answers `false` to every authentication
    pub fn rejecting_credentials(self) -> Self {
        self.set_authentication(AuthBehavior::Reject);
        self
    }

    /// Fails every authentication with a connection error
    pub fn unreachable_auth(self, message: impl Into<String>) -> Self {
        self.set_authentication(AuthBehavior::ConnectionError(message.into()));
        self
    }

    /// Sleeps this long inside every blocking call
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = latency;
        self
    }

    /// Scripts the value returned for `(model, method)`
    ///
    /// Use `ANY_MODEL` to match the method on every model.
    pub fn respond(self, model: &str, method: &str, value: Value) -> Self {
        self.script(model, method, MockReply::Value(value));
        self
    }

    /// Scripts an XML-RPC fault for `(model, method)`
    pub fn fault(self, model: &str, method: &str, code: i32, message: impl Into<String>) -> Self {
        self.script(
            model,
            method,
            MockReply::Fault {
                code,
                message: message.into(),
            },
        );
        self
    }

    /// Scripts a connection error for `(model, method)`
    pub fn connection_error(self, model: &str, method: &str, message: impl Into<String>) -> Self {
        self.script(model, method, MockReply::ConnectionError(message.into()));
        self
    }

    /// Answers every unscripted call with a connection error
    pub fn failing_all_calls(self, message: impl Into<String>) -> Self {
        self.lock().fallback = Some(MockReply::ConnectionError(message.into()));
        self
    }

    /// Changes the authentication outcome of later calls
    pub fn set_authentication(&self, behavior: AuthBehavior) {
        self.lock().auth = behavior;
    }

    /// Adds or replaces a scripted reply
    pub fn script(&self, model: &str, method: &str, reply: MockReply) {
        self.lock()
            .replies
            .insert((model.to_string(), method.to_string()), reply);
    }

    /// Number of `common.authenticate` calls received
    pub fn auth_count(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    /// Number of `object.execute_kw` calls received
    pub fn invoke_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn version_count(&self) -> usize {
        self.version_calls.load(Ordering::SeqCst)
    }

    /// Every `execute_kw` call in arrival order
    pub fn calls(&self) -> Vec<RpcCall> {
        self.lock().calls.clone()
    }

    pub fn last_call(&self) -> Option<RpcCall> {
        self.lock().calls.last().cloned()
    }

    /// Calls of `method` on any model
    pub fn calls_for(&self, method: &str) -> Vec<RpcCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }

    /// `(database, username)` of every authentication attempt
    pub fn auth_attempts(&self) -> Vec<(String, String)> {
        self.lock().auth_contexts.clone()
    }

    fn latency(&self) -> Duration {
        self.lock().latency
    }

    fn reply_for(&self, call: &RpcCall) -> MockReply {
        let state = self.lock();
        state
            .replies
            .get(&(call.model.clone(), call.method.clone()))
            .or_else(|| state.replies.get(&(ANY_MODEL.to_string(), call.method.clone())))
            .or(state.fallback.as_ref())
            .cloned()
            .unwrap_or_else(|| MockReply::Fault {
                code: 2,
                message: format!("no scripted reply for {}", call.operation()),
            })
    }
}

impl RpcTransport for MockTransport {
    fn version(&self) -> Result<Value, ErpError> {
        self.version_calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.latency());
        Ok(self.lock().version.clone())
    }

    fn authenticate(
        &self,
        database: &str,
        username: &str,
        _password: &str,
        _context: &Record,
    ) -> Result<Option<AuthToken>, ErpError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.latency());

        let mut state = self.lock();
        state
            .auth_contexts
            .push((database.to_string(), username.to_string()));
        match &state.auth {
            AuthBehavior::Uid(uid) => Ok(AuthToken::new(*uid)),
            AuthBehavior::Reject => Ok(None),
            AuthBehavior::ConnectionError(message) => Err(ErpError::transport(message.clone())),
        }
    }

    fn invoke(
        &self,
        _database: &str,
        _uid: AuthToken,
        _password: &str,
        call: &RpcCall,
    ) -> Result<Value, ErpError> {
        self.lock().calls.push(call.clone());
        std::thread::sleep(self.latency());
        self.reply_for(call).into_result()
    }
}

/// Factory that hands out one shared `MockTransport`
#[derive(Debug)]
pub struct MockTransportFactory {
    transport: Arc<MockTransport>,
    connects: AtomicUsize,
    failure: Option<String>,
}

impl MockTransportFactory {
    pub fn new(transport: Arc<MockTransport>) -> Self {
        Self {
            transport,
            connects: AtomicUsize::new(0),
            failure: None,
        }
    }

    /// A factory whose `connect` always fails with a configuration error
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            transport: Arc::new(MockTransport::new()),
            connects: AtomicUsize::new(0),
            failure: Some(message.into()),
        }
    }

    /// Number of transports built so far
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn transport(&self) -> Arc<MockTransport> {
        Arc::clone(&self.transport)
    }
}

impl TransportFactory for MockTransportFactory {
    fn connect(&self, _server_url: &str) -> Result<Arc<dyn RpcTransport>, ErpError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(ErpError::Configuration(message.clone())),
            None => Ok(Arc::clone(&self.transport) as Arc<dyn RpcTransport>),
        }
    }
}
