//! Async ERP client
//!
//! `AsyncErpClient` holds one authenticated session against the ERP and
//! runs every call on its offload pool. Authentication is lazy and cached:
//! the first call logs in, later calls reuse the uid. The login runs as its
//! own task and every caller arriving meanwhile waits on that one attempt,
//! each within its own call timeout.
//!
//! # Error handling
//!
//! `execute` returns every failure to the caller. The convenience methods
//! (`search_read`, `create`, `write`, `unlink`) log failures and return an
//! empty or falsy result instead, which keeps call sites simple at the
//! cost of detail.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use core_kernel::{
    AdapterHealth, Domain, ErpPort, HealthCheckResult, HealthCheckable, IdList, PortError, Record,
    RecordId, SearchReadOptions,
};

use crate::error::ErpError;
use crate::pool::{OffloadPool, PoolConfig, PoolMetrics};
use crate::session::{AuthToken, ClientKey, ClientState, Credentials};
use crate::transport::{RpcCall, RpcTransport};

/// Result of one login attempt; `None` while it is still running
type LoginOutcome = Option<Option<AuthToken>>;

/// Authentication state shared with the running login task
#[derive(Debug, Default)]
struct Session {
    token: OnceLock<AuthToken>,
    state: AtomicU8,
    pending: Mutex<Option<watch::Receiver<LoginOutcome>>>,
}

impl Session {
    fn pending(&self) -> MutexGuard<'_, Option<watch::Receiver<LoginOutcome>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ClientState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }
}

/// Clears the pending slot when the login task ends, however it ends
struct PendingLogin(Arc<Session>);

impl Drop for PendingLogin {
    fn drop(&mut self) {
        self.0.pending().take();
    }
}

enum LoginTicket {
    Ready(AuthToken),
    Waiting(watch::Receiver<LoginOutcome>),
}

/// One login attempt, run as its own task
///
/// Callers only wait on it, so a caller that gives up does not cancel the
/// attempt for everyone else.
struct Login {
    key: ClientKey,
    credentials: Credentials,
    transport: Arc<dyn RpcTransport>,
    pool: Arc<OffloadPool>,
    session: Arc<Session>,
    timeout: Option<Duration>,
}

impl Login {
    async fn run(self) -> Option<AuthToken> {
        self.session.set_state(ClientState::Authenticating);

        let transport = Arc::clone(&self.transport);
        let database = self.key.database.clone();
        let username = self.key.username.clone();
        let password = self.credentials.password().to_string();

        let outcome = self
            .pool
            .run("common.authenticate", self.timeout, move || {
                transport.authenticate(&database, &username, &password, &Record::new())
            })
            .await;

        match outcome {
            Ok(Some(token)) => {
                let _ = self.session.token.set(token);
                self.session.set_state(ClientState::Authenticated);
                info!(key = %self.key, uid = token.uid(), "Authenticated against ERP");
                Some(token)
            }
            Ok(None) => {
                self.session.set_state(ClientState::AuthenticationFailed);
                warn!(key = %self.key, "ERP rejected the credentials");
                None
            }
            Err(err) => {
                self.session.set_state(ClientState::AuthenticationFailed);
                error!(key = %self.key, error = %err, "ERP authentication call failed");
                None
            }
        }
    }
}

/// One ERP session with its own offload pool
pub struct AsyncErpClient {
    key: ClientKey,
    credentials: Credentials,
    transport: Arc<dyn RpcTransport>,
    pool: Arc<OffloadPool>,
    session: Arc<Session>,
    call_timeout: Option<Duration>,
}

impl AsyncErpClient {
    /// Creates an unauthenticated client
    pub fn new(
        key: ClientKey,
        credentials: Credentials,
        transport: Arc<dyn RpcTransport>,
        pool: PoolConfig,
        call_timeout: Option<Duration>,
    ) -> Self {
        Self {
            key,
            credentials,
            transport,
            pool: Arc::new(OffloadPool::new(pool)),
            session: Arc::new(Session::default()),
            call_timeout,
        }
    }

    pub fn key(&self) -> &ClientKey {
        &self.key
    }

    pub fn state(&self) -> ClientState {
        ClientState::from_u8(self.session.state.load(Ordering::Acquire))
    }

    /// The cached uid, if authenticated
    pub fn uid(&self) -> Option<AuthToken> {
        self.session.token.get().copied()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.token.get().is_some()
    }

    pub fn pool_metrics(&self) -> PoolMetrics {
        self.pool.metrics()
    }

    /// Returns the cached uid or logs in
    ///
    /// Concurrent callers share one in-flight login and all receive its
    /// outcome, success or failure. A failed login is not cached; the next
    /// call tries again. Never fails: rejection and transport errors are
    /// logged and yield `None`.
    pub async fn authenticate(&self) -> Option<AuthToken> {
        if let Some(token) = self.session.token.get() {
            return Some(*token);
        }

        let mut outcome = match self.join_login() {
            LoginTicket::Ready(token) => return Some(token),
            LoginTicket::Waiting(outcome) => outcome,
        };
        let token = match outcome.wait_for(Option::is_some).await {
            Ok(done) => (*done).flatten(),
            Err(_) => None,
        };
        token
    }

    /// Subscribes to the running login, starting one if there is none
    fn join_login(&self) -> LoginTicket {
        let mut pending = self.session.pending();
        if let Some(token) = self.session.token.get() {
            return LoginTicket::Ready(*token);
        }
        if let Some(outcome) = pending.as_ref() {
            return LoginTicket::Waiting(outcome.clone());
        }

        let (sender, outcome) = watch::channel(None);
        *pending = Some(outcome.clone());

        let login = Login {
            key: self.key.clone(),
            credentials: self.credentials.clone(),
            transport: Arc::clone(&self.transport),
            pool: Arc::clone(&self.pool),
            session: Arc::clone(&self.session),
            timeout: self.call_timeout,
        };
        let finished = PendingLogin(Arc::clone(&self.session));
        tokio::spawn(async move {
            let token = login.run().await;
            drop(finished);
            sender.send_replace(Some(token));
        });

        LoginTicket::Waiting(outcome)
    }

    fn authentication_error(&self) -> ErpError {
        ErpError::Authentication {
            database: self.key.database.clone(),
            username: self.key.username.clone(),
        }
    }

    /// Invokes `method` on `model` with the default call timeout
    ///
    /// The timeout covers the implicit login as well as the call itself.
    ///
    /// # Errors
    ///
    /// Returns `ErpError::Authentication` without calling the ERP if no
    /// session can be established, otherwise whatever the call produced.
    pub async fn execute(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Option<Map<String, Value>>,
    ) -> Result<Value, ErpError> {
        self.dispatch(RpcCall::new(model, method, args, kwargs), self.call_timeout)
            .await
    }

    /// Like `execute`, but gives up after `timeout` with `ErpError::Timeout`
    pub async fn execute_with_timeout(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Option<Map<String, Value>>,
        timeout: Duration,
    ) -> Result<Value, ErpError> {
        self.dispatch(RpcCall::new(model, method, args, kwargs), Some(timeout))
            .await
    }

    async fn dispatch(&self, call: RpcCall, timeout: Option<Duration>) -> Result<Value, ErpError> {
        let operation = call.operation();
        let started = Instant::now();

        let uid = match timeout {
            Some(limit) => match tokio::time::timeout(limit, self.authenticate()).await {
                Ok(uid) => uid,
                Err(_) => {
                    warn!(key = %self.key, operation = %operation, "ERP login did not finish within the call timeout");
                    return Err(ErpError::Timeout {
                        operation,
                        duration_ms: limit.as_millis() as u64,
                    });
                }
            },
            None => self.authenticate().await,
        }
        .ok_or_else(|| self.authentication_error())?;

        let remaining = timeout.map(|limit| limit.saturating_sub(started.elapsed()));
        let transport = Arc::clone(&self.transport);
        let database = self.key.database.clone();
        let password = self.credentials.password().to_string();

        let result = self
            .pool
            .run(&operation, remaining, move || {
                transport.invoke(&database, uid, &password, &call)
            })
            .await
            .map_err(|err| match (err, timeout) {
                (ErpError::Timeout { operation, .. }, Some(limit)) => ErpError::Timeout {
                    operation,
                    duration_ms: limit.as_millis() as u64,
                },
                (err, _) => err,
            });

        match &result {
            Ok(_) => debug!(
                operation = %operation,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "ERP call completed"
            ),
            Err(err) => error!(key = %self.key, operation = %operation, error = %err, "ERP call failed"),
        }
        result
    }

    /// Searches `model` and reads the matching rows; `[]` on any failure
    pub async fn search_read(
        &self,
        model: &str,
        domain: Domain,
        options: SearchReadOptions,
    ) -> Vec<Record> {
        let kwargs = options.to_kwargs();
        match self
            .execute(model, "search_read", vec![domain.into()], Some(kwargs))
            .await
        {
            Ok(Value::Array(rows)) => rows
                .into_iter()
                .filter_map(|row| match row {
                    Value::Object(record) => Some(record),
                    _ => None,
                })
                .collect(),
            Ok(other) => {
                warn!(model, response = %other, "search_read returned a non-list, returning no records");
                Vec::new()
            }
            Err(err) => {
                warn!(model, error = %err, "search_read failed, returning no records");
                Vec::new()
            }
        }
    }

    /// Creates a record and returns its id; `None` on any failure
    pub async fn create(&self, model: &str, values: Record) -> Option<RecordId> {
        match self
            .execute(model, "create", vec![Value::Object(values)], None)
            .await
        {
            Ok(value) => {
                let id = RecordId::from_value(&value);
                if id.is_none() {
                    warn!(model, response = %value, "create returned no record id");
                }
                id
            }
            Err(err) => {
                warn!(model, error = %err, "create failed");
                None
            }
        }
    }

    /// Updates `ids` with `values`; `false` on any failure
    ///
    /// A single id and a list of ids are sent identically.
    pub async fn write(&self, model: &str, ids: impl Into<IdList>, values: Record) -> bool {
        let ids = ids.into();
        let args = vec![ids.to_value(), Value::Object(values)];
        self.expect_true(model, "write", args).await
    }

    /// Deletes `ids`; `false` on any failure
    pub async fn unlink(&self, model: &str, ids: impl Into<IdList>) -> bool {
        let ids = ids.into();
        self.expect_true(model, "unlink", vec![ids.to_value()]).await
    }

    async fn expect_true(&self, model: &str, method: &str, args: Vec<Value>) -> bool {
        match self.execute(model, method, args, None).await {
            Ok(Value::Bool(done)) => done,
            Ok(other) => {
                warn!(model, method, response = %other, "Unexpected response, treating as failure");
                false
            }
            Err(err) => {
                warn!(model, method, error = %err, "ERP call failed");
                false
            }
        }
    }

    /// Calls the ERP's `version` endpoint through the pool
    pub async fn server_version(&self) -> Result<Value, ErpError> {
        let transport = Arc::clone(&self.transport);
        self.pool
            .run("common.version", self.call_timeout, move || transport.version())
            .await
    }

    /// Stops accepting calls
    ///
    /// Calls already running are not waited for; queued and later calls
    /// fail with `ErpError::PoolClosed`.
    pub fn close(&self) {
        self.pool.close();
        info!(key = %self.key, "ERP client closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

impl fmt::Debug for AsyncErpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncErpClient")
            .field("key", &self.key)
            .field("state", &self.state())
            .field("pool", &self.pool.metrics())
            .finish()
    }
}

#[async_trait]
impl ErpPort for AsyncErpClient {
    async fn execute(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Option<Map<String, Value>>,
    ) -> Result<Value, PortError> {
        AsyncErpClient::execute(self, model, method, args, kwargs)
            .await
            .map_err(PortError::from)
    }

    async fn search_read(&self, model: &str, domain: Domain, options: SearchReadOptions) -> Vec<Record> {
        AsyncErpClient::search_read(self, model, domain, options).await
    }

    async fn create(&self, model: &str, values: Record) -> Option<RecordId> {
        AsyncErpClient::create(self, model, values).await
    }

    async fn write(&self, model: &str, ids: IdList, values: Record) -> bool {
        AsyncErpClient::write(self, model, ids, values).await
    }

    async fn unlink(&self, model: &str, ids: IdList) -> bool {
        AsyncErpClient::unlink(self, model, ids).await
    }
}

#[async_trait]
impl HealthCheckable for AsyncErpClient {
    async fn health_check(&self) -> HealthCheckResult {
        let started = Instant::now();
        let outcome = self.server_version().await;
        let latency_ms = started.elapsed().as_millis() as u64;
        let metrics = self.pool.metrics();

        let (status, message) = match outcome {
            Ok(_) if metrics.queued > 0 => (
                AdapterHealth::Degraded,
                Some(format!("{} calls waiting for a worker", metrics.queued)),
            ),
            Ok(version) => (
                AdapterHealth::Healthy,
                version
                    .get("server_version")
                    .and_then(Value::as_str)
                    .map(|v| format!("server version {v}")),
            ),
            Err(err) => (AdapterHealth::Unhealthy, Some(err.to_string())),
        };

        HealthCheckResult {
            adapter_id: format!("erp:{}", self.key),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}
