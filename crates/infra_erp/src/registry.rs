//! ERP client registry
//!
//! Keeps at most one `AsyncErpClient` per `(server, database, username)`.
//! The registry is built by the composition root and shared through
//! application state; nothing here is global.
//!
//! # Concurrency
//!
//! Each key maps to a once-cell. The first lookup for a key constructs and
//! authenticates the client while concurrent lookups for the same key wait
//! on that cell, so a burst of first requests produces one session.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_erp::{ClientRegistry, ErpConfig};
//!
//! let registry = ClientRegistry::with_xmlrpc(ErpConfig::new(url, db, user, password));
//! let client = registry.default_client().await?;
//! let partners = client.search_read("res.partner", Domain::new(), SearchReadOptions::new()).await;
//!
//! registry.shutdown();
//! ```

use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::client::AsyncErpClient;
use crate::config::ErpConfig;
use crate::error::ErpError;
use crate::session::{ClientKey, Credentials};
use crate::transport::TransportFactory;
use crate::xml_rpc::XmlRpcTransportFactory;

type ClientCell = Arc<OnceCell<Arc<AsyncErpClient>>>;

/// Registry of live ERP clients
pub struct ClientRegistry {
    config: ErpConfig,
    factory: Arc<dyn TransportFactory>,
    clients: DashMap<ClientKey, ClientCell>,
    closed: AtomicBool,
}

impl ClientRegistry {
    /// Creates an empty registry
    ///
    /// `config` names the default session and supplies the pool and
    /// timeout settings of every client the registry builds.
    pub fn new(config: ErpConfig, factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            config,
            factory,
            clients: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Creates a registry that talks XML-RPC over HTTP
    pub fn with_xmlrpc(config: ErpConfig) -> Self {
        let factory = Arc::new(XmlRpcTransportFactory::new(config.call_timeout));
        Self::new(config, factory)
    }

    pub fn config(&self) -> &ErpConfig {
        &self.config
    }

    /// Returns the client for `key`, building and authenticating it first
    /// if needed
    ///
    /// A client whose authentication failed is still registered; its next
    /// call tries again. `credentials` are only used when the client is
    /// built.
    ///
    /// # Errors
    ///
    /// - `RegistryClosed` after `shutdown`
    /// - `Configuration` if no transport can be built for the server URL
    pub async fn get_or_create(
        &self,
        key: &ClientKey,
        credentials: &Credentials,
    ) -> Result<Arc<AsyncErpClient>, ErpError> {
        self.ensure_open()?;

        let cell = Arc::clone(
            self.clients
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .value(),
        );

        let client = cell
            .get_or_try_init(|| self.build(key, credentials))
            .await
            .map(Arc::clone)?;

        // shutdown may have run while the client was being built
        if self.closed.load(Ordering::Acquire) {
            client.close();
            return Err(ErpError::RegistryClosed);
        }
        Ok(client)
    }

    /// Returns the client for the configured default session
    pub async fn default_client(&self) -> Result<Arc<AsyncErpClient>, ErpError> {
        let key = self.config.client_key();
        self.get_or_create(&key, &self.config.credentials).await
    }

    /// Returns the client for `key` if one has been built
    pub fn get(&self, key: &ClientKey) -> Option<Arc<AsyncErpClient>> {
        self.clients
            .get(key)
            .and_then(|cell| cell.value().get().cloned())
    }

    /// Number of built clients
    pub fn len(&self) -> usize {
        self.clients
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Closes every client and rejects further lookups
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut closed = 0usize;
        for entry in self.clients.iter() {
            if let Some(client) = entry.value().get() {
                client.close();
                closed += 1;
            }
        }
        self.clients.clear();
        info!(clients = closed, "ERP client registry shut down");
    }

    fn ensure_open(&self) -> Result<(), ErpError> {
        if self.closed.load(Ordering::Acquire) {
            Err(ErpError::RegistryClosed)
        } else {
            Ok(())
        }
    }

    async fn build(
        &self,
        key: &ClientKey,
        credentials: &Credentials,
    ) -> Result<Arc<AsyncErpClient>, ErpError> {
        let transport = self.factory.connect(&key.server_url)?;
        let client = Arc::new(AsyncErpClient::new(
            key.clone(),
            credentials.clone(),
            transport,
            self.config.pool_config(),
            self.config.call_timeout,
        ));

        match client.authenticate().await {
            Some(token) => info!(key = %key, uid = token.uid(), "ERP client registered"),
            None => warn!(key = %key, "ERP client registered without a session, next call retries"),
        }
        Ok(client)
    }
}

impl fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("default_key", &self.config.client_key())
            .field("clients", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
