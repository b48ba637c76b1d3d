//! Infrastructure ERP Layer
//!
//! This crate connects the gateway to the ERP's XML-RPC API.
//!
//! # Architecture
//!
//! - `transport`: the blocking `RpcTransport` trait and its factory
//! - `xml_rpc`: the XML-RPC over HTTP implementation
//! - `pool`: bounded offload of blocking calls onto the runtime's blocking threads
//! - `client`: `AsyncErpClient`, one cached session plus CRUD helpers
//! - `registry`: one client per `(server, database, username)`
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_erp::{ClientRegistry, ErpConfig};
//!
//! let registry = ClientRegistry::with_xmlrpc(ErpConfig::new(
//!     "https://erp.example.com", "prod", "api", "secret",
//! ));
//! let client = registry.default_client().await?;
//! let uid = client.authenticate().await;
//! ```

pub mod config;
pub mod error;
pub mod session;
pub mod transport;
pub mod xml_rpc;
pub mod pool;
pub mod client;
pub mod registry;

pub use config::ErpConfig;
pub use error::ErpError;
pub use session::{AuthToken, ClientKey, ClientState, Credentials};
pub use transport::{RpcCall, RpcTransport, TransportFactory};
pub use xml_rpc::{XmlRpcTransport, XmlRpcTransportFactory};
pub use pool::{OffloadPool, PoolConfig, PoolMetrics};
pub use client::AsyncErpClient;
pub use registry::ClientRegistry;
