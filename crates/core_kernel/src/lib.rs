//! Core Kernel - Foundational types for the ERP gateway
//!
//! This crate provides the building blocks shared by the ERP adapter, the
//! domain services and the HTTP layer:
//! - Typed record identifiers and normalized id lists
//! - Search domains and `search_read` options
//! - Tax identifier parsing
//! - Serde helpers for the ERP's payload quirks
//! - The `ErpPort` trait and the `PortError` every service returns

pub mod identifiers;
pub mod query;
pub mod tax_id;
pub mod erp_serde;
pub mod money;
pub mod temporal;
pub mod ports;
pub mod error;

pub use identifiers::{
    RecordId, IdList, PartnerId, LeadId, TicketId, TeamId, OrderId,
    ProductId, TaskId, ProjectId, UserId,
};
pub use query::{Domain, Operator, Record, SearchReadOptions, Command};
pub use tax_id::{TaxId, TaxIdKind};
pub use erp_serde::{Many2One, from_record, from_records};
pub use money::Money;
pub use ports::{ErpPort, PortError, HealthCheckable, HealthCheckResult, AdapterHealth};
pub use error::CoreError;
