//! CRM Domain
//!
//! Leads and opportunities (`crm.lead`). Leads can be searched by
//! customer tax id, stage and type, and created with the customer
//! resolved from its tax id.

pub mod model;
pub mod service;

pub use model::{Lead, LeadFilter, LeadType, NewLead};
pub use service::CrmService;
