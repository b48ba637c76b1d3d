//! Partner Domain
//!
//! Companies registered in the ERP as `res.partner` rows. The service
//! lists, looks up (by id or Brazilian tax id), creates, updates and
//! deletes companies through the `ErpPort`, and hands back typed
//! `Company` values that serialize with the gateway's field labels.

pub mod model;
pub mod service;

pub use model::{Company, CompanyFilter, CompanyUpdate, NewCompany};
pub use service::PartnerService;
