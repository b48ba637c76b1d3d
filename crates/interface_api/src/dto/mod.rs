//! Request and response bodies
//!
//! Request DTOs are validated with `validator` before they reach a domain
//! service. Response wrappers name the collection they carry, e.g.
//! `{"companies": [...]}`.

pub mod company;
pub mod lead;
pub mod order;
pub mod ticket;
pub mod task;

use serde::{Deserialize, Serialize};

/// Body of a successful create
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatedResponse {
    pub updated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmedResponse {
    pub confirmed: bool,
}

/// Trims a query parameter, treating a blank one as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
