//! Request handlers
//!
//! Every ERP-backed handler starts from the registry's default client and
//! refuses to go on without an ERP session.

pub mod companies;
pub mod health;
pub mod leads;
pub mod orders;
pub mod tasks;
pub mod tickets;

use std::sync::Arc;

use core_kernel::ErpPort;

use crate::error::ApiError;
use crate::AppState;

/// The default ERP client, authenticated
///
/// # Errors
///
/// `Unauthorized` when the ERP rejects the configured credentials or cannot
/// be reached to check them.
pub(crate) async fn erp_session(state: &AppState) -> Result<Arc<dyn ErpPort>, ApiError> {
    let client = state.registry.default_client().await?;
    if client.authenticate().await.is_none() {
        return Err(ApiError::Unauthorized(format!(
            "ERP authentication failed for {}",
            client.key()
        )));
    }
    let erp: Arc<dyn ErpPort> = client;
    Ok(erp)
}

/// 404 for an empty result, the rows otherwise
pub(crate) fn non_empty<T>(rows: Vec<T>) -> Result<Vec<T>, ApiError> {
    if rows.is_empty() {
        Err(ApiError::no_data())
    } else {
        Ok(rows)
    }
}
