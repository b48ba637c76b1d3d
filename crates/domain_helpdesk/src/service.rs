//! Ticket service

use std::sync::Arc;
use tracing::debug;

use core_kernel::{from_records, ErpPort, PortError};

use crate::model::{Ticket, TicketFilter, MODEL};

/// Reads helpdesk tickets through the ERP port
#[derive(Clone)]
pub struct HelpdeskService {
    erp: Arc<dyn ErpPort>,
}

impl HelpdeskService {
    pub fn new(erp: Arc<dyn ErpPort>) -> Self {
        Self { erp }
    }

    /// Tickets of the customer registered under the filter's tax id,
    /// newest first
    pub async fn find_by_tax_id(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, PortError> {
        let rows = self
            .erp
            .search_read(MODEL, filter.to_domain(), filter.options())
            .await;
        debug!(
            count = rows.len(),
            include_closed = filter.include_closed,
            "Tickets fetched"
        );
        from_records(MODEL, rows)
    }
}

impl std::fmt::Debug for HelpdeskService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelpdeskService").finish_non_exhaustive()
    }
}
