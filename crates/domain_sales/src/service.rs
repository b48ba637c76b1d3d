//! Sales order service

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use core_kernel::{
    from_records, Domain, ErpPort, OrderId, PortError, SearchReadOptions,
};

use crate::model::{NewOrder, OrderFilter, SalesOrder, MODEL, ORDER_FIELDS};

/// Reads, creates and confirms sales orders through the ERP port
#[derive(Clone)]
pub struct SalesService {
    erp: Arc<dyn ErpPort>,
}

impl SalesService {
    pub fn new(erp: Arc<dyn ErpPort>) -> Self {
        Self { erp }
    }

    pub async fn search(&self, filter: &OrderFilter) -> Result<Vec<SalesOrder>, PortError> {
        let rows = self
            .erp
            .search_read(MODEL, filter.to_domain(), filter.options())
            .await;
        debug!(count = rows.len(), "Sales orders fetched");
        from_records(MODEL, rows)
    }

    /// # Errors
    ///
    /// Returns `PortError::NotFound` if no such order exists
    pub async fn get(&self, id: OrderId) -> Result<SalesOrder, PortError> {
        let rows = self
            .erp
            .search_read(
                MODEL,
                Domain::new().eq("id", id.get()),
                SearchReadOptions::new().fields(ORDER_FIELDS).limit(1),
            )
            .await;
        from_records::<SalesOrder>(MODEL, rows)?
            .into_iter()
            .next()
            .ok_or_else(|| PortError::not_found(MODEL, id.get()))
    }

    /// Creates a quotation with its lines
    pub async fn create(&self, order: &NewOrder) -> Result<OrderId, PortError> {
        let values = order.to_values()?;
        let id = self
            .erp
            .create(MODEL, values)
            .await
            .map(OrderId::from)
            .ok_or_else(|| PortError::internal("ERP did not create the sales order"))?;
        info!(order_id = %id, lines = order.lines.len(), "Quotation created");
        Ok(id)
    }

    /// Confirms a quotation into a sales order
    ///
    /// ERP failures are returned as-is, not collapsed.
    pub async fn confirm(&self, id: OrderId) -> Result<(), PortError> {
        let result = self
            .erp
            .execute(MODEL, "action_confirm", vec![Value::from(vec![id.get()])], None)
            .await?;
        info!(order_id = %id, result = %result, "Sales order confirmed");
        Ok(())
    }
}

impl std::fmt::Debug for SalesService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesService").finish_non_exhaustive()
    }
}
