//! Company service

use std::sync::Arc;
use tracing::debug;

use core_kernel::{from_records, Domain, ErpPort, PartnerId, PortError, SearchReadOptions, TaxId};

use crate::model::{Company, CompanyFilter, CompanyUpdate, NewCompany, COMPANY_FIELDS, MODEL};

/// Reads and writes companies through the ERP port
#[derive(Clone)]
pub struct PartnerService {
    erp: Arc<dyn ErpPort>,
}

impl PartnerService {
    pub fn new(erp: Arc<dyn ErpPort>) -> Self {
        Self { erp }
    }

    /// Lists companies matching `filter`; empty when the ERP is unavailable
    pub async fn search(&self, filter: &CompanyFilter) -> Result<Vec<Company>, PortError> {
        let rows = self
            .erp
            .search_read(MODEL, filter.to_domain(), filter.options())
            .await;
        debug!(count = rows.len(), "Companies fetched");
        from_records(MODEL, rows)
    }

    /// Counts companies matching `filter`, ignoring pagination
    pub async fn count(&self, filter: &CompanyFilter) -> Result<u64, PortError> {
        let result = self
            .erp
            .execute(MODEL, "search_count", vec![filter.to_domain().into()], None)
            .await?;
        result.as_u64().ok_or_else(|| PortError::Transformation {
            message: format!("search_count returned {}", result),
        })
    }

    /// Fetches one company
    ///
    /// # Errors
    ///
    /// Returns `PortError::NotFound` if no such partner exists
    pub async fn get(&self, id: PartnerId) -> Result<Company, PortError> {
        let rows = self
            .erp
            .search_read(
                MODEL,
                Domain::new().eq("id", id.get()),
                SearchReadOptions::new().fields(COMPANY_FIELDS).limit(1),
            )
            .await;
        from_records::<Company>(MODEL, rows)?
            .into_iter()
            .next()
            .ok_or_else(|| PortError::not_found(MODEL, id.get()))
    }

    /// Finds companies registered under `tax_id`
    pub async fn find_by_tax_id(&self, tax_id: &TaxId) -> Result<Vec<Company>, PortError> {
        let rows = self
            .erp
            .search_read(
                MODEL,
                Domain::new().eq("vat", tax_id.digits()),
                SearchReadOptions::new().fields(COMPANY_FIELDS),
            )
            .await;
        debug!(tax_id = %tax_id, count = rows.len(), "Companies looked up by tax id");
        from_records(MODEL, rows)
    }

    pub async fn create(&self, company: &NewCompany) -> Result<PartnerId, PortError> {
        let values = company.to_values()?;
        self.erp
            .create(MODEL, values)
            .await
            .map(PartnerId::from)
            .ok_or_else(|| PortError::internal("ERP did not create the company"))
    }

    pub async fn update(&self, id: PartnerId, update: &CompanyUpdate) -> Result<(), PortError> {
        let values = update.to_values()?;
        if self.erp.write(MODEL, id.into(), values).await {
            Ok(())
        } else {
            Err(PortError::internal(format!("ERP did not update {}", id)))
        }
    }

    pub async fn delete(&self, id: PartnerId) -> Result<(), PortError> {
        if self.erp.unlink(MODEL, id.into()).await {
            Ok(())
        } else {
            Err(PortError::internal(format!("ERP did not delete {}", id)))
        }
    }
}

impl std::fmt::Debug for PartnerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartnerService").finish_non_exhaustive()
    }
}
