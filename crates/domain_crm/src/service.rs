//! CRM service

use std::sync::Arc;
use tracing::debug;

use core_kernel::{
    from_records, Domain, ErpPort, LeadId, PartnerId, PortError, RecordId, SearchReadOptions, TaxId,
};

use crate::model::{Lead, LeadFilter, NewLead, MODEL};

const PARTNER_MODEL: &str = "res.partner";

/// Searches and creates CRM leads through the ERP port
#[derive(Clone)]
pub struct CrmService {
    erp: Arc<dyn ErpPort>,
}

impl CrmService {
    pub fn new(erp: Arc<dyn ErpPort>) -> Self {
        Self { erp }
    }

    pub async fn search(&self, filter: &LeadFilter) -> Result<Vec<Lead>, PortError> {
        let rows = self
            .erp
            .search_read(MODEL, filter.to_domain(), filter.options())
            .await;
        debug!(count = rows.len(), "Leads fetched");
        from_records(MODEL, rows)
    }

    /// Creates a lead
    ///
    /// When only a tax id is given, the lead is linked to the partner
    /// registered under it, if any.
    pub async fn create(&self, lead: &NewLead) -> Result<LeadId, PortError> {
        let mut values = lead.to_values()?;

        if lead.partner_id.is_none() {
            if let Some(tax_id) = &lead.tax_id {
                match self.resolve_partner(tax_id).await {
                    Some(partner) => {
                        values.insert("partner_id".to_string(), partner.into());
                    }
                    None => debug!(tax_id = %tax_id, "No partner registered for tax id"),
                }
            }
        }

        self.erp
            .create(MODEL, values)
            .await
            .map(LeadId::from)
            .ok_or_else(|| PortError::internal("ERP did not create the lead"))
    }

    async fn resolve_partner(&self, tax_id: &TaxId) -> Option<PartnerId> {
        let rows = self
            .erp
            .search_read(
                PARTNER_MODEL,
                Domain::new().eq("vat", tax_id.digits()),
                SearchReadOptions::new().fields(&["id"]).limit(1),
            )
            .await;
        rows.first()
            .and_then(|row| row.get("id"))
            .and_then(RecordId::from_value)
            .map(PartnerId::from)
    }
}

impl std::fmt::Debug for CrmService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrmService").finish_non_exhaustive()
    }
}
