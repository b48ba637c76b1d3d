//! Ticket DTOs

use serde::{Deserialize, Serialize};

use core_kernel::{TaxId, TeamId};
use domain_helpdesk::{Ticket, TicketFilter};

use crate::dto::non_blank;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct TicketQuery {
    pub tax_id: Option<String>,
    pub team_id: Option<i64>,
    pub include_closed: Option<bool>,
}

impl TicketQuery {
    /// # Errors
    ///
    /// `BadRequest` when `tax_id` is missing or malformed
    pub fn into_filter(self) -> Result<TicketFilter, ApiError> {
        let raw = non_blank(self.tax_id)
            .ok_or_else(|| ApiError::BadRequest("tax_id is required".to_string()))?;
        let mut filter = TicketFilter::new(TaxId::parse(&raw)?)
            .include_closed(self.include_closed.unwrap_or(false));
        if let Some(team_id) = self.team_id {
            filter = filter.team(TeamId::new(team_id));
        }
        Ok(filter)
    }
}

#[derive(Debug, Serialize)]
pub struct TicketsResponse {
    pub tickets: Vec<Ticket>,
}
