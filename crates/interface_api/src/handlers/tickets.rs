//! Ticket handlers

use axum::{
    extract::{Query, State},
    Json,
};

use domain_helpdesk::HelpdeskService;

use crate::dto::ticket::*;
use crate::error::ApiError;
use crate::handlers::{erp_session, non_empty};
use crate::AppState;

/// Lists the tickets of one customer
pub async fn list_tickets(
    State(state): State<AppState>,
    Query(query): Query<TicketQuery>,
) -> Result<Json<TicketsResponse>, ApiError> {
    let filter = query.into_filter()?;
    let tickets = HelpdeskService::new(erp_session(&state).await?)
        .find_by_tax_id(&filter)
        .await?;
    Ok(Json(TicketsResponse {
        tickets: non_empty(tickets)?,
    }))
}
