//! Lead handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use domain_crm::{CrmService, NewLead};

use crate::auth::{permissions, require_role, Claims};
use crate::dto::lead::*;
use crate::dto::CreatedResponse;
use crate::error::ApiError;
use crate::handlers::{erp_session, non_empty};
use crate::AppState;

pub async fn list_leads(
    State(state): State<AppState>,
    Query(query): Query<LeadQuery>,
) -> Result<Json<LeadsResponse>, ApiError> {
    query.validate()?;
    let filter = query.into_filter()?;
    let leads = CrmService::new(erp_session(&state).await?)
        .search(&filter)
        .await?;
    Ok(Json(LeadsResponse {
        leads: non_empty(leads)?,
    }))
}

pub async fn create_lead(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    require_role(&claims, permissions::ERP_WRITE)?;
    request.validate()?;
    let lead = NewLead::try_from(request)?;

    let id = CrmService::new(erp_session(&state).await?)
        .create(&lead)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: id.get() })))
}
