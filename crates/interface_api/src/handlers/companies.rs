//! Company handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;
use validator::Validate;

use core_kernel::{PartnerId, TaxId};
use domain_partner::{CompanyUpdate, NewCompany, PartnerService};

use crate::auth::{permissions, require_role, Claims};
use crate::dto::company::*;
use crate::dto::{CreatedResponse, DeletedResponse, UpdatedResponse};
use crate::error::ApiError;
use crate::handlers::{erp_session, non_empty};
use crate::AppState;

async fn service(state: &AppState) -> Result<PartnerService, ApiError> {
    Ok(PartnerService::new(erp_session(state).await?))
}

/// Lists companies with the total match count
pub async fn list_companies(
    State(state): State<AppState>,
    Query(query): Query<CompanyQuery>,
) -> Result<Json<CompaniesResponse>, ApiError> {
    query.validate()?;
    let filter = query.into_filter()?;
    let service = service(&state).await?;

    let companies = non_empty(service.search(&filter).await?)?;
    let total = service.count(&filter).await?;

    Ok(Json(CompaniesResponse {
        companies,
        total: Some(total),
    }))
}

/// Gets a company by ID
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CompaniesResponse>, ApiError> {
    let company = service(&state).await?.get(PartnerId::new(id)).await?;
    Ok(Json(CompaniesResponse {
        companies: vec![company],
        total: None,
    }))
}

/// Looks a company up by CPF/CNPJ, masked or bare
pub async fn get_company_by_tax_id(
    State(state): State<AppState>,
    Path(tax_id): Path<String>,
) -> Result<Json<CompaniesResponse>, ApiError> {
    let tax_id = TaxId::parse(&tax_id)?;
    let companies = service(&state).await?.find_by_tax_id(&tax_id).await?;
    Ok(Json(CompaniesResponse {
        companies: non_empty(companies)?,
        total: None,
    }))
}

/// Creates a company
pub async fn create_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    require_role(&claims, permissions::ERP_WRITE)?;
    request.validate()?;
    let company = NewCompany::try_from(request)?;

    let id = service(&state).await?.create(&company).await?;
    info!(partner_id = %id, user = %claims.sub, "Company created");

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: id.get() })))
}

/// Updates a company
pub async fn update_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCompanyRequest>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    require_role(&claims, permissions::ERP_WRITE)?;
    request.validate()?;
    let update = CompanyUpdate::try_from(request)?;

    service(&state).await?.update(PartnerId::new(id), &update).await?;
    Ok(Json(UpdatedResponse { updated: true }))
}

/// Deletes a company
pub async fn delete_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse>, ApiError> {
    require_role(&claims, permissions::ERP_WRITE)?;

    service(&state).await?.delete(PartnerId::new(id)).await?;
    info!(partner_id = id, user = %claims.sub, "Company deleted");
    Ok(Json(DeletedResponse { deleted: true }))
}
