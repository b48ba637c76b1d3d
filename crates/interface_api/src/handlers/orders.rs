//! Sales order handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;
use validator::Validate;

use core_kernel::OrderId;
use domain_sales::{NewOrder, SalesService};

use crate::auth::{permissions, require_role, Claims};
use crate::dto::order::*;
use crate::dto::{ConfirmedResponse, CreatedResponse};
use crate::error::ApiError;
use crate::handlers::{erp_session, non_empty};
use crate::AppState;

async fn service(state: &AppState) -> Result<SalesService, ApiError> {
    Ok(SalesService::new(erp_session(state).await?))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<OrdersResponse>, ApiError> {
    query.validate()?;
    let filter = query.into_filter()?;
    let orders = service(&state).await?.search(&filter).await?;
    Ok(Json(OrdersResponse {
        orders: non_empty(orders)?,
    }))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OrdersResponse>, ApiError> {
    let order = service(&state).await?.get(OrderId::new(id)).await?;
    Ok(Json(OrdersResponse {
        orders: vec![order],
    }))
}

/// Creates a quotation
pub async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    require_role(&claims, permissions::ERP_WRITE)?;
    request.validate()?;

    let id = service(&state).await?.create(&NewOrder::from(request)).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: id.get() })))
}

/// Confirms a quotation into a sales order
pub async fn confirm_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ConfirmedResponse>, ApiError> {
    require_role(&claims, permissions::ERP_WRITE)?;

    service(&state).await?.confirm(OrderId::new(id)).await?;
    info!(order_id = id, user = %claims.sub, "Order confirmed via API");
    Ok(Json(ConfirmedResponse { confirmed: true }))
}
