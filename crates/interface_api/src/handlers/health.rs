//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use core_kernel::{HealthCheckResult, HealthCheckable};
use infra_erp::PoolMetrics;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erp: Option<HealthCheckResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check against the default ERP client
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let version = env!("CARGO_PKG_VERSION").to_string();

    let client = match state.registry.default_client().await {
        Ok(client) => client,
        Err(e) => {
            let body = ReadinessResponse {
                status: "unavailable".to_string(),
                version,
                erp: None,
                pool: None,
                error: Some(e.to_string()),
            };
            return (StatusCode::SERVICE_UNAVAILABLE, Json(body));
        }
    };

    let health = client.health_check().await;
    let status = if health.is_operational() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = ReadinessResponse {
        status: if status.is_success() { "ready" } else { "unavailable" }.to_string(),
        version,
        pool: Some(client.pool_metrics()),
        erp: Some(health),
        error: None,
    };
    (status, Json(body))
}
