//! HTTP API Layer
//!
//! This crate provides the REST API of the ERP gateway using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers per ERP entity
//! - **Middleware**: Authentication, audit logging, request ids
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent `{error, message}` responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let registry = Arc::new(ClientRegistry::with_xmlrpc(config.erp_config()));
//! let app = create_router(registry, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use infra_erp::ClientRegistry;

use crate::config::ApiConfig;
use crate::handlers::{companies, health, leads, orders, tasks, tickets};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ClientRegistry>,
    pub config: ApiConfig,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `registry` - ERP client registry owned by the caller
/// * `config` - API configuration
pub fn create_router(registry: Arc<ClientRegistry>, config: ApiConfig) -> Router {
    let state = AppState { registry, config };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let company_routes = Router::new()
        .route("/", get(companies::list_companies).post(companies::create_company))
        .route("/by-tax-id/:tax_id", get(companies::get_company_by_tax_id))
        .route(
            "/:id",
            get(companies::get_company)
                .put(companies::update_company)
                .delete(companies::delete_company),
        );

    let lead_routes = Router::new()
        .route("/", get(leads::list_leads).post(leads::create_lead));

    let order_routes = Router::new()
        .route("/", get(orders::list_orders).post(orders::create_order))
        .route("/:id", get(orders::get_order))
        .route("/:id/confirm", post(orders::confirm_order));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/companies", company_routes)
        .nest("/leads", lead_routes)
        .route("/tickets", get(tickets::list_tickets))
        .route("/tasks", get(tasks::list_tasks))
        .nest("/orders", order_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
