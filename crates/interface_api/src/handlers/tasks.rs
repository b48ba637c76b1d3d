//! Task handlers

use axum::{
    extract::{Query, State},
    Json,
};

use domain_project::ProjectService;

use crate::dto::task::*;
use crate::error::ApiError;
use crate::handlers::{erp_session, non_empty};
use crate::AppState;

/// Lists a customer's tasks across the configured projects
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> Result<Json<TasksResponse>, ApiError> {
    let tax_id = query.tax_id()?;
    let service = ProjectService::new(erp_session(&state).await?, state.config.project_ids());
    let tasks = service.find_by_tax_id(&tax_id).await?;
    Ok(Json(TasksResponse {
        tasks: non_empty(tasks)?,
    }))
}
