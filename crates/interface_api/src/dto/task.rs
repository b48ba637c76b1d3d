//! Task DTOs

use serde::{Deserialize, Serialize};

use core_kernel::TaxId;
use domain_project::Task;

use crate::dto::non_blank;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub tax_id: Option<String>,
}

impl TaskQuery {
    pub fn tax_id(self) -> Result<TaxId, ApiError> {
        let raw = non_blank(self.tax_id)
            .ok_or_else(|| ApiError::BadRequest("tax_id is required".to_string()))?;
        Ok(TaxId::parse(&raw)?)
    }
}

#[derive(Debug, Serialize)]
pub struct TasksResponse {
    pub tasks: Vec<Task>,
}
