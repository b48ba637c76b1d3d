//! Task service

use std::sync::Arc;
use tracing::debug;

use core_kernel::{from_records, ErpPort, PortError, ProjectId, TaxId};

use crate::model::{customer_tasks_domain, task_options, Task, MODEL};

/// Reads project tasks through the ERP port
///
/// Lookups are limited to the projects the service was built with; an
/// empty list means every project.
#[derive(Clone)]
pub struct ProjectService {
    erp: Arc<dyn ErpPort>,
    projects: Vec<ProjectId>,
}

impl ProjectService {
    pub fn new(erp: Arc<dyn ErpPort>, projects: Vec<ProjectId>) -> Self {
        Self { erp, projects }
    }

    pub fn projects(&self) -> &[ProjectId] {
        &self.projects
    }

    /// Tasks of the customer registered under `tax_id`, earliest deadline first
    pub async fn find_by_tax_id(&self, tax_id: &TaxId) -> Result<Vec<Task>, PortError> {
        let rows = self
            .erp
            .search_read(MODEL, customer_tasks_domain(tax_id, &self.projects), task_options())
            .await;
        debug!(count = rows.len(), projects = self.projects.len(), "Tasks fetched");
        from_records(MODEL, rows)
    }
}

impl std::fmt::Debug for ProjectService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectService")
            .field("projects", &self.projects)
            .finish_non_exhaustive()
    }
}
