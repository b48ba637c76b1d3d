//! Task model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::erp_serde::{erp_date_opt, falsy_as_none};
use core_kernel::{Domain, Many2One, ProjectId, RecordId, SearchReadOptions, TaskId, TaxId};

pub const MODEL: &str = "project.task";

pub const TASK_FIELDS: &[&str] = &[
    "name",
    "project_id",
    "stage_id",
    "partner_id",
    "user_ids",
    "date_deadline",
    "priority",
];

/// A project task as exposed by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(
        rename(deserialize = "project_id", serialize = "project"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub project: Option<Many2One>,
    #[serde(
        rename(deserialize = "stage_id", serialize = "stage"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub stage: Option<Many2One>,
    #[serde(
        rename(deserialize = "partner_id", serialize = "customer"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer: Option<Many2One>,
    #[serde(rename(deserialize = "user_ids", serialize = "assignee_ids"), default)]
    pub assignee_ids: Vec<RecordId>,
    #[serde(
        rename(deserialize = "date_deadline", serialize = "deadline"),
        default,
        deserialize_with = "erp_date_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<NaiveDate>,
    #[serde(default, deserialize_with = "falsy_as_none", skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

/// Domain for the tasks of one customer, optionally limited to `projects`
pub fn customer_tasks_domain(tax_id: &TaxId, projects: &[ProjectId]) -> Domain {
    let domain = Domain::new().eq("partner_id.vat", tax_id.digits());
    if projects.is_empty() {
        domain
    } else {
        domain.is_in("project_id", projects.iter().copied())
    }
}

pub fn task_options() -> SearchReadOptions {
    SearchReadOptions::new()
        .fields(TASK_FIELDS)
        .order("date_deadline asc, id asc")
}
