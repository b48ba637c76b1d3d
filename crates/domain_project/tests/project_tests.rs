//! Tests for the project domain against the in-memory ERP

use serde_json::json;
use std::sync::Arc;

use core_kernel::{ErpPort, ProjectId, TaskId, TaxId};
use domain_project::ProjectService;
use test_utils::{
    assert_domain, assert_kwarg, assert_single_call, ErpFixtures, MockTransport, RecordFixtures,
    ACME_CNPJ,
};

fn service(transport: &Arc<MockTransport>, projects: Vec<ProjectId>) -> ProjectService {
    let erp: Arc<dyn ErpPort> = ErpFixtures::client(Arc::clone(transport));
    ProjectService::new(erp, projects)
}

#[tokio::test]
async fn test_tasks_across_configured_projects() {
    let transport = Arc::new(MockTransport::new().respond(
        "project.task",
        "search_read",
        json!([
            RecordFixtures::task(50, "Kickoff", 2),
            RecordFixtures::task(51, "Data migration", 4)
        ]),
    ));
    let service = service(&transport, vec![ProjectId::new(2), ProjectId::new(4)]);

    let tasks = service
        .find_by_tax_id(&TaxId::parse(ACME_CNPJ).unwrap())
        .await
        .unwrap();

    assert_eq!(
        tasks.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![TaskId::new(50), TaskId::new(51)]
    );
    let call = assert_single_call(&transport, "project.task", "search_read");
    assert_domain(
        &call,
        json!([["partner_id.vat", "=", ACME_CNPJ], ["project_id", "in", [2, 4]]]),
    );
    assert_kwarg(&call, "order", json!("date_deadline asc, id asc"));
}

#[tokio::test]
async fn test_no_configured_projects_searches_all() {
    let transport = Arc::new(MockTransport::new().respond("project.task", "search_read", json!([])));
    let service = service(&transport, vec![]);

    let tasks = service
        .find_by_tax_id(&TaxId::parse(ACME_CNPJ).unwrap())
        .await
        .unwrap();

    assert!(tasks.is_empty());
    let call = assert_single_call(&transport, "project.task", "search_read");
    assert_domain(&call, json!([["partner_id.vat", "=", ACME_CNPJ]]));
}

#[tokio::test]
async fn test_fault_yields_no_tasks() {
    let transport = Arc::new(MockTransport::new().fault(
        "project.task",
        "search_read",
        1,
        "odoo.exceptions.AccessError: project.task",
    ));
    let service = service(&transport, vec![ProjectId::new(2)]);

    let tasks = service
        .find_by_tax_id(&TaxId::parse(ACME_CNPJ).unwrap())
        .await
        .unwrap();
    assert!(tasks.is_empty());
}
