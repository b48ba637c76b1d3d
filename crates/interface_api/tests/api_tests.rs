//! Router tests against the in-memory ERP

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use interface_api::auth::{create_token, permissions};
use interface_api::config::ApiConfig;
use interface_api::create_router;
use infra_erp::ClientRegistry;
use test_utils::{
    assert_domain, assert_no_invocations, assert_single_call, init_test_tracing, ErpFixtures,
    MockTransport, RecordFixtures, ACME_CNPJ,
};

const SECRET: &str = "api-test-secret";

fn config() -> ApiConfig {
    ApiConfig {
        jwt_secret: SECRET.to_string(),
        project_ids: vec![2, 4],
        ..Default::default()
    }
}

fn app(transport: &Arc<MockTransport>) -> (Router, Arc<ClientRegistry>) {
    init_test_tracing();
    let (registry, _factory) = ErpFixtures::registry(Arc::clone(transport));
    let registry = Arc::new(registry);
    (create_router(Arc::clone(&registry), config()), registry)
}

fn token(roles: &[&str]) -> String {
    create_token(
        "bi-service",
        roles.iter().map(|r| r.to_string()).collect(),
        SECRET,
        300,
    )
    .unwrap()
}

fn reader() -> String {
    token(&[permissions::ERP_READ])
}

fn writer() -> String {
    token(&[permissions::ERP_READ, permissions::ERP_WRITE])
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_liveness_needs_no_token() {
        let (app, _registry) = app(&Arc::new(MockTransport::new()));

        let (status, body) = send(app, "GET", "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("healthy"));
    }

    #[tokio::test]
    async fn test_readiness_reports_erp_and_pool() {
        let transport = Arc::new(MockTransport::new());
        let (app, _registry) = app(&transport);

        let (status, body) = send(app, "GET", "/health/ready", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("ready"));
        assert_eq!(body["erp"]["status"], json!("healthy"));
        assert_eq!(body["pool"]["capacity"], json!(4));
        assert_eq!(transport.version_count(), 1);
    }

    #[tokio::test]
    async fn test_readiness_after_shutdown_is_unavailable() {
        let (app, registry) = app(&Arc::new(MockTransport::new()));
        registry.shutdown();

        let (status, body) = send(app, "GET", "/health/ready", None, None).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], json!("unavailable"));
    }
}

mod companies {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let transport = Arc::new(MockTransport::new());
        let (app, _registry) = app(&transport);

        let uri = format!("/api/v1/companies/by-tax-id/{}", ACME_CNPJ);
        let (status, body) = send(app, "GET", &uri, None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], json!("unauthorized"));
        assert_eq!(transport.auth_count(), 0);
    }

    #[tokio::test]
    async fn test_lookup_by_tax_id() {
        let transport = Arc::new(MockTransport::new().respond(
            "res.partner",
            "search_read",
            json!([RecordFixtures::acme()]),
        ));
        let (app, _registry) = app(&transport);

        let uri = format!("/api/v1/companies/by-tax-id/{}", ACME_CNPJ);
        let (status, body) = send(app, "GET", &uri, Some(&reader()), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"companies": [{"id": 1, "name": "Acme"}]}));
        let call = assert_single_call(&transport, "res.partner", "search_read");
        assert_domain(&call, json!([["vat", "=", ACME_CNPJ]]));
    }

    #[tokio::test]
    async fn test_malformed_tax_id_is_bad_request() {
        let transport = Arc::new(MockTransport::new());
        let (app, _registry) = app(&transport);

        let (status, body) = send(
            app,
            "GET",
            "/api/v1/companies/by-tax-id/12AB",
            Some(&reader()),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("bad_request"));
        assert_no_invocations(&transport);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_found() {
        let transport = Arc::new(MockTransport::new().respond("res.partner", "search_read", json!([])));
        let (app, _registry) = app(&transport);

        let uri = format!("/api/v1/companies/by-tax-id/{}", ACME_CNPJ);
        let (status, body) = send(app, "GET", &uri, Some(&reader()), None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("not_found"));
    }

    #[tokio::test]
    async fn test_erp_login_failure_is_unauthorized() {
        let transport = Arc::new(MockTransport::new().rejecting_credentials());
        let (app, _registry) = app(&transport);

        let uri = format!("/api/v1/companies/by-tax-id/{}", ACME_CNPJ);
        let (status, body) = send(app, "GET", &uri, Some(&reader()), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["message"].as_str().unwrap().contains("ERP authentication failed"));
        assert_no_invocations(&transport);
    }

    #[tokio::test]
    async fn test_list_includes_total() {
        let transport = Arc::new(
            MockTransport::new()
                .respond(
                    "res.partner",
                    "search_read",
                    json!([RecordFixtures::partner(4, "Acme", Some(ACME_CNPJ))]),
                )
                .respond("res.partner", "search_count", json!(1)),
        );
        let (app, _registry) = app(&transport);

        let (status, body) = send(
            app,
            "GET",
            "/api/v1/companies?city=paulo&limit=10",
            Some(&reader()),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], json!(1));
        assert_eq!(body["companies"][0]["tax_id"], json!(ACME_CNPJ));
    }

    #[tokio::test]
    async fn test_out_of_range_limit_is_unprocessable() {
        let transport = Arc::new(MockTransport::new());
        let (app, _registry) = app(&transport);

        let (status, _body) =
            send(app, "GET", "/api/v1/companies?limit=0", Some(&reader()), None).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_no_invocations(&transport);
    }

    #[tokio::test]
    async fn test_create_requires_write_role() {
        let transport = Arc::new(MockTransport::new());
        let (app, _registry) = app(&transport);

        let (status, body) = send(
            app,
            "POST",
            "/api/v1/companies",
            Some(&reader()),
            Some(json!({"name": "Globex"})),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], json!("forbidden"));
        assert_no_invocations(&transport);
    }

    #[tokio::test]
    async fn test_create_company() {
        let transport = Arc::new(MockTransport::new().respond("res.partner", "create", json!(15)));
        let (app, _registry) = app(&transport);

        let (status, body) = send(
            app,
            "POST",
            "/api/v1/companies",
            Some(&writer()),
            Some(json!({"name": "Globex", "tax_id": "11.222.333/0001-81"})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"id": 15}));
        let call = assert_single_call(&transport, "res.partner", "create");
        assert_eq!(call.args[0]["vat"], json!("11222333000181"));
    }

    #[tokio::test]
    async fn test_invalid_email_is_unprocessable() {
        let transport = Arc::new(MockTransport::new());
        let (app, _registry) = app(&transport);

        let (status, body) = send(
            app,
            "POST",
            "/api/v1/companies",
            Some(&writer()),
            Some(json!({"name": "Globex", "email": "not-an-email"})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["message"].as_str().unwrap().contains("email"));
    }

    #[tokio::test]
    async fn test_admin_can_delete() {
        let transport = Arc::new(MockTransport::new().respond("res.partner", "unlink", json!(true)));
        let (app, _registry) = app(&transport);

        let (status, body) = send(
            app,
            "DELETE",
            "/api/v1/companies/15",
            Some(&token(&[permissions::ADMIN])),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"deleted": true}));
        let call = assert_single_call(&transport, "res.partner", "unlink");
        assert_eq!(call.args, vec![json!([15])]);
    }
}

mod other_entities {
    use super::*;

    #[tokio::test]
    async fn test_tickets_require_tax_id() {
        let transport = Arc::new(MockTransport::new());
        let (app, _registry) = app(&transport);

        let (status, body) = send(app, "GET", "/api/v1/tickets", Some(&reader()), None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("tax_id"));
    }

    #[tokio::test]
    async fn test_tickets_relabelled() {
        let transport = Arc::new(MockTransport::new().respond(
            "helpdesk.ticket",
            "search_read",
            json!([RecordFixtures::ticket(11, "Invoice missing", false)]),
        ));
        let (app, _registry) = app(&transport);

        let uri = format!("/api/v1/tickets?tax_id={}&team_id=3", ACME_CNPJ);
        let (status, body) = send(app, "GET", &uri, Some(&reader()), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tickets"][0]["subject"], json!("Invoice missing"));
        assert_eq!(body["tickets"][0]["customer"], json!({"id": 1, "name": "Acme"}));
    }

    #[tokio::test]
    async fn test_leads_by_type() {
        let transport = Arc::new(MockTransport::new().respond(
            "crm.lead",
            "search_read",
            json!([RecordFixtures::lead(3, "Fleet renewal")]),
        ));
        let (app, _registry) = app(&transport);

        let (status, body) = send(
            app,
            "GET",
            "/api/v1/leads?type=opportunity",
            Some(&reader()),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["leads"][0]["salesperson"]["name"], json!("Paula Sales"));
        let call = assert_single_call(&transport, "crm.lead", "search_read");
        assert_domain(&call, json!([["type", "=", "opportunity"]]));
    }

    #[tokio::test]
    async fn test_unknown_lead_type_is_bad_request() {
        let transport = Arc::new(MockTransport::new());
        let (app, _registry) = app(&transport);

        let (status, _body) =
            send(app, "GET", "/api/v1/leads?type=deal", Some(&reader()), None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tasks_use_configured_projects() {
        let transport = Arc::new(MockTransport::new().respond(
            "project.task",
            "search_read",
            json!([RecordFixtures::task(50, "Kickoff", 2)]),
        ));
        let (app, _registry) = app(&transport);

        let uri = format!("/api/v1/tasks?tax_id={}", ACME_CNPJ);
        let (status, body) = send(app, "GET", &uri, Some(&reader()), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tasks"][0]["deadline"], json!("2024-06-30"));
        let call = assert_single_call(&transport, "project.task", "search_read");
        assert_domain(
            &call,
            json!([["partner_id.vat", "=", ACME_CNPJ], ["project_id", "in", [2, 4]]]),
        );
    }

    #[tokio::test]
    async fn test_create_and_confirm_order() {
        let transport = Arc::new(
            MockTransport::new()
                .respond("sale.order", "create", json!(77))
                .respond("sale.order", "action_confirm", json!(true)),
        );
        let (app, _registry) = app(&transport);

        let (status, body) = send(
            app.clone(),
            "POST",
            "/api/v1/orders",
            Some(&writer()),
            Some(json!({"partner_id": 1, "lines": [{"product_id": 30, "quantity": 2}]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"id": 77}));

        let (status, body) =
            send(app, "POST", "/api/v1/orders/77/confirm", Some(&writer()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"confirmed": true}));
        assert_eq!(transport.calls_for("action_confirm")[0].args, vec![json!([77])]);
    }

    #[tokio::test]
    async fn test_order_without_lines_is_unprocessable() {
        let transport = Arc::new(MockTransport::new());
        let (app, _registry) = app(&transport);

        let (status, _body) = send(
            app,
            "POST",
            "/api/v1/orders",
            Some(&writer()),
            Some(json!({"partner_id": 1, "lines": []})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_no_invocations(&transport);
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let transport = Arc::new(MockTransport::new().respond("sale.order", "search_read", json!([])));
        let (app, _registry) = app(&transport);

        let (status, _body) = send(app, "GET", "/api/v1/orders/404", Some(&reader()), None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_date_is_bad_request() {
        let transport = Arc::new(MockTransport::new());
        let (app, _registry) = app(&transport);

        let (status, _body) = send(
            app,
            "GET",
            "/api/v1/orders?date_from=05/01/2024",
            Some(&reader()),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
