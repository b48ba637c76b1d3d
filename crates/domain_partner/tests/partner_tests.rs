//! Tests for the partner domain against the in-memory ERP

use serde_json::json;
use std::sync::Arc;

use core_kernel::{ErpPort, PartnerId, PortError, TaxId};
use domain_partner::{CompanyFilter, CompanyUpdate, NewCompany, PartnerService};
use test_utils::{
    assert_domain, assert_kwarg, assert_single_call, ErpFixtures, MockTransport, RecordFixtures,
    ACME_CNPJ,
};

fn service(transport: &Arc<MockTransport>) -> PartnerService {
    let erp: Arc<dyn ErpPort> = ErpFixtures::client(Arc::clone(transport));
    PartnerService::new(erp)
}

#[tokio::test]
async fn test_lookup_by_tax_id_returns_record_unchanged() {
    let transport = Arc::new(MockTransport::new().respond(
        "res.partner",
        "search_read",
        json!([RecordFixtures::acme()]),
    ));
    let service = service(&transport);

    let companies = service
        .find_by_tax_id(&TaxId::parse(ACME_CNPJ).unwrap())
        .await
        .unwrap();

    assert_eq!(companies.len(), 1);
    assert_eq!(
        serde_json::to_value(&companies[0]).unwrap(),
        json!({"id": 1, "name": "Acme"})
    );
    assert_eq!(transport.auth_count(), 1);
    let call = assert_single_call(&transport, "res.partner", "search_read");
    assert_domain(&call, json!([["vat", "=", ACME_CNPJ]]));
}

#[tokio::test]
async fn test_lookup_accepts_masked_tax_id() {
    let transport = Arc::new(MockTransport::new().respond("res.partner", "search_read", json!([])));
    let service = service(&transport);

    let companies = service
        .find_by_tax_id(&TaxId::parse("12.345.678/0001-95").unwrap())
        .await
        .unwrap();

    assert!(companies.is_empty());
    let call = assert_single_call(&transport, "res.partner", "search_read");
    assert_domain(&call, json!([["vat", "=", ACME_CNPJ]]));
}

#[tokio::test]
async fn test_search_relabels_fields() {
    let transport = Arc::new(MockTransport::new().respond(
        "res.partner",
        "search_read",
        json!([RecordFixtures::partner(4, "Acme", Some(ACME_CNPJ))]),
    ));
    let service = service(&transport);

    let filter = CompanyFilter {
        city: Some("paulo".to_string()),
        limit: Some(10),
        offset: Some(20),
        ..Default::default()
    };
    let companies = service.search(&filter).await.unwrap();

    let value = serde_json::to_value(&companies[0]).unwrap();
    assert_eq!(value["tax_id"], json!(ACME_CNPJ));
    assert_eq!(value["country"], json!({"id": 31, "name": "Brazil"}));
    assert!(value.get("vat").is_none());
    assert!(value.get("email").is_none());

    let call = assert_single_call(&transport, "res.partner", "search_read");
    assert_kwarg(&call, "limit", json!(10));
    assert_kwarg(&call, "offset", json!(20));
}

#[tokio::test]
async fn test_search_is_empty_when_erp_fails() {
    let transport = Arc::new(MockTransport::new().failing_all_calls("connection reset"));
    let service = service(&transport);

    let companies = service.search(&CompanyFilter::default()).await.unwrap();
    assert!(companies.is_empty());
}

#[tokio::test]
async fn test_count_propagates_errors() {
    let transport = Arc::new(MockTransport::new().rejecting_credentials());
    let service = service(&transport);

    let err = service.count(&CompanyFilter::default()).await.unwrap_err();
    assert!(matches!(err, PortError::Unauthorized { .. }));
}

#[tokio::test]
async fn test_count() {
    let transport = Arc::new(MockTransport::new().respond("res.partner", "search_count", json!(12)));
    let service = service(&transport);

    assert_eq!(service.count(&CompanyFilter::default()).await.unwrap(), 12);
}

#[tokio::test]
async fn test_get_missing_company() {
    let transport = Arc::new(MockTransport::new().respond("res.partner", "search_read", json!([])));
    let service = service(&transport);

    let err = service.get(PartnerId::new(99)).await.unwrap_err();
    assert!(err.is_not_found());
    let call = assert_single_call(&transport, "res.partner", "search_read");
    assert_domain(&call, json!([["id", "=", 99]]));
}

#[tokio::test]
async fn test_create_company() {
    let transport = Arc::new(MockTransport::new().respond("res.partner", "create", json!(58)));
    let service = service(&transport);

    let company = NewCompany {
        tax_id: Some(TaxId::parse(ACME_CNPJ).unwrap()),
        ..NewCompany::new("Acme")
    };
    let id = service.create(&company).await.unwrap();

    assert_eq!(id, PartnerId::new(58));
    let call = assert_single_call(&transport, "res.partner", "create");
    assert_eq!(
        call.args,
        vec![json!({"name": "Acme", "is_company": true, "vat": ACME_CNPJ})]
    );
}

#[tokio::test]
async fn test_create_rejects_blank_name_without_calling_erp() {
    let transport = Arc::new(MockTransport::new());
    let service = service(&transport);

    let err = service.create(&NewCompany::new("")).await.unwrap_err();
    assert!(matches!(err, PortError::Validation { .. }));
    assert_eq!(transport.invoke_count(), 0);
}

#[tokio::test]
async fn test_update_and_delete() {
    let transport = Arc::new(
        MockTransport::new()
            .respond("res.partner", "write", json!(true))
            .respond("res.partner", "unlink", json!(true)),
    );
    let service = service(&transport);

    let update = CompanyUpdate {
        phone: Some("+55 11 4000-0001".to_string()),
        ..Default::default()
    };
    service.update(PartnerId::new(4), &update).await.unwrap();
    service.delete(PartnerId::new(4)).await.unwrap();

    let writes = transport.calls_for("write");
    assert_eq!(writes[0].args, vec![json!([4]), json!({"phone": "+55 11 4000-0001"})]);
    assert_eq!(transport.calls_for("unlink")[0].args, vec![json!([4])]);
}

#[tokio::test]
async fn test_failed_delete_is_an_error() {
    let transport = Arc::new(MockTransport::new().fault("res.partner", "unlink", 1, "Record is referenced"));
    let service = service(&transport);

    assert!(service.delete(PartnerId::new(4)).await.is_err());
}

mod properties {
    use super::*;
    use core_kernel::from_record;
    use domain_partner::Company;
    use proptest::prelude::*;
    use test_utils::{masked_cnpj_strategy, partner_row_strategy, record};

    proptest! {
        #[test]
        fn prop_filter_searches_bare_digits((masked, digits) in masked_cnpj_strategy()) {
            let filter = CompanyFilter {
                tax_id: Some(TaxId::parse(&masked).unwrap()),
                ..Default::default()
            };
            let domain = filter.to_domain().to_value();
            prop_assert_eq!(&domain[1], &json!(["vat", "=", digits]));
        }

        #[test]
        fn prop_erp_rows_decode_and_relabel(row in partner_row_strategy()) {
            let vat = row["vat"].clone();
            let company: Company = from_record("res.partner", record(row)).unwrap();
            let value = serde_json::to_value(&company).unwrap();

            prop_assert!(value.get("vat").is_none());
            prop_assert!(value.get("is_company").is_none());
            match vat {
                serde_json::Value::String(digits) => prop_assert_eq!(&value["tax_id"], &json!(digits)),
                _ => prop_assert!(value.get("tax_id").is_none()),
            }
        }
    }
}
