//! Pre-built Test Fixtures
//!
//! Connection settings for the mock ERP and raw ERP rows shaped the way
//! `search_read` returns them (`false` for empty fields, many2one pairs).

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use core_kernel::Record;
use infra_erp::{AsyncErpClient, ClientKey, ClientRegistry, Credentials, ErpConfig};

use crate::mock::{MockTransport, MockTransportFactory};

/// Uid the mock ERP grants by default
pub const TEST_UID: i64 = 7;
pub const TEST_SERVER: &str = "http://erp.test";
pub const TEST_DATABASE: &str = "test";
pub const TEST_USERNAME: &str = "api";
pub const TEST_PASSWORD: &str = "secret";

/// CNPJ of the Acme fixture company
pub const ACME_CNPJ: &str = "12345678000195";

/// Fixture for ERP connection settings
pub struct ErpFixtures;

impl ErpFixtures {
    /// Config for the mock server with a short call timeout
    pub fn config() -> ErpConfig {
        ErpConfig::new(TEST_SERVER, TEST_DATABASE, TEST_USERNAME, TEST_PASSWORD)
            .max_in_flight(4)
            .call_timeout(Some(Duration::from_secs(5)))
    }

    pub fn client_key() -> ClientKey {
        ClientKey::new(TEST_SERVER, TEST_DATABASE, TEST_USERNAME)
    }

    pub fn credentials() -> Credentials {
        Credentials::new(TEST_PASSWORD)
    }

    /// An unauthenticated client talking to `transport`
    pub fn client(transport: Arc<MockTransport>) -> Arc<AsyncErpClient> {
        Self::client_with_config(transport, Self::config())
    }

    pub fn client_with_config(transport: Arc<MockTransport>, config: ErpConfig) -> Arc<AsyncErpClient> {
        Arc::new(AsyncErpClient::new(
            config.client_key(),
            config.credentials.clone(),
            transport,
            config.pool_config(),
            config.call_timeout,
        ))
    }

    /// A registry whose transports all share `transport`
    pub fn registry(transport: Arc<MockTransport>) -> (ClientRegistry, Arc<MockTransportFactory>) {
        let factory = Arc::new(MockTransportFactory::new(transport));
        let registry = ClientRegistry::new(Self::config(), Arc::clone(&factory) as _);
        (registry, factory)
    }
}

/// Converts a JSON object literal into a `Record`
///
/// # Panics
///
/// Panics if `value` is not an object
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Fixture for raw ERP rows
pub struct RecordFixtures;

impl RecordFixtures {
    /// The minimal partner row of the tax-id lookup scenario
    pub fn acme() -> Value {
        json!({"id": 1, "name": "Acme"})
    }

    pub fn partner(id: i64, name: &str, vat: Option<&str>) -> Value {
        json!({
            "id": id,
            "name": name,
            "vat": vat.map(Value::from).unwrap_or(Value::Bool(false)),
            "email": false,
            "phone": "+55 11 4000-0000",
            "city": "São Paulo",
            "state_id": [25, "São Paulo (BR)"],
            "country_id": [31, "Brazil"],
            "is_company": true
        })
    }

    pub fn lead(id: i64, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "partner_id": [1, "Acme"],
            "contact_name": "Maria Silva",
            "email_from": "maria@acme.example",
            "phone": false,
            "stage_id": [2, "Qualified"],
            "user_id": [5, "Paula Sales"],
            "team_id": false,
            "expected_revenue": 15000.0,
            "probability": 40.0,
            "type": "opportunity",
            "create_date": "2024-03-01 09:30:00"
        })
    }

    pub fn ticket(id: i64, subject: &str, closed: bool) -> Value {
        json!({
            "id": id,
            "name": subject,
            "partner_id": [1, "Acme"],
            "team_id": [3, "Customer Care"],
            "stage_id": if closed { json!([9, "Solved"]) } else { json!([1, "New"]) },
            "user_id": false,
            "priority": "1",
            "create_date": "2024-04-10 14:00:00",
            "close_date": if closed { json!("2024-04-12 08:15:00") } else { json!(false) }
        })
    }

    pub fn order(id: i64, reference: &str, state: &str) -> Value {
        json!({
            "id": id,
            "name": reference,
            "partner_id": [1, "Acme"],
            "state": state,
            "date_order": "2024-05-02 10:00:00",
            "amount_untaxed": 1000.0,
            "amount_tax": 180.0,
            "amount_total": 1180.0,
            "currency_id": [6, "BRL"],
            "user_id": [5, "Paula Sales"],
            "client_order_ref": false
        })
    }

    pub fn task(id: i64, name: &str, project_id: i64) -> Value {
        json!({
            "id": id,
            "name": name,
            "project_id": [project_id, "Implementation"],
            "stage_id": [4, "In Progress"],
            "partner_id": [1, "Acme"],
            "user_ids": [5, 8],
            "date_deadline": "2024-06-30",
            "priority": "0"
        })
    }
}
