//! Serde helpers for ERP record payloads
//!
//! The ERP has a few serialization quirks every typed record has to deal
//! with:
//! - empty scalar fields come back as `false`, not `null`
//! - many2one fields are `[id, "display name"]` pairs (or `false`)
//! - monetary fields are floats
//! - dates and datetimes are naive strings

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::identifiers::RecordId;
use crate::money::{decimal_from_erp, MONEY_DECIMAL_PLACES};
use crate::ports::PortError;
use crate::query::Record;
use crate::temporal::{parse_erp_date, parse_erp_datetime};

/// A many2one reference as `{id, name}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Many2One {
    pub id: RecordId,
    pub name: String,
}

impl Many2One {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(id),
            name: name.into(),
        }
    }
}

impl<'de> Deserialize<'de> for Many2One {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (id, name) = <(i64, String)>::deserialize(deserializer)?;
        Ok(Self {
            id: RecordId::new(id),
            name,
        })
    }
}

fn is_falsy(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Bool(false))
}

/// Deserializes `false`/`null` as `None`, anything else as `Some(T)`
pub fn falsy_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if is_falsy(&value) {
        return Ok(None);
    }
    serde_json::from_value(value).map(Some).map_err(D::Error::custom)
}

/// Deserializes a monetary float into a 2dp decimal (`false` is zero)
pub fn erp_money<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(|f| decimal_from_erp(f, MONEY_DECIMAL_PLACES))
            .ok_or_else(|| D::Error::custom("monetary value out of range")),
        v if is_falsy(&v) => Ok(Decimal::ZERO),
        other => Err(D::Error::custom(format!("expected a number, got {}", other))),
    }
}

pub fn erp_datetime_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match falsy_as_none::<D, String>(deserializer)? {
        Some(s) => parse_erp_datetime(&s).map(Some).map_err(D::Error::custom),
        None => Ok(None),
    }
}

pub fn erp_date_opt<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match falsy_as_none::<D, String>(deserializer)? {
        Some(s) => parse_erp_date(&s).map(Some).map_err(D::Error::custom),
        None => Ok(None),
    }
}

/// Converts an untyped record into a typed model
pub fn from_record<T: DeserializeOwned>(model: &str, record: Record) -> Result<T, PortError> {
    serde_json::from_value(Value::Object(record)).map_err(|e| PortError::Transformation {
        message: format!("cannot decode {} record: {}", model, e),
    })
}

/// Converts every record, failing on the first that does not decode
pub fn from_records<T: DeserializeOwned>(model: &str, records: Vec<Record>) -> Result<Vec<T>, PortError> {
    records.into_iter().map(|r| from_record(model, r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "falsy_as_none")]
        email: Option<String>,
        #[serde(default, deserialize_with = "falsy_as_none")]
        country_id: Option<Many2One>,
        #[serde(default, deserialize_with = "erp_money")]
        amount_total: Decimal,
        #[serde(default, deserialize_with = "erp_datetime_opt")]
        create_date: Option<DateTime<Utc>>,
        #[serde(default, deserialize_with = "erp_date_opt")]
        date_deadline: Option<NaiveDate>,
    }

    #[test]
    fn test_false_fields_become_none() {
        let row: Row = serde_json::from_value(json!({
            "email": false,
            "country_id": false,
            "amount_total": false,
            "create_date": false,
            "date_deadline": false
        }))
        .unwrap();
        assert!(row.email.is_none());
        assert!(row.country_id.is_none());
        assert_eq!(row.amount_total, Decimal::ZERO);
        assert!(row.create_date.is_none());
        assert!(row.date_deadline.is_none());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let row: Row = serde_json::from_value(json!({})).unwrap();
        assert!(row.email.is_none());
        assert_eq!(row.amount_total, Decimal::ZERO);
    }

    #[test]
    fn test_populated_fields() {
        let row: Row = serde_json::from_value(json!({
            "email": "ops@acme.example",
            "country_id": [31, "Brazil"],
            "amount_total": 1520.499,
            "create_date": "2024-05-02 10:00:00",
            "date_deadline": "2024-06-30"
        }))
        .unwrap();
        assert_eq!(row.email.as_deref(), Some("ops@acme.example"));
        assert_eq!(row.country_id, Some(Many2One::new(31, "Brazil")));
        assert_eq!(row.amount_total, dec!(1520.50));
        assert!(row.create_date.is_some());
        assert!(row.date_deadline.is_some());
    }

    #[test]
    fn test_many2one_serializes_as_object() {
        let value = serde_json::to_value(Many2One::new(3, "Sales")).unwrap();
        assert_eq!(value, json!({"id": 3, "name": "Sales"}));
    }

    #[test]
    fn test_from_record_reports_model_on_failure() {
        let mut record = Record::new();
        record.insert("country_id".to_string(), json!("not a pair"));
        let err = from_record::<Row>("res.partner", record).unwrap_err();
        assert!(err.to_string().contains("res.partner"));
    }
}
