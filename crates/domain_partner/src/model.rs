//! Company model
//!
//! Companies are `res.partner` rows with `is_company` set. The typed
//! structs here read the ERP's field names and write the labels the BI
//! consumers expect (`vat` becomes `tax_id`, `state_id` becomes `state`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use core_kernel::erp_serde::falsy_as_none;
use core_kernel::{Domain, Many2One, Operator, PartnerId, PortError, Record, SearchReadOptions, TaxId};

/// ERP model holding companies
pub const MODEL: &str = "res.partner";

/// Fields read for every company
pub const COMPANY_FIELDS: &[&str] = &[
    "name", "vat", "email", "phone", "street", "city", "zip", "state_id", "country_id",
];

/// Default page size of company listings
pub const DEFAULT_LIMIT: u32 = 80;

/// A company as exposed by the gateway
///
/// Deserializes from a raw ERP row and serializes with the gateway's
/// labels. Empty fields are left out of the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: PartnerId,
    pub name: String,
    #[serde(
        rename(deserialize = "vat", serialize = "tax_id"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub tax_id: Option<String>,
    #[serde(default, deserialize_with = "falsy_as_none", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "falsy_as_none", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "falsy_as_none", skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "falsy_as_none", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "falsy_as_none", skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(
        rename(deserialize = "state_id", serialize = "state"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub state: Option<Many2One>,
    #[serde(
        rename(deserialize = "country_id", serialize = "country"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub country: Option<Many2One>,
}

/// Search criteria for company listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyFilter {
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    pub tax_id: Option<TaxId>,
    /// Case-insensitive substring of the city
    pub city: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl CompanyFilter {
    pub fn to_domain(&self) -> Domain {
        Domain::new()
            .eq("is_company", true)
            .filter_opt("name", Operator::ILike, self.name.clone())
            .filter_opt("vat", Operator::Eq, self.tax_id.as_ref().map(|t| t.digits().to_string()))
            .filter_opt("city", Operator::ILike, self.city.clone())
    }

    pub fn options(&self) -> SearchReadOptions {
        SearchReadOptions::new()
            .fields(COMPANY_FIELDS)
            .paginate(Some(self.limit.unwrap_or(DEFAULT_LIMIT)), self.offset)
            .order("name asc")
    }
}

/// Values for a new company
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCompany {
    pub name: String,
    pub tax_id: Option<TaxId>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
}

impl NewCompany {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builds the `create` values
    ///
    /// # Errors
    ///
    /// Returns a validation error when the name is blank
    pub fn to_values(&self) -> Result<Record, PortError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(PortError::validation_field("Company name is required", "name"));
        }

        let mut values = Record::new();
        values.insert("name".to_string(), Value::from(name));
        values.insert("is_company".to_string(), Value::Bool(true));
        if let Some(tax_id) = &self.tax_id {
            values.insert("vat".to_string(), Value::from(tax_id.digits()));
        }
        insert_opt(&mut values, "email", &self.email);
        insert_opt(&mut values, "phone", &self.phone);
        insert_opt(&mut values, "street", &self.street);
        insert_opt(&mut values, "city", &self.city);
        insert_opt(&mut values, "zip", &self.zip);
        Ok(values)
    }
}

/// Changes to an existing company; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub tax_id: Option<TaxId>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
}

impl CompanyUpdate {
    /// Builds the `write` values
    ///
    /// # Errors
    ///
    /// Returns a validation error when nothing is set or the name is blank
    pub fn to_values(&self) -> Result<Record, PortError> {
        let mut values = Record::new();
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(PortError::validation_field("Company name cannot be blank", "name"));
            }
            values.insert("name".to_string(), Value::from(name.trim()));
        }
        if let Some(tax_id) = &self.tax_id {
            values.insert("vat".to_string(), Value::from(tax_id.digits()));
        }
        insert_opt(&mut values, "email", &self.email);
        insert_opt(&mut values, "phone", &self.phone);
        insert_opt(&mut values, "street", &self.street);
        insert_opt(&mut values, "city", &self.city);
        insert_opt(&mut values, "zip", &self.zip);

        if values.is_empty() {
            return Err(PortError::validation("Update contains no fields"));
        }
        Ok(values)
    }
}

fn insert_opt(values: &mut Record, field: &str, value: &Option<String>) {
    if let Some(v) = value {
        values.insert(field.to_string(), Value::from(v.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::from_record;
    use serde_json::json;
    use test_utils::record as row;

    #[test]
    fn test_minimal_row_serializes_unchanged() {
        let company: Company = from_record(MODEL, row(json!({"id": 1, "name": "Acme"}))).unwrap();
        assert_eq!(serde_json::to_value(&company).unwrap(), json!({"id": 1, "name": "Acme"}));
    }

    #[test]
    fn test_fields_are_relabelled() {
        let company: Company = from_record(
            MODEL,
            row(json!({
                "id": 4,
                "name": "Acme",
                "vat": "12345678000195",
                "email": false,
                "state_id": [25, "São Paulo (BR)"],
                "country_id": [31, "Brazil"]
            })),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&company).unwrap(),
            json!({
                "id": 4,
                "name": "Acme",
                "tax_id": "12345678000195",
                "state": {"id": 25, "name": "São Paulo (BR)"},
                "country": {"id": 31, "name": "Brazil"}
            })
        );
    }

    #[test]
    fn test_filter_domain() {
        let filter = CompanyFilter {
            name: Some("acme".to_string()),
            tax_id: Some(TaxId::parse("12.345.678/0001-95").unwrap()),
            ..Default::default()
        };
        assert_eq!(
            filter.to_domain().to_value(),
            json!([
                ["is_company", "=", true],
                ["name", "ilike", "acme"],
                ["vat", "=", "12345678000195"]
            ])
        );
    }

    #[test]
    fn test_filter_options_default_limit() {
        let kwargs = CompanyFilter::default().options().to_kwargs();
        assert_eq!(kwargs.get("limit"), Some(&json!(DEFAULT_LIMIT)));
        assert!(!kwargs.contains_key("offset"));
    }

    #[test]
    fn test_new_company_values() {
        let company = NewCompany {
            tax_id: Some(TaxId::parse("12.345.678/0001-95").unwrap()),
            city: Some("Campinas".to_string()),
            ..NewCompany::new("  Acme  ")
        };
        let values = company.to_values().unwrap();
        assert_eq!(values.get("name"), Some(&json!("Acme")));
        assert_eq!(values.get("vat"), Some(&json!("12345678000195")));
        assert_eq!(values.get("is_company"), Some(&json!(true)));
        assert!(!values.contains_key("email"));
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(matches!(
            NewCompany::new("  ").to_values(),
            Err(PortError::Validation { .. })
        ));
    }

    #[test]
    fn test_empty_update_rejected() {
        assert!(CompanyUpdate::default().to_values().is_err());
        let update = CompanyUpdate {
            email: Some("ops@acme.example".to_string()),
            ..Default::default()
        };
        assert_eq!(update.to_values().unwrap().len(), 1);
    }
}
