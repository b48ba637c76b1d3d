//! Lead model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use core_kernel::erp_serde::{erp_datetime_opt, erp_money, falsy_as_none};
use core_kernel::money::decimal_to_erp;
use core_kernel::{
    CoreError, Domain, LeadId, Many2One, Operator, PartnerId, PortError, Record,
    SearchReadOptions, TaxId,
};

pub const MODEL: &str = "crm.lead";

pub const LEAD_FIELDS: &[&str] = &[
    "name",
    "partner_id",
    "partner_name",
    "contact_name",
    "email_from",
    "phone",
    "stage_id",
    "user_id",
    "team_id",
    "expected_revenue",
    "probability",
    "type",
    "create_date",
];

pub const DEFAULT_LIMIT: u32 = 80;

/// Whether a CRM record is still a raw lead or a qualified opportunity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadType {
    Lead,
    Opportunity,
}

impl LeadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadType::Lead => "lead",
            LeadType::Opportunity => "opportunity",
        }
    }
}

impl fmt::Display for LeadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lead" => Ok(LeadType::Lead),
            "opportunity" => Ok(LeadType::Opportunity),
            other => Err(CoreError::validation(format!("unknown lead type '{}'", other))),
        }
    }
}

/// A CRM lead as exposed by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    #[serde(rename(deserialize = "name", serialize = "title"))]
    pub title: String,
    #[serde(
        rename(deserialize = "partner_id", serialize = "customer"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer: Option<Many2One>,
    #[serde(
        rename(deserialize = "partner_name", serialize = "company_name"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "falsy_as_none", skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(
        rename(deserialize = "email_from", serialize = "email"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "falsy_as_none", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(
        rename(deserialize = "stage_id", serialize = "stage"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub stage: Option<Many2One>,
    #[serde(
        rename(deserialize = "user_id", serialize = "salesperson"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub salesperson: Option<Many2One>,
    #[serde(
        rename(deserialize = "team_id", serialize = "sales_team"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub sales_team: Option<Many2One>,
    #[serde(default, deserialize_with = "erp_money")]
    pub expected_revenue: Decimal,
    #[serde(default)]
    pub probability: f64,
    #[serde(
        rename(deserialize = "type", serialize = "lead_type"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub lead_type: Option<LeadType>,
    #[serde(
        rename(deserialize = "create_date", serialize = "created_at"),
        default,
        deserialize_with = "erp_datetime_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Search criteria for leads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFilter {
    /// Tax id of the linked customer
    pub tax_id: Option<TaxId>,
    /// Case-insensitive substring of the stage name
    pub stage: Option<String>,
    pub lead_type: Option<LeadType>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl LeadFilter {
    pub fn to_domain(&self) -> Domain {
        Domain::new()
            .filter_opt(
                "partner_id.vat",
                Operator::Eq,
                self.tax_id.as_ref().map(|t| t.digits().to_string()),
            )
            .filter_opt("stage_id.name", Operator::ILike, self.stage.clone())
            .filter_opt("type", Operator::Eq, self.lead_type.map(|t| t.as_str()))
    }

    pub fn options(&self) -> SearchReadOptions {
        SearchReadOptions::new()
            .fields(LEAD_FIELDS)
            .paginate(Some(self.limit.unwrap_or(DEFAULT_LIMIT)), self.offset)
            .order("create_date desc")
    }
}

/// Values for a new lead
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLead {
    pub title: String,
    pub lead_type: Option<LeadType>,
    /// Explicit customer; takes precedence over `tax_id`
    pub partner_id: Option<PartnerId>,
    /// Customer looked up by tax id when `partner_id` is not given
    pub tax_id: Option<TaxId>,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub expected_revenue: Option<Decimal>,
    pub description: Option<String>,
}

impl NewLead {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Builds the `create` values, without customer resolution
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank title or a negative revenue
    pub fn to_values(&self) -> Result<Record, PortError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(PortError::validation_field("Lead title is required", "title"));
        }

        let mut values = Record::new();
        values.insert("name".to_string(), Value::from(title));
        values.insert(
            "type".to_string(),
            Value::from(self.lead_type.unwrap_or(LeadType::Lead).as_str()),
        );
        if let Some(partner_id) = self.partner_id {
            values.insert("partner_id".to_string(), Value::from(partner_id));
        }
        if let Some(revenue) = self.expected_revenue {
            if revenue.is_sign_negative() {
                return Err(PortError::validation_field(
                    "Expected revenue cannot be negative",
                    "expected_revenue",
                ));
            }
            values.insert("expected_revenue".to_string(), Value::from(decimal_to_erp(revenue)));
        }
        for (field, value) in [
            ("partner_name", &self.company_name),
            ("contact_name", &self.contact_name),
            ("email_from", &self.email),
            ("phone", &self.phone),
            ("description", &self.description),
        ] {
            if let Some(v) = value {
                values.insert(field.to_string(), Value::from(v.as_str()));
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::from_record;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use test_utils::{record, RecordFixtures};

    #[test]
    fn test_lead_relabelling() {
        let lead: Lead = from_record(MODEL, record(RecordFixtures::lead(3, "Fleet renewal"))).unwrap();
        let value = serde_json::to_value(&lead).unwrap();

        assert_eq!(value["title"], json!("Fleet renewal"));
        assert_eq!(value["customer"], json!({"id": 1, "name": "Acme"}));
        assert_eq!(value["salesperson"], json!({"id": 5, "name": "Paula Sales"}));
        assert_eq!(value["lead_type"], json!("opportunity"));
        assert!(value.get("sales_team").is_none());
        assert!(value.get("phone").is_none());
        assert_eq!(lead.expected_revenue, dec!(15000));
        assert_eq!(lead.probability, 40.0);
    }

    #[test]
    fn test_lead_type_parsing() {
        assert_eq!("Opportunity".parse::<LeadType>().unwrap(), LeadType::Opportunity);
        assert!("deal".parse::<LeadType>().is_err());
    }

    #[test]
    fn test_filter_domain() {
        let filter = LeadFilter {
            tax_id: Some(TaxId::parse("12345678000195").unwrap()),
            lead_type: Some(LeadType::Lead),
            ..Default::default()
        };
        assert_eq!(
            filter.to_domain().to_value(),
            json!([["partner_id.vat", "=", "12345678000195"], ["type", "=", "lead"]])
        );
    }

    #[test]
    fn test_new_lead_values() {
        let lead = NewLead {
            expected_revenue: Some(dec!(1250.50)),
            email: Some("maria@acme.example".to_string()),
            partner_id: Some(PartnerId::new(1)),
            ..NewLead::new("Fleet renewal")
        };
        let values = lead.to_values().unwrap();

        assert_eq!(values.get("name"), Some(&json!("Fleet renewal")));
        assert_eq!(values.get("type"), Some(&json!("lead")));
        assert_eq!(values.get("partner_id"), Some(&json!(1)));
        assert_eq!(values.get("expected_revenue"), Some(&json!(1250.5)));
        assert_eq!(values.get("email_from"), Some(&json!("maria@acme.example")));
    }

    #[test]
    fn test_negative_revenue_rejected() {
        let lead = NewLead {
            expected_revenue: Some(dec!(-1)),
            ..NewLead::new("Fleet renewal")
        };
        assert!(matches!(lead.to_values(), Err(PortError::Validation { .. })));
    }
}
