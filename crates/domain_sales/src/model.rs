//! Sales order model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use core_kernel::erp_serde::{erp_datetime_opt, erp_money, falsy_as_none};
use core_kernel::temporal::format_erp_date;
use core_kernel::money::decimal_to_erp;
use core_kernel::{
    Command, CoreError, Domain, Many2One, Operator, OrderId, PartnerId, PortError, ProductId,
    Record, SearchReadOptions, TaxId,
};

pub const MODEL: &str = "sale.order";

pub const ORDER_FIELDS: &[&str] = &[
    "name",
    "partner_id",
    "state",
    "date_order",
    "amount_untaxed",
    "amount_tax",
    "amount_total",
    "currency_id",
    "user_id",
    "client_order_ref",
];

pub const DEFAULT_LIMIT: u32 = 80;

/// Lifecycle state of a sales order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// Quotation
    Draft,
    /// Quotation sent to the customer
    Sent,
    /// Confirmed order
    Sale,
    /// Locked
    Done,
    Cancel,
    /// A state added by an ERP customization
    #[serde(other)]
    Unknown,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Draft => "draft",
            OrderState::Sent => "sent",
            OrderState::Sale => "sale",
            OrderState::Done => "done",
            OrderState::Cancel => "cancel",
            OrderState::Unknown => "unknown",
        }
    }

    /// Whether the order can still be confirmed
    pub fn is_quotation(&self) -> bool {
        matches!(self, OrderState::Draft | OrderState::Sent)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(OrderState::Draft),
            "sent" => Ok(OrderState::Sent),
            "sale" => Ok(OrderState::Sale),
            "done" => Ok(OrderState::Done),
            "cancel" => Ok(OrderState::Cancel),
            other => Err(CoreError::validation(format!("unknown order state '{}'", other))),
        }
    }
}

/// A sales order header as exposed by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: OrderId,
    #[serde(rename(deserialize = "name", serialize = "reference"))]
    pub reference: String,
    #[serde(
        rename(deserialize = "partner_id", serialize = "customer"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer: Option<Many2One>,
    pub state: OrderState,
    #[serde(
        rename(deserialize = "date_order", serialize = "ordered_at"),
        default,
        deserialize_with = "erp_datetime_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub ordered_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "erp_money")]
    pub amount_untaxed: Decimal,
    #[serde(default, deserialize_with = "erp_money")]
    pub amount_tax: Decimal,
    #[serde(default, deserialize_with = "erp_money")]
    pub amount_total: Decimal,
    #[serde(
        rename(deserialize = "currency_id", serialize = "currency"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub currency: Option<Many2One>,
    #[serde(
        rename(deserialize = "user_id", serialize = "salesperson"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub salesperson: Option<Many2One>,
    #[serde(
        rename(deserialize = "client_order_ref", serialize = "customer_reference"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_reference: Option<String>,
}

/// Sales order search criteria
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub tax_id: Option<TaxId>,
    pub state: Option<OrderState>,
    /// Orders placed on or after this day (UTC)
    pub date_from: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl OrderFilter {
    pub fn to_domain(&self) -> Domain {
        let since = self
            .date_from
            .map(|day| format!("{} 00:00:00", format_erp_date(&day)));
        Domain::new()
            .filter_opt(
                "partner_id.vat",
                Operator::Eq,
                self.tax_id.as_ref().map(|t| t.digits().to_string()),
            )
            .filter_opt("state", Operator::Eq, self.state.map(|s| s.as_str()))
            .filter_opt("date_order", Operator::Ge, since)
    }

    pub fn options(&self) -> SearchReadOptions {
        SearchReadOptions::new()
            .fields(ORDER_FIELDS)
            .paginate(Some(self.limit.unwrap_or(DEFAULT_LIMIT)), self.offset)
            .order("date_order desc")
    }
}

/// One product line of a new order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: Decimal,
    /// Overrides the pricelist price when set
    pub price_unit: Option<Decimal>,
}

impl NewOrderLine {
    fn to_values(&self) -> Record {
        let mut values = Record::new();
        values.insert("product_id".to_string(), Value::from(self.product_id));
        values.insert(
            "product_uom_qty".to_string(),
            Value::from(decimal_to_erp(self.quantity)),
        );
        if let Some(price) = self.price_unit {
            values.insert("price_unit".to_string(), Value::from(decimal_to_erp(price)));
        }
        values
    }
}

/// Values for a new quotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub partner_id: PartnerId,
    pub lines: Vec<NewOrderLine>,
    pub client_order_ref: Option<String>,
}

impl NewOrder {
    /// # Errors
    ///
    /// Returns a validation error when there are no lines, or a line has a
    /// non-positive quantity or a negative price
    pub fn to_values(&self) -> Result<Record, PortError> {
        if self.lines.is_empty() {
            return Err(PortError::validation_field(
                "An order needs at least one line",
                "lines",
            ));
        }
        for line in &self.lines {
            if line.quantity <= Decimal::ZERO {
                return Err(PortError::validation_field(
                    format!("Quantity for product {} must be positive", line.product_id),
                    "quantity",
                ));
            }
            if line.price_unit.is_some_and(|p| p.is_sign_negative()) {
                return Err(PortError::validation_field(
                    format!("Price for product {} cannot be negative", line.product_id),
                    "price_unit",
                ));
            }
        }

        let commands: Vec<Command> = self
            .lines
            .iter()
            .map(|line| Command::Create(line.to_values()))
            .collect();

        let mut values = Record::new();
        values.insert("partner_id".to_string(), Value::from(self.partner_id));
        values.insert("order_line".to_string(), Command::list(&commands));
        if let Some(reference) = &self.client_order_ref {
            values.insert("client_order_ref".to_string(), Value::from(reference.as_str()));
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
    use test_utils::{record, RecordFixtures, ACME_CNPJ};

    #[test]
    fn test_order_decoding() {
        let order: SalesOrder =
            from_record(MODEL, record(RecordFixtures::order(21, "S00021", "sale"))).unwrap();

        assert_eq!(order.state, OrderState::Sale);
        assert_eq!(order.amount_total, dec!(1180));
        assert_eq!(order.currency, Some(Many2One::new(6, "BRL")));
        assert!(order.customer_reference.is_none());

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["reference"], json!("S00021"));
        assert_eq!(value["salesperson"], json!({"id": 5, "name": "Paula Sales"}));
        assert!(value.get("name").is_none());
    }

    #[test]
    fn test_unknown_state_is_tolerated() {
        let order: SalesOrder =
            from_record(MODEL, record(RecordFixtures::order(22, "S00022", "waiting_approval"))).unwrap();
        assert_eq!(order.state, OrderState::Unknown);
        assert!(!order.state.is_quotation());
    }

    #[test]
    fn test_state_parsing() {
        assert_eq!("SENT".parse::<OrderState>().unwrap(), OrderState::Sent);
        assert!("unknown".parse::<OrderState>().is_err());
    }

    #[test]
    fn test_filter_domain() {
        let filter = OrderFilter {
            tax_id: Some(TaxId::parse(ACME_CNPJ).unwrap()),
            state: Some(OrderState::Sale),
            date_from: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..Default::default()
        };
        assert_eq!(
            filter.to_domain().to_value(),
            json!([
                ["partner_id.vat", "=", ACME_CNPJ],
                ["state", "=", "sale"],
                ["date_order", ">=", "2024-05-01 00:00:00"]
            ])
        );
    }

    #[test]
    fn test_new_order_uses_create_commands() {
        let order = NewOrder {
            partner_id: PartnerId::new(1),
            lines: vec![NewOrderLine {
                product_id: ProductId::new(30),
                quantity: dec!(2),
                price_unit: Some(dec!(99.90)),
            }],
            client_order_ref: Some("PO-778".to_string()),
        };
        let values = order.to_values().unwrap();

        assert_eq!(values.get("partner_id"), Some(&json!(1)));
        assert_eq!(
            values.get("order_line"),
            Some(&json!([[0, 0, {"product_id": 30, "product_uom_qty": 2.0, "price_unit": 99.9}]]))
        );
        assert_eq!(values.get("client_order_ref"), Some(&json!("PO-778")));
    }

    #[test]
    fn test_new_order_validation() {
        let empty = NewOrder {
            partner_id: PartnerId::new(1),
            lines: vec![],
            client_order_ref: None,
        };
        assert!(matches!(empty.to_values(), Err(PortError::Validation { .. })));

        let zero = NewOrder {
            lines: vec![NewOrderLine {
                product_id: ProductId::new(30),
                quantity: Decimal::ZERO,
                price_unit: None,
            }],
            ..empty
        };
        assert!(matches!(zero.to_values(), Err(PortError::Validation { .. })));
    }
}
