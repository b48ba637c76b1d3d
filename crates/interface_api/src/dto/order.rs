//! Sales order DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::temporal::parse_erp_date;
use core_kernel::{PartnerId, ProductId, TaxId};
use domain_sales::{NewOrder, NewOrderLine, OrderFilter, OrderState, SalesOrder};

use crate::dto::non_blank;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct OrderQuery {
    pub tax_id: Option<String>,
    pub state: Option<String>,
    /// `YYYY-MM-DD`
    pub date_from: Option<String>,
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl OrderQuery {
    pub fn into_filter(self) -> Result<OrderFilter, ApiError> {
        Ok(OrderFilter {
            tax_id: non_blank(self.tax_id)
                .map(|raw| TaxId::parse(&raw))
                .transpose()?,
            state: non_blank(self.state)
                .map(|raw| raw.parse::<OrderState>())
                .transpose()?,
            date_from: non_blank(self.date_from)
                .map(|raw| parse_erp_date(&raw))
                .transpose()?,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderLineRequest {
    #[validate(range(min = 1))]
    pub product_id: i64,
    pub quantity: Decimal,
    pub price_unit: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(range(min = 1))]
    pub partner_id: i64,
    #[validate(length(min = 1), nested)]
    pub lines: Vec<OrderLineRequest>,
    #[validate(length(max = 64))]
    pub client_order_ref: Option<String>,
}

impl From<CreateOrderRequest> for NewOrder {
    fn from(request: CreateOrderRequest) -> Self {
        NewOrder {
            partner_id: PartnerId::new(request.partner_id),
            lines: request
                .lines
                .into_iter()
                .map(|line| NewOrderLine {
                    product_id: ProductId::new(line.product_id),
                    quantity: line.quantity,
                    price_unit: line.price_unit,
                })
                .collect(),
            client_order_ref: request.client_order_ref,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<SalesOrder>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_create_request_keeps_decimal_quantities() {
        let request: CreateOrderRequest = serde_json::from_value(json!({
            "partner_id": 1,
            "lines": [
                {"product_id": 10, "quantity": "2.5", "price_unit": "19.90"},
                {"product_id": 11, "quantity": "1"}
            ]
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let order = NewOrder::from(request);
        assert_eq!(order.partner_id, PartnerId::new(1));
        assert_eq!(
            order.lines,
            vec![
                NewOrderLine {
                    product_id: ProductId::new(10),
                    quantity: dec!(2.5),
                    price_unit: Some(dec!(19.9)),
                },
                NewOrderLine {
                    product_id: ProductId::new(11),
                    quantity: dec!(1),
                    price_unit: None,
                },
            ]
        );
    }

    #[test]
    fn test_create_request_requires_lines() {
        let request: CreateOrderRequest =
            serde_json::from_value(json!({"partner_id": 1, "lines": []})).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("lines"));
    }

    #[test]
    fn test_query_parses_date_and_state() {
        let query = OrderQuery {
            state: Some("sale".into()),
            date_from: Some("2024-05-01".into()),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.state, Some(OrderState::Sale));
        assert_eq!(filter.date_from, NaiveDate::from_ymd_opt(2024, 5, 1));
    }
}
