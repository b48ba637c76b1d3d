//! Monetary values with precise decimal arithmetic
//!
//! The ERP serializes monetary and percentage fields as floating point
//! numbers. They are converted to `Decimal` at the boundary and rounded to
//! the currency precision so downstream consumers never see `0.30000000000000004`.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places used for monetary amounts
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Converts an ERP float to a decimal rounded to `dp` places
///
/// Non-finite values (which the ERP never sends for monetary fields)
/// become zero.
pub fn decimal_from_erp(value: f64, dp: u32) -> Decimal {
    Decimal::from_f64(value)
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a decimal back to the float the ERP expects
pub fn decimal_to_erp(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// A monetary amount in a given currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount: amount.round_dp(MONEY_DECIMAL_PLACES),
            currency: currency.into(),
        }
    }

    /// Builds an amount from an ERP float
    pub fn from_erp(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            amount: decimal_from_erp(amount, MONEY_DECIMAL_PLACES),
            currency: currency.into(),
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", self.currency, self.amount)
    }
}
