//! ERP date and datetime handling
//!
//! The ERP exchanges timestamps as naive strings in UTC
//! (`2024-03-01 14:30:00`) and dates as `2024-03-01`. Some fields changed
//! from date to datetime between ERP versions, so the date parser accepts
//! either and keeps the calendar day.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::CoreError;

/// Wire format of ERP datetime fields
pub const ERP_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Wire format of ERP date fields
pub const ERP_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses an ERP datetime string as UTC
pub fn parse_erp_datetime(value: &str) -> Result<DateTime<Utc>, CoreError> {
    NaiveDateTime::parse_from_str(value.trim(), ERP_DATETIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| CoreError::InvalidDate {
            value: value.to_string(),
            expected: ERP_DATETIME_FORMAT,
        })
}

/// Parses an ERP date, tolerating a datetime value
pub fn parse_erp_date(value: &str) -> Result<NaiveDate, CoreError> {
    let value = value.trim();
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, ERP_DATE_FORMAT).map_err(|_| CoreError::InvalidDate {
        value: value.to_string(),
        expected: ERP_DATE_FORMAT,
    })
}

pub fn format_erp_datetime(value: &DateTime<Utc>) -> String {
    value.format(ERP_DATETIME_FORMAT).to_string()
}

pub fn format_erp_date(value: &NaiveDate) -> String {
    value.format(ERP_DATE_FORMAT).to_string()
}
