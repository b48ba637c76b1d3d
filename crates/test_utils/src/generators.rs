//! Property-Based Test Generators
//!
//! Provides proptest strategies for ERP ids, Brazilian tax ids and raw
//! partner rows.

use proptest::prelude::*;
use serde_json::{json, Value};

use core_kernel::{IdList, RecordId};

/// Strategy for valid ERP record ids
pub fn record_id_strategy() -> impl Strategy<Value = i64> {
    1i64..=i64::from(i32::MAX)
}

/// Strategy for non-empty id lists
pub fn id_list_strategy() -> impl Strategy<Value = IdList> {
    prop::collection::vec(record_id_strategy(), 1..10)
        .prop_map(|ids| ids.into_iter().map(RecordId::new).collect())
}

/// Strategy for 11-digit CPFs that are not a repeated digit
pub fn cpf_strategy() -> impl Strategy<Value = String> {
    "[1-9][0-9]{9}0"
}

/// Strategy for 14-digit CNPJs that are not a repeated digit
pub fn cnpj_strategy() -> impl Strategy<Value = String> {
    "[1-9][0-9]{12}0"
}

/// Strategy for CNPJs written with the usual `00.000.000/0000-00` mask
pub fn masked_cnpj_strategy() -> impl Strategy<Value = (String, String)> {
    cnpj_strategy().prop_map(|digits| {
        let masked = format!(
            "{}.{}.{}/{}-{}",
            &digits[0..2],
            &digits[2..5],
            &digits[5..8],
            &digits[8..12],
            &digits[12..14]
        );
        (masked, digits)
    })
}

/// Strategy for strings that are never a valid tax id
pub fn malformed_tax_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,10}",
        "[0-9]{12,13}",
        "[0-9]{15,20}",
        "[0-9]{5}[a-zA-Z]{1,3}[0-9]{6}",
    ]
}

/// Strategy for ERP field values that may be `false`
pub fn optional_text_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![Just(Value::Bool(false)), "[A-Za-z ]{1,30}".prop_map(Value::from)]
}

/// Strategy for raw `res.partner` rows as `search_read` returns them
pub fn partner_row_strategy() -> impl Strategy<Value = Value> {
    (
        record_id_strategy(),
        "[A-Z][a-z]{2,20}",
        prop_oneof![Just(Value::Bool(false)), cnpj_strategy().prop_map(Value::from)],
        optional_text_strategy(),
        optional_text_strategy(),
    )
        .prop_map(|(id, name, vat, email, city)| {
            json!({
                "id": id,
                "name": name,
                "vat": vat,
                "email": email,
                "phone": false,
                "city": city,
                "state_id": false,
                "country_id": false,
                "is_company": true
            })
        })
}
