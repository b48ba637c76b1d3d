//! Brazilian tax identifiers (CPF / CNPJ)
//!
//! Partners are looked up in the ERP by their `vat` field, which holds the
//! bare digits of a CPF (individuals, 11 digits) or CNPJ (companies, 14
//! digits). Callers often send the masked form (`12.345.678/0001-95`), so
//! the mask characters are stripped before the length check.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Kind of tax identifier, derived from the digit count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxIdKind {
    /// Individual taxpayer registry (11 digits)
    Cpf,
    /// National registry of legal entities (14 digits)
    Cnpj,
}

/// A validated tax identifier holding only digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaxId {
    digits: String,
    kind: TaxIdKind,
}

impl TaxId {
    /// Parses a tax identifier, accepting masked or bare input
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTaxId` when the input contains anything
    /// other than digits and mask characters, or when the digit count is
    /// neither 11 nor 14.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let mut digits = String::with_capacity(14);
        for c in input.trim().chars() {
            match c {
                '0'..='9' => digits.push(c),
                '.' | '/' | '-' | ' ' => {}
                other => {
                    return Err(CoreError::InvalidTaxId(format!(
                        "unexpected character '{}' in '{}'",
                        other, input
                    )))
                }
            }
        }

        let kind = match digits.len() {
            11 => TaxIdKind::Cpf,
            14 => TaxIdKind::Cnpj,
            n => {
                return Err(CoreError::InvalidTaxId(format!(
                    "expected 11 or 14 digits, got {} in '{}'",
                    n, input
                )))
            }
        };

        if digits.chars().all(|c| c == digits.as_bytes()[0] as char) {
            return Err(CoreError::InvalidTaxId(format!(
                "repeated digit sequence '{}'",
                digits
            )));
        }

        Ok(Self { digits, kind })
    }

    /// The bare digits, as stored in the ERP `vat` field
    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub fn kind(&self) -> TaxIdKind {
        self.kind
    }

    /// The conventional masked rendering
    pub fn formatted(&self) -> String {
        let d = &self.digits;
        match self.kind {
            TaxIdKind::Cpf => format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11]),
            TaxIdKind::Cnpj => format!(
                "{}.{}.{}/{}-{}",
                &d[0..2],
                &d[2..5],
                &d[5..8],
                &d[8..12],
                &d[12..14]
            ),
        }
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}

impl FromStr for TaxId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TaxId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TaxId> for String {
    fn from(id: TaxId) -> String {
        id.digits
    }
}
