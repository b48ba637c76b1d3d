//! Strongly-typed identifiers for ERP records
//!
//! The ERP identifies every row by a positive integer. Newtype wrappers keep
//! a partner id from being passed where an order id is expected, while
//! `RecordId` and `IdList` stay the untyped currency of the RPC layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Untyped ERP record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Wraps a raw ERP id
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw ERP id
    pub const fn get(&self) -> i64 {
        self.0
    }

    /// Extracts an id from an RPC result (`42` or `[42]`)
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().filter(|id| *id > 0).map(Self),
            Value::Array(items) if items.len() == 1 => Self::from_value(&items[0]),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<RecordId> for i64 {
    fn from(id: RecordId) -> i64 {
        id.0
    }
}

impl From<RecordId> for Value {
    fn from(id: RecordId) -> Value {
        Value::from(id.0)
    }
}

macro_rules! define_id {
    ($name:ident, $model:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(RecordId);

        impl $name {
            /// Wraps a raw ERP id
            pub const fn new(id: i64) -> Self {
                Self(RecordId::new(id))
            }

            /// Returns the raw ERP id
            pub const fn get(&self) -> i64 {
                self.0.get()
            }

            /// Returns the untyped record id
            pub const fn record_id(&self) -> RecordId {
                self.0
            }

            /// Returns the ERP model this identifier belongs to
            pub const fn model() -> &'static str {
                $model
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $model, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self::new(id)
            }
        }

        impl From<RecordId> for $name {
            fn from(id: RecordId) -> Self {
                Self(id)
            }
        }

        impl From<$name> for RecordId {
            fn from(id: $name) -> RecordId {
                id.0
            }
        }

        impl From<$name> for IdList {
            fn from(id: $name) -> IdList {
                IdList::from(id.0)
            }
        }

        impl From<$name> for Value {
            fn from(id: $name) -> Value {
                Value::from(id.0)
            }
        }
    };
}

define_id!(PartnerId, "res.partner");
define_id!(LeadId, "crm.lead");
define_id!(TicketId, "helpdesk.ticket");
define_id!(TeamId, "helpdesk.team");
define_id!(OrderId, "sale.order");
define_id!(ProductId, "product.product");
define_id!(TaskId, "project.task");
define_id!(ProjectId, "project.project");
define_id!(UserId, "res.users");

/// A normalized collection of record ids
///
/// Model methods such as `write` and `unlink` take a list of ids. Every
/// accepted input shape (a single id, an array, a vector) normalizes to
/// the same list so the RPC arguments are identical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdList(Vec<RecordId>);

impl IdList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.0.iter()
    }

    /// Converts to the JSON array sent over RPC
    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().map(|id| Value::from(*id)).collect())
    }
}

impl From<RecordId> for IdList {
    fn from(id: RecordId) -> Self {
        Self(vec![id])
    }
}

impl From<i64> for IdList {
    fn from(id: i64) -> Self {
        Self(vec![RecordId(id)])
    }
}

impl From<Vec<RecordId>> for IdList {
    fn from(ids: Vec<RecordId>) -> Self {
        Self(ids)
    }
}

impl From<Vec<i64>> for IdList {
    fn from(ids: Vec<i64>) -> Self {
        Self(ids.into_iter().map(RecordId).collect())
    }
}

impl From<&[i64]> for IdList {
    fn from(ids: &[i64]) -> Self {
        Self(ids.iter().copied().map(RecordId).collect())
    }
}

impl<const N: usize> From<[i64; N]> for IdList {
    fn from(ids: [i64; N]) -> Self {
        Self(ids.into_iter().map(RecordId).collect())
    }
}

impl FromIterator<RecordId> for IdList {
    fn from_iter<I: IntoIterator<Item = RecordId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
