//! Search domains and query options for ERP model methods
//!
//! The ERP filters records with a *domain*: a JSON list of
//! `[field, operator, value]` triples that are implicitly AND-ed. This
//! module builds domains, the keyword arguments of `search_read`, and the
//! command triples used to write relational (one2many/many2many) fields.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// An untyped ERP row as returned by `search_read`
pub type Record = Map<String, Value>;

/// Comparison operators understood by the ERP's domain evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    ILike,
    In,
    NotIn,
    ChildOf,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Like => "like",
            Operator::ILike => "ilike",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::ChildOf => "child_of",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A search domain
///
/// # Example
///
/// ```rust
/// use core_kernel::query::{Domain, Operator};
/// use serde_json::json;
///
/// let domain = Domain::new()
///     .eq("vat", "12345678000195")
///     .filter("customer_rank", Operator::Gt, 0);
///
/// assert_eq!(
///     domain.to_value(),
///     json!([["vat", "=", "12345678000195"], ["customer_rank", ">", 0]])
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domain {
    terms: Vec<Value>,
}

impl Domain {
    /// An empty domain matches every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `[field, operator, value]` condition
    pub fn filter(mut self, field: &str, op: Operator, value: impl Into<Value>) -> Self {
        self.terms.push(Value::Array(vec![
            Value::from(field),
            Value::from(op.as_str()),
            value.into(),
        ]));
        self
    }

    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::Eq, value)
    }

    pub fn ilike(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::ILike, value)
    }

    pub fn is_in<V: Into<Value>>(self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter(field, Operator::In, Value::Array(values))
    }

    /// Appends a condition only when `value` is present
    pub fn filter_opt<V: Into<Value>>(self, field: &str, op: Operator, value: Option<V>) -> Self {
        match value {
            Some(v) => self.filter(field, op, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// The JSON form sent as the first positional argument
    pub fn to_value(&self) -> Value {
        Value::Array(self.terms.clone())
    }
}

impl From<Domain> for Value {
    fn from(domain: Domain) -> Value {
        Value::Array(domain.terms)
    }
}

impl Serialize for Domain {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.terms.serialize(serializer)
    }
}

/// Optional keyword arguments of `search_read`
///
/// The ERP treats an absent key differently from an explicit default, so
/// `to_kwargs` only emits the keys that were actually set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchReadOptions {
    pub fields: Option<Vec<String>>,
    pub limit: Option<u32>,
    pub offset: u32,
    pub order: Option<String>,
}

impl SearchReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.fields = Some(fields.iter().map(|f| f.as_ref().to_string()).collect());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Sets limit/offset from optional pagination parameters
    pub fn paginate(mut self, limit: Option<u32>, offset: Option<u32>) -> Self {
        self.limit = limit;
        self.offset = offset.unwrap_or(0);
        self
    }

    /// Builds the keyword-argument map for the RPC call
    pub fn to_kwargs(&self) -> Map<String, Value> {
        let mut kwargs = Map::new();
        if let Some(fields) = &self.fields {
            kwargs.insert(
                "fields".to_string(),
                Value::Array(fields.iter().cloned().map(Value::String).collect()),
            );
        }
        if let Some(limit) = self.limit {
            kwargs.insert("limit".to_string(), Value::from(limit));
        }
        if self.offset != 0 {
            kwargs.insert("offset".to_string(), Value::from(self.offset));
        }
        if let Some(order) = &self.order {
            kwargs.insert("order".to_string(), Value::String(order.clone()));
        }
        kwargs
    }
}

/// Write commands for relational fields
///
/// One2many and many2many fields are written with `[code, id, values]`
/// triples rather than plain values.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a new related record from `values`
    Create(Record),
    /// Update the related record `id` with `values`
    Update(i64, Record),
    /// Delete the related record
    Delete(i64),
    /// Link an existing record
    Link(i64),
    /// Replace the whole set with the given ids
    Set(Vec<i64>),
}

impl Command {
    pub fn to_value(&self) -> Value {
        match self {
            Command::Create(values) => {
                Value::Array(vec![0.into(), 0.into(), Value::Object(values.clone())])
            }
            Command::Update(id, values) => {
                Value::Array(vec![1.into(), (*id).into(), Value::Object(values.clone())])
            }
            Command::Delete(id) => Value::Array(vec![2.into(), (*id).into(), 0.into()]),
            Command::Link(id) => Value::Array(vec![4.into(), (*id).into(), 0.into()]),
            Command::Set(ids) => Value::Array(vec![
                6.into(),
                0.into(),
                Value::Array(ids.iter().map(|id| Value::from(*id)).collect()),
            ]),
        }
    }

    /// Serializes a list of commands for a relational field value
    pub fn list(commands: &[Command]) -> Value {
        Value::Array(commands.iter().map(Command::to_value).collect())
    }
}
