use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GatewayError;

/// Core value type for column values and bind parameters.
///
/// Engine BLOBs are decoded to `Text` via lossy UTF-8; the gateway never
/// surfaces raw bytes to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// Decode an engine column value.
    pub(crate) fn from_column(raw: ValueRef<'_>) -> Self {
        match raw {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Text(String::from_utf8_lossy(b).into_owned()),
        }
    }
}

/// Renders the text form used when binding parameters: everything is bound
/// as text and left to the engine's type affinity.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(t) => f.write_str(t),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// The host's dynamic representation: an ordered, possibly nested list of
/// text-representable scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostValue {
    Scalar(Value),
    List(Vec<HostValue>),
}

impl HostValue {
    /// Build a two-element `[name, value]` pair.
    pub fn pair(name: &str, value: impl Into<Value>) -> Self {
        HostValue::List(vec![
            HostValue::Scalar(Value::Text(name.to_string())),
            HostValue::Scalar(value.into()),
        ])
    }

    /// Interpret this element as a `[name, value]` pair.
    ///
    /// Any shape other than a two-element list of scalars is malformed.
    pub(crate) fn as_pair(&self) -> Result<(String, Value), GatewayError> {
        let HostValue::List(items) = self else {
            return Err(GatewayError::MalformedPairs);
        };
        let [HostValue::Scalar(name), HostValue::Scalar(value)] = items.as_slice() else {
            return Err(GatewayError::MalformedPairs);
        };
        Ok((name.to_string(), value.clone()))
    }
}

impl From<Value> for HostValue {
    fn from(v: Value) -> Self {
        HostValue::Scalar(v)
    }
}

impl From<&str> for HostValue {
    fn from(v: &str) -> Self {
        HostValue::Scalar(Value::Text(v.to_string()))
    }
}

/// An ordered result set: column names plus rows of column values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rows {
    pub column_names: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Rows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Project into the host shape.
    ///
    /// A single selected column yields a flat list of values, one per row;
    /// multiple columns yield a list of rows, each a list of values. With
    /// `return_column_names` every value becomes the two-element list
    /// `[column_name, value]`.
    pub fn into_host(self, return_column_names: bool) -> Vec<HostValue> {
        let single_column = self.column_names.len() == 1;
        let mut out = Vec::with_capacity(self.rows.len());
        for row in self.rows {
            if single_column {
                let value = row.into_iter().next().unwrap_or(Value::Null);
                out.push(cell(&self.column_names[0], value, return_column_names));
            } else {
                let cells = row
                    .into_iter()
                    .zip(&self.column_names)
                    .map(|(value, name)| cell(name, value, return_column_names))
                    .collect();
                out.push(HostValue::List(cells));
            }
        }
        out
    }
}

fn cell(name: &str, value: Value, return_column_names: bool) -> HostValue {
    if return_column_names {
        HostValue::pair(name, value)
    } else {
        HostValue::Scalar(value)
    }
}
