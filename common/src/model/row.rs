use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell value.
///
/// Serialized untagged so rows read naturally in JSON: `null`, numbers and
/// strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Renders the value the way it is written to a CSV field. `Null` is the empty
/// string.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
        }
    }
}

/// One record of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Stable identifier: the primary key value, or the SQLite `rowid` for
    /// tables without a single-column primary key.
    pub id: Value,
    /// Values in the table's column order.
    pub values: Vec<Value>,
}

impl Row {
    pub fn to_fields(&self) -> Vec<String> {
        self.values.iter().map(|v| v.to_string()).collect()
    }
}
