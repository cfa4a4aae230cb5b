use crate::model::row::{Row, Value};
use serde::{Deserialize, Serialize};

/// The storage type of a column, derived from the declared SQLite type.
///
/// SQLite only knows type affinities, so the declared type is mapped with the
/// same substring rules SQLite applies: anything containing `INT` is an
/// integer, `REAL`/`FLOA`/`DOUB` is a real, and everything else is kept as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
}

impl ColumnType {
    pub fn from_declared(declared: &str) -> Self {
        let declared = declared.to_ascii_uppercase();
        if declared.contains("INT") {
            ColumnType::Integer
        } else if declared.contains("REAL") || declared.contains("FLOA") || declared.contains("DOUB")
        {
            ColumnType::Real
        } else {
            ColumnType::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub not_null: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            not_null: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Parses one raw field into a typed value for this column.
    ///
    /// An empty field is `Null`, except for NOT NULL text columns where it is
    /// kept as an empty string. Typed columns reject anything that does not
    /// parse.
    pub fn parse_value(&self, raw: &str) -> Result<Value, String> {
        if raw.is_empty() {
            return match (self.column_type, self.not_null) {
                (ColumnType::Text, true) => Ok(Value::Text(String::new())),
                (_, true) => Err(format!("column '{}' must not be empty", self.name)),
                (_, false) => Ok(Value::Null),
            };
        }

        match self.column_type {
            ColumnType::Text => Ok(Value::Text(raw.to_string())),
            ColumnType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| format!("column '{}': '{}' is not an integer", self.name, raw)),
            ColumnType::Real => match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Value::Real(v)),
                _ => Err(format!("column '{}': '{}' is not a number", self.name, raw)),
            },
        }
    }
}

/// A named table schema backing a collection of rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Columns in schema order. Exports and row values follow this order.
    pub columns: Vec<Column>,
    /// The single-column primary key, if the table has one. Tables without it
    /// are addressed by SQLite's `rowid`.
    pub primary_key: Option<String>,
}

impl Table {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn primary_key_index(&self) -> Option<usize> {
        self.primary_key
            .as_deref()
            .and_then(|pk| self.column_index(pk))
    }
}

/// A table together with its rows, as returned by the detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableContents {
    pub table: Table,
    pub rows: Vec<Row>,
}
