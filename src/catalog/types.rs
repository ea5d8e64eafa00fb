//! Column kinds and column definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::storage::Value;

/// Declared kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 64-bit signed integers (BIGINT in SQL).
    Integer,
    /// Text/string data.
    Text,
    /// Boolean values.
    Boolean,
}

impl DataType {
    /// Check if a value's tag matches this kind.
    pub fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (DataType::Integer, Value::Integer(_))
                | (DataType::Text, Value::Text(_))
                | (DataType::Boolean, Value::Boolean(_))
        )
    }

    /// Get the SQL name for this type.
    pub fn sql_name(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
            DataType::Boolean => "BOOLEAN",
        }
    }

    /// PostgreSQL type OID reported in row descriptions.
    pub fn pg_oid(&self) -> i32 {
        match self {
            DataType::Integer => 20,
            DataType::Text => 25,
            DataType::Boolean => 16,
        }
    }

    /// PostgreSQL type length; `-1` for variable-length types.
    pub fn pg_len(&self) -> i16 {
        match self {
            DataType::Integer => 8,
            DataType::Text => -1,
            DataType::Boolean => 1,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql_name())
    }
}

/// A named, typed column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Declared kind.
    pub kind: DataType,
}

impl Column {
    /// Create a new column.
    pub fn new(name: impl Into<String>, kind: DataType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Shorthand for an integer column.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Integer)
    }

    /// Shorthand for a text column.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Text)
    }

    /// Shorthand for a boolean column.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Boolean)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.kind)
    }
}
