//! Core value types stored in row indexes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle identifying a row's slot inside the index that issued it.
///
/// A key is `slot position + 1`, so `0` is never a valid key and is used
/// for rows that have not been stored yet. Keys are only unique among the
/// live rows of one index: a freed slot hands its key to a later insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(pub(crate) usize);

impl Key {
    /// The key carried by rows that have not been added to an index.
    pub const UNASSIGNED: Key = Key(0);

    /// Create a key from its raw integer form.
    pub fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Build the key for a zero-based slot position.
    pub(crate) fn from_position(position: usize) -> Self {
        Self(position + 1)
    }

    /// The zero-based slot position, or `None` for the unassigned key.
    pub(crate) fn position(&self) -> Option<usize> {
        self.0.checked_sub(1)
    }

    /// Raw integer form of the key.
    pub fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single scalar stored in a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Text(String),
    Boolean(bool),
}

impl Value {
    /// Short name of the value's tag, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
        }
    }
}

/// Text form used on the wire and in the CLI.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(true) => write!(f, "t"),
            Value::Boolean(false) => write!(f, "f"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// An ordered list of values aligned with a table's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub key: Key,
    pub values: Vec<Value>,
}

impl Row {
    /// Create a row that has not been stored yet.
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            key: Key::UNASSIGNED,
            values,
        }
    }

    /// Copy of this row carrying a different key.
    pub fn with_key(&self, key: Key) -> Self {
        Self {
            key,
            values: self.values.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }
}

/// Build a [`Row`] from a list of values convertible into [`Value`].
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::storage::Row::new(vec![$($crate::storage::Value::from($value)),*])
    };
}
