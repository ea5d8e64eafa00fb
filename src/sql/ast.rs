//! Internal AST types for slotdb SQL.
//!
//! These types are simplified representations of SQL statements
//! that the query planner understands.

use std::fmt;

use crate::storage::Value;

/// A parsed SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// SELECT statement.
    Select(Select),
    /// A statement sqlparser understands but slotdb does not run
    /// (INSERT, UPDATE, DELETE). Holds the statement keyword.
    Unsupported(&'static str),
}

impl Statement {
    /// Statement keyword, for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Select(_) => "SELECT",
            Statement::Unsupported(keyword) => *keyword,
        }
    }
}

/// SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub columns: Vec<SelectColumn>,
    pub from: String,
    /// Conditions joined by AND; empty when there is no WHERE clause.
    pub conditions: Vec<Condition>,
}

impl Select {
    pub fn has_where(&self) -> bool {
        !self.conditions.is_empty()
    }
}

/// A column in SELECT clause.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectColumn {
    /// SELECT *
    Wildcard,
    /// SELECT column_name
    Column(String),
}

/// `column <op> literal` in a WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: ComparisonOp,
    pub value: LiteralValue,
}

/// Comparison operators recognised by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::LtEq => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::GtEq => ">=",
        };
        write!(f, "{}", s)
    }
}

/// Literal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralValue {
    Integer(i64),
    String(String),
    Boolean(bool),
}

impl LiteralValue {
    /// Convert to a storage value.
    pub fn to_value(&self) -> Value {
        match self {
            LiteralValue::Integer(n) => Value::Integer(*n),
            LiteralValue::String(s) => Value::Text(s.clone()),
            LiteralValue::Boolean(b) => Value::Boolean(*b),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Integer(n) => write!(f, "{}", n),
            LiteralValue::String(s) => write!(f, "'{}'", s),
            LiteralValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}
