//! Typed comparison of a row's column against a literal.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::catalog::Column;
use crate::sql::ComparisonOp;
use crate::storage::{Row, Value};

/// Column name to position within a node's output schema.
pub type ColumnMap = HashMap<String, usize>;

/// Build the name-to-position map for a column list. The first column with
/// a given name wins.
pub fn column_map(columns: &[Column]) -> ColumnMap {
    let mut map = ColumnMap::with_capacity(columns.len());
    for (position, column) in columns.iter().enumerate() {
        map.entry(column.name.clone()).or_insert(position);
    }
    map
}

/// Relation between a column value and a literal.
///
/// Only [`Relation::Equal`] has execution semantics; the other tags never
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl From<ComparisonOp> for Relation {
    fn from(op: ComparisonOp) -> Self {
        match op {
            ComparisonOp::Eq => Relation::Equal,
            ComparisonOp::NotEq => Relation::NotEqual,
            ComparisonOp::Lt => Relation::Less,
            ComparisonOp::LtEq => Relation::LessOrEqual,
            ComparisonOp::Gt => Relation::Greater,
            ComparisonOp::GtEq => Relation::GreaterOrEqual,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relation::Equal => "=",
            Relation::NotEqual => "<>",
            Relation::Less => "<",
            Relation::LessOrEqual => "<=",
            Relation::Greater => ">",
            Relation::GreaterOrEqual => ">=",
        };
        write!(f, "{}", s)
    }
}

/// `column relation literal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub relation: Relation,
    pub literal: Value,
}

impl Condition {
    pub fn new(column: impl Into<String>, relation: Relation, literal: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            relation,
            literal: literal.into(),
        }
    }

    /// Check this condition against a row.
    ///
    /// Unresolved columns and literals whose type differs from the column's
    /// kind evaluate to `false`; both are rejected earlier at prepare time.
    pub fn eval(&self, row: &Row, columns_by_name: &ColumnMap, columns: &[Column]) -> bool {
        let Some(&position) = columns_by_name.get(&self.column) else {
            return false;
        };
        let Some(column) = columns.get(position) else {
            return false;
        };
        if !column.kind.matches(&self.literal) {
            return false;
        }
        match row.get(position) {
            Some(value) => compare(self.relation, value, &self.literal),
            None => false,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Value::Text(s) => write!(f, "{} {} '{}'", self.column, self.relation, s),
            other => write!(f, "{} {} {}", self.column, self.relation, other),
        }
    }
}

/// Logical AND of all conditions; an empty list accepts every row.
pub fn eval_all(conditions: &[Condition], row: &Row, columns_by_name: &ColumnMap, columns: &[Column]) -> bool {
    conditions
        .iter()
        .all(|condition| condition.eval(row, columns_by_name, columns))
}

fn compare(relation: Relation, a: &Value, b: &Value) -> bool {
    trace!(left = ?a, %relation, right = ?b, "comparing");
    match relation {
        Relation::Equal => a == b,
        _ => false,
    }
}
