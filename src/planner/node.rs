//! Operator tree nodes.
//!
//! Each node binds to its child's output schema in `prepare` and produces a
//! pull-based row iterator in `iter`. The tree borrows the table it scans,
//! so a plan never outlives the catalog lock it was built under.

use std::fmt;

use tracing::trace;

use super::condition::{column_map, eval_all, ColumnMap, Condition};
use super::error::{PlanError, PlanResult};
use crate::catalog::Column;
use crate::sql::SelectColumn;
use crate::storage::{Index, Row, RowIterator, StorageError, StorageResult, Table};

/// Boxed row iterator handed out by plan nodes.
pub type BoxedRows<'p> = Box<dyn RowIterator + Send + 'p>;

/// A node of the operator tree.
pub enum PlanNode<'a> {
    TableScan(TableScan<'a>),
    Select(SelectNode<'a>),
    Projection(Projection<'a>),
}

impl<'a> PlanNode<'a> {
    /// Prepare the subtree depth-first: children bind before their parent.
    pub fn prepare(&mut self) -> PlanResult<()> {
        match self {
            PlanNode::TableScan(scan) => scan.prepare(),
            PlanNode::Select(select) => {
                select.child.prepare()?;
                let child_columns = select.child.columns().to_vec();
                select.bind(child_columns)
            }
            PlanNode::Projection(projection) => {
                projection.child.prepare()?;
                let child_columns = projection.child.columns().to_vec();
                projection.bind(child_columns)
            }
        }
    }

    /// Output schema. Empty until prepared.
    pub fn columns(&self) -> &[Column] {
        match self {
            PlanNode::TableScan(scan) => &scan.columns,
            PlanNode::Select(select) => select
                .binding
                .as_ref()
                .map(|binding| binding.columns.as_slice())
                .unwrap_or(&[]),
            PlanNode::Projection(projection) => projection
                .binding
                .as_ref()
                .map(|binding| binding.columns.as_slice())
                .unwrap_or(&[]),
        }
    }

    pub fn is_prepared(&self) -> bool {
        match self {
            PlanNode::TableScan(scan) => scan.index.is_some(),
            PlanNode::Select(select) => select.binding.is_some(),
            PlanNode::Projection(projection) => projection.binding.is_some(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlanNode::TableScan(_) => "TableScan",
            PlanNode::Select(_) => "Select",
            PlanNode::Projection(_) => "Projection",
        }
    }

    pub fn child(&self) -> Option<&PlanNode<'a>> {
        match self {
            PlanNode::TableScan(_) => None,
            PlanNode::Select(select) => Some(&select.child),
            PlanNode::Projection(projection) => Some(&projection.child),
        }
    }

    /// Start a fresh pass over this node's output.
    pub fn iter(&self) -> PlanResult<BoxedRows<'_>> {
        match self {
            PlanNode::TableScan(scan) => scan.iter(),
            PlanNode::Select(select) => select.iter(),
            PlanNode::Projection(projection) => projection.iter(),
        }
    }

    fn format_node(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        match self {
            PlanNode::TableScan(scan) => {
                write!(f, "{}TableScan: {}", pad, scan.table_name)?;
                if let Some(index) = scan.index {
                    write!(f, " using {} ({} rows)", index.name(), index.size())?;
                }
            }
            PlanNode::Select(select) => {
                let conditions: Vec<String> =
                    select.conditions.iter().map(|c| c.to_string()).collect();
                write!(f, "{}Select: {}", pad, conditions.join(" AND "))?;
            }
            PlanNode::Projection(projection) => {
                let attributes: Vec<&str> = projection
                    .attributes
                    .iter()
                    .map(|a| match a {
                        SelectColumn::Wildcard => "*",
                        SelectColumn::Column(name) => name.as_str(),
                    })
                    .collect();
                write!(f, "{}Projection: [{}]", pad, attributes.join(", "))?;
            }
        }
        if let Some(child) = self.child() {
            writeln!(f)?;
            child.format_node(f, indent + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for PlanNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.format_node(f, 0)
    }
}

impl fmt::Debug for PlanNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Leaf: full scan of a table's primary index.
pub struct TableScan<'a> {
    table_name: String,
    table: &'a Table,
    index: Option<&'a dyn Index>,
    columns: Vec<Column>,
}

impl<'a> TableScan<'a> {
    pub fn new(table_name: impl Into<String>, table: &'a Table) -> Self {
        Self {
            table_name: table_name.into(),
            table,
            index: None,
            columns: Vec::new(),
        }
    }

    fn prepare(&mut self) -> PlanResult<()> {
        let table: &'a Table = self.table;
        let index = table
            .primary_index()
            .ok_or_else(|| PlanError::TableNotPersistent(self.table_name.clone()))?;
        self.index = Some(index);
        self.columns = table.columns().to_vec();
        Ok(())
    }

    fn iter(&self) -> PlanResult<BoxedRows<'a>> {
        let index = self.index.ok_or(PlanError::NotPrepared("TableScan"))?;
        trace!(table = %self.table_name, index = index.name(), "opening scan");
        Ok(index.iter())
    }
}

/// Filter: passes through child rows that satisfy every condition.
pub struct SelectNode<'a> {
    child: Box<PlanNode<'a>>,
    conditions: Vec<Condition>,
    binding: Option<SelectBinding>,
}

struct SelectBinding {
    columns_by_name: ColumnMap,
    columns: Vec<Column>,
}

impl<'a> SelectNode<'a> {
    pub fn new(child: PlanNode<'a>, conditions: Vec<Condition>) -> Self {
        Self {
            child: Box::new(child),
            conditions,
            binding: None,
        }
    }

    fn bind(&mut self, columns: Vec<Column>) -> PlanResult<()> {
        let columns_by_name = column_map(&columns);
        for condition in &self.conditions {
            let position = *columns_by_name
                .get(&condition.column)
                .ok_or_else(|| PlanError::UnknownColumn(condition.column.clone()))?;
            let column = &columns[position];
            if !column.kind.matches(&condition.literal) {
                return Err(PlanError::TypeMismatch {
                    column: column.name.clone(),
                    expected: column.kind.to_string(),
                    actual: condition.literal.type_name().to_string(),
                });
            }
        }
        self.binding = Some(SelectBinding {
            columns_by_name,
            columns,
        });
        Ok(())
    }

    fn iter(&self) -> PlanResult<BoxedRows<'_>> {
        let binding = self.binding.as_ref().ok_or(PlanError::NotPrepared("Select"))?;
        Ok(Box::new(SelectIter {
            child: self.child.iter()?,
            conditions: &self.conditions,
            binding,
        }))
    }
}

struct SelectIter<'p> {
    child: BoxedRows<'p>,
    conditions: &'p [Condition],
    binding: &'p SelectBinding,
}

impl RowIterator for SelectIter<'_> {
    fn next_row(&mut self) -> StorageResult<Option<Row>> {
        while let Some(row) = self.child.next_row()? {
            if eval_all(
                self.conditions,
                &row,
                &self.binding.columns_by_name,
                &self.binding.columns,
            ) {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }
}

/// Projection: rearranges each child row into the requested attribute order.
pub struct Projection<'a> {
    child: Box<PlanNode<'a>>,
    attributes: Vec<SelectColumn>,
    binding: Option<ProjectionBinding>,
}

struct ProjectionBinding {
    columns: Vec<Column>,
    /// Child position feeding each output position.
    sources: Vec<usize>,
    child_width: usize,
}

impl<'a> Projection<'a> {
    pub fn new(child: PlanNode<'a>, attributes: Vec<SelectColumn>) -> Self {
        Self {
            child: Box::new(child),
            attributes,
            binding: None,
        }
    }

    fn bind(&mut self, child_columns: Vec<Column>) -> PlanResult<()> {
        let child_by_name = column_map(&child_columns);
        let mut sources = Vec::with_capacity(self.attributes.len());
        for attribute in &self.attributes {
            match attribute {
                SelectColumn::Wildcard => sources.extend(0..child_columns.len()),
                SelectColumn::Column(name) => {
                    let position = *child_by_name
                        .get(name)
                        .ok_or_else(|| PlanError::UnknownColumn(name.clone()))?;
                    sources.push(position);
                }
            }
        }
        let columns = sources.iter().map(|&i| child_columns[i].clone()).collect();
        self.binding = Some(ProjectionBinding {
            columns,
            sources,
            child_width: child_columns.len(),
        });
        Ok(())
    }

    fn iter(&self) -> PlanResult<BoxedRows<'_>> {
        let binding = self
            .binding
            .as_ref()
            .ok_or(PlanError::NotPrepared("Projection"))?;
        Ok(Box::new(ProjectionIter {
            child: self.child.iter()?,
            binding,
        }))
    }
}

struct ProjectionIter<'p> {
    child: BoxedRows<'p>,
    binding: &'p ProjectionBinding,
}

impl RowIterator for ProjectionIter<'_> {
    fn next_row(&mut self) -> StorageResult<Option<Row>> {
        let Some(row) = self.child.next_row()? else {
            return Ok(None);
        };
        let values = self
            .binding
            .sources
            .iter()
            .map(|&i| {
                row.get(i).cloned().ok_or_else(|| StorageError::ArityMismatch {
                    expected: self.binding.child_width,
                    actual: row.len(),
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(Some(Row {
            key: row.key,
            values,
        }))
    }
}
