//! Query planner - turns a parsed statement into a prepared operator tree.
//!
//! The tree is always shaped `Projection -> [Select ->] TableScan`; the
//! Select node is only present when the statement has a WHERE clause.

use tracing::debug;

use super::condition::{Condition, Relation};
use super::error::{PlanError, PlanResult};
use super::node::{PlanNode, Projection, SelectNode, TableScan};
use super::plan::{Prepared, QueryPlan, Unprepared};
use crate::catalog::Database;
use crate::sql::{self, Select, Statement};

/// The query planner. Borrows the catalog for as long as its plans live.
pub struct QueryPlanner<'a> {
    database: &'a Database,
}

impl<'a> QueryPlanner<'a> {
    /// Create a planner over a database.
    pub fn new(database: &'a Database) -> Self {
        Self { database }
    }

    /// Build and prepare a plan for a statement.
    pub fn prepare(&self, stmt: &Statement) -> PlanResult<QueryPlan<'a, Prepared>> {
        match stmt {
            Statement::Select(select) => {
                let plan = self.plan_select(select)?.prepare()?;
                debug!(table = %select.from, columns = ?plan.column_names(), "prepared plan");
                Ok(plan)
            }
            other => Err(PlanError::UnsupportedStatement(other.kind().to_string())),
        }
    }

    /// Build an unprepared plan for a SELECT statement.
    pub fn plan_select(&self, select: &Select) -> PlanResult<QueryPlan<'a, Unprepared>> {
        let table = self.database.get_table(&select.from)?;
        let mut node = PlanNode::TableScan(TableScan::new(select.from.clone(), table));

        if select.has_where() {
            let conditions = self.convert_conditions(&select.conditions)?;
            node = PlanNode::Select(SelectNode::new(node, conditions));
        }

        let node = PlanNode::Projection(Projection::new(node, select.columns.clone()));
        Ok(QueryPlan::new(node))
    }

    /// Render the prepared plan for a statement.
    pub fn explain(&self, stmt: &Statement) -> PlanResult<String> {
        Ok(self.prepare(stmt)?.to_string())
    }

    fn convert_conditions(&self, conditions: &[sql::Condition]) -> PlanResult<Vec<Condition>> {
        conditions
            .iter()
            .map(|condition| {
                let relation = Relation::from(condition.op);
                if relation != Relation::Equal {
                    return Err(PlanError::UnsupportedRelation(relation.to_string()));
                }
                Ok(Condition::new(
                    condition.column.clone(),
                    relation,
                    condition.value.to_value(),
                ))
            })
            .collect()
    }
}
