//! Query planning.
//!
//! Converts a parsed [`Statement`](crate::sql::Statement) into a tree of
//! scan, filter and projection nodes over the catalog's tables, and binds
//! every node to its input schema before the tree can be iterated.

mod condition;
mod error;
mod node;
mod plan;
mod planner;

pub use condition::{column_map, eval_all, ColumnMap, Condition, Relation};
pub use error::{PlanError, PlanResult};
pub use node::{BoxedRows, PlanNode, Projection, SelectNode, TableScan};
pub use plan::{Prepared, QueryPlan, Unprepared};
pub use planner::QueryPlanner;
