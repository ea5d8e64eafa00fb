//! Query plans with a prepared/unprepared typestate.

use std::fmt;
use std::marker::PhantomData;

use super::error::PlanResult;
use super::node::{BoxedRows, PlanNode};
use crate::catalog::Column;

/// Marker: the tree has been built but not bound to any schema.
#[derive(Debug)]
pub struct Unprepared;

/// Marker: every node is bound and the plan can be iterated.
#[derive(Debug)]
pub struct Prepared;

/// An operator tree rooted at `root`.
///
/// Only a `QueryPlan<Prepared>` exposes iteration, so a plan cannot be run
/// before its nodes have resolved their columns.
pub struct QueryPlan<'a, State = Prepared> {
    root: PlanNode<'a>,
    _state: PhantomData<State>,
}

impl<'a> QueryPlan<'a, Unprepared> {
    pub fn new(root: PlanNode<'a>) -> Self {
        Self {
            root,
            _state: PhantomData,
        }
    }

    /// Bind every node, leaves first.
    pub fn prepare(mut self) -> PlanResult<QueryPlan<'a, Prepared>> {
        self.root.prepare()?;
        Ok(QueryPlan {
            root: self.root,
            _state: PhantomData,
        })
    }
}

impl<'a> QueryPlan<'a, Prepared> {
    /// Fresh iterator over the plan's output rows.
    pub fn iter(&self) -> PlanResult<BoxedRows<'_>> {
        self.root.iter()
    }

    /// Output schema of the root node.
    pub fn columns(&self) -> &[Column] {
        self.root.columns()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns().iter().map(|c| c.name.as_str()).collect()
    }
}

impl<'a, State> QueryPlan<'a, State> {
    pub fn root(&self) -> &PlanNode<'a> {
        &self.root
    }
}

impl<State> fmt::Display for QueryPlan<'_, State> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Query Plan:")?;
        write!(f, "{}", self.root)
    }
}

impl<State> fmt::Debug for QueryPlan<'_, State> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryPlan").field("root", &self.root).finish()
    }
}
