//! Main query executor.

use tracing::{debug, error};

use super::error::{ExecuteError, ExecuteResult};
use super::result::{ResultSet, ResultSink};
use crate::catalog::SharedDatabase;
use crate::planner::QueryPlanner;
use crate::sql::Parser;

/// Runs SQL strings against a shared database.
///
/// Each call parses, plans and drains one statement under the database's
/// read lock. The lock is released before the call returns, so callers can
/// hand the collected output to async I/O freely.
#[derive(Clone)]
pub struct QueryExecutor {
    database: SharedDatabase,
}

impl QueryExecutor {
    /// Create a new executor.
    pub fn new(database: SharedDatabase) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &SharedDatabase {
        &self.database
    }

    /// Execute a SQL string and collect its rows.
    pub fn execute(&self, sql: &str) -> ExecuteResult<ResultSet> {
        let mut result = ResultSet::default();
        self.execute_into(sql, &mut result)?;
        Ok(result)
    }

    /// Execute a SQL string, pushing its output into `sink`.
    ///
    /// Returns the number of rows delivered. Parse and plan errors happen
    /// before `sink.begin`; a [`ExecuteError::Stream`] error happens after
    /// the rows it counts have been delivered.
    pub fn execute_into<S: ResultSink + ?Sized>(&self, sql: &str, sink: &mut S) -> ExecuteResult<usize> {
        debug!(sql, "executing statement");
        let stmt = Parser::parse(sql)?;

        let db = self.database.read();
        let plan = QueryPlanner::new(&db).prepare(&stmt)?;
        debug!("{}", plan);

        sink.begin(plan.columns());
        let mut iter = plan.iter()?;
        let mut rows = 0;
        loop {
            match iter.next_row() {
                Ok(Some(row)) => {
                    sink.row(row);
                    rows += 1;
                }
                Ok(None) => break,
                Err(source) => {
                    error!(rows, error = %source, "row stream failed");
                    return Err(ExecuteError::Stream { rows, source });
                }
            }
        }

        debug!(rows, "statement complete");
        Ok(rows)
    }

    /// Render the plan a statement would run.
    pub fn explain(&self, sql: &str) -> ExecuteResult<String> {
        let stmt = Parser::parse(sql)?;
        let db = self.database.read();
        Ok(QueryPlanner::new(&db).explain(&stmt)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{demo_database, Column, Database};
    use crate::planner::PlanError;
    use crate::row;
    use crate::sql::ParseError;
    use crate::storage::{
        Index, Key, Row, RowIterator, ScanIndex, StorageError, StorageResult, Table, Value,
    };

    fn executor() -> QueryExecutor {
        QueryExecutor::new(demo_database().unwrap().into_shared())
    }

    #[test]
    fn test_select_drivers() {
        let result = executor()
            .execute(r#"SELECT email FROM users WHERE user_type = "driver""#)
            .unwrap();
        assert_eq!(result.column_names(), vec!["email"]);
        assert_eq!(
            result.column_values("email").unwrap(),
            vec![
                &Value::from("driver2@example.com"),
                &Value::from("driver4@example.com"),
            ]
        );
        assert_eq!(result.status(), "SELECT 2");
    }

    #[test]
    fn test_select_star_keeps_keys() {
        let result = executor().execute("SELECT * FROM users;").unwrap();
        assert_eq!(result.len(), 5);
        let keys: Vec<Key> = result.iter().map(|r| r.key).collect();
        assert_eq!(keys, (1..=5).map(Key::new).collect::<Vec<_>>());
    }

    #[test]
    fn test_parse_error() {
        let err = executor().execute("SELEC email FROM users").unwrap_err();
        assert!(matches!(err, ExecuteError::Parse(ParseError::Syntax(_))));
        assert!(err.before_first_row());
    }

    #[test]
    fn test_unknown_column_reaches_no_sink() {
        let mut sink = ResultSet::default();
        let err = executor()
            .execute_into("SELECT name FROM users", &mut sink)
            .unwrap_err();
        assert!(matches!(err, ExecuteError::Plan(PlanError::UnknownColumn(_))));
        assert!(sink.columns.is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_sees_later_writes() {
        let exec = executor();
        exec.database()
            .write()
            .get_table_mut("users")
            .unwrap()
            .add_row(row![6i64, "driver", "driver6@example.com", 52i64])
            .unwrap();

        let result = exec
            .execute("SELECT id FROM users WHERE user_type = 'driver'")
            .unwrap();
        assert_eq!(result.len(), 3);
    }

    /// Index whose iterator fails after its first row.
    struct BrokenIndex {
        inner: ScanIndex,
    }

    struct BrokenIter<'a> {
        inner: Box<dyn RowIterator + Send + 'a>,
        yielded: bool,
    }

    impl RowIterator for BrokenIter<'_> {
        fn next_row(&mut self) -> StorageResult<Option<Row>> {
            if self.yielded {
                return Err(StorageError::InvalidKey(Key::new(2)));
            }
            self.yielded = true;
            self.inner.next_row()
        }
    }

    impl Index for BrokenIndex {
        fn add(&mut self, row: Row) -> StorageResult<Key> {
            self.inner.add(row)
        }
        fn remove(&mut self, key: Key) -> StorageResult<()> {
            self.inner.remove(key)
        }
        fn get(&self, key: Key) -> StorageResult<Row> {
            self.inner.get(key)
        }
        fn iter(&self) -> Box<dyn RowIterator + Send + '_> {
            Box::new(BrokenIter {
                inner: self.inner.iter(),
                yielded: false,
            })
        }
        fn size(&self) -> usize {
            self.inner.size()
        }
        fn name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn test_stream_error_keeps_delivered_rows() {
        let indexes: Vec<Box<dyn Index>> = vec![Box::new(BrokenIndex { inner: ScanIndex::new() })];
        let mut table = Table::with_indexes(vec![Column::integer("id")], indexes);
        table.add_row(row![1i64]).unwrap();
        table.add_row(row![2i64]).unwrap();
        let mut db = Database::new("test");
        db.add_table("t", table).unwrap();

        let exec = QueryExecutor::new(db.into_shared());
        let mut sink = ResultSet::default();
        let err = exec.execute_into("SELECT id FROM t", &mut sink).unwrap_err();

        assert!(matches!(err, ExecuteError::Stream { rows: 1, .. }));
        assert!(!err.before_first_row());
        assert_eq!(err.rows_sent(), 1);
        assert_eq!(sink.rows, vec![row![1i64].with_key(Key::new(1))]);
    }

    #[test]
    fn test_explain() {
        let text = executor()
            .explain("SELECT email FROM users WHERE user_type = 'driver'")
            .unwrap();
        assert!(text.contains("TableScan: users"));
    }
}
