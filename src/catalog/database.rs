//! The database catalog: a name-to-table registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::error::{CatalogError, CatalogResult};
use crate::storage::Table;

/// A database shared between connection handlers.
///
/// The catalog itself carries no synchronization; whoever shares it wraps
/// it in this lock.
pub type SharedDatabase = Arc<RwLock<Database>>;

/// A named set of tables.
#[derive(Debug, Default)]
pub struct Database {
    name: String,
    catalog: HashMap<String, Table>,
}

impl Database {
    /// Create an empty database.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            catalog: HashMap::new(),
        }
    }

    /// Wrap this database for sharing across connections.
    pub fn into_shared(self) -> SharedDatabase {
        Arc::new(RwLock::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a table under `name`.
    pub fn add_table(&mut self, name: impl Into<String>, table: Table) -> CatalogResult<()> {
        let name = name.into();
        if self.catalog.contains_key(&name) {
            return Err(CatalogError::TableExists(name));
        }
        self.catalog.insert(name, table);
        Ok(())
    }

    /// Look up a table by name.
    pub fn get_table(&self, name: &str) -> CatalogResult<&Table> {
        self.catalog
            .get(name)
            .ok_or_else(|| self.not_found(name))
    }

    /// Look up a table by name for writing.
    pub fn get_table_mut(&mut self, name: &str) -> CatalogResult<&mut Table> {
        let database = &self.name;
        self.catalog
            .get_mut(name)
            .ok_or_else(|| CatalogError::TableNotFound {
                table: name.to_string(),
                database: database.clone(),
            })
    }

    /// Check if a table exists.
    pub fn table_exists(&self, name: &str) -> bool {
        self.catalog.contains_key(name)
    }

    /// Table names in sorted order.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.catalog.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn not_found(&self, name: &str) -> CatalogError {
        CatalogError::TableNotFound {
            table: name.to_string(),
            database: self.name.clone(),
        }
    }
}
