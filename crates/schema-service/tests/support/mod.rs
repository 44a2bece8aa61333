//! In-memory schema catalog for orchestrator tests.
//!
//! Keeps a tiny model of tables, columns and foreign key constraints, records
//! every call and executed statement, and applies the effect of the DDL the
//! orchestrator emits. Statements can be made to fail by substring, inside or
//! outside a transaction.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use schema_service::{
    RawIntrospectedColumn, Result, SchemaCatalog, SchemaError, SchemaTransaction, TableDetails,
};

#[derive(Debug, Clone)]
struct MemColumn {
    name: String,
    column_type: String,
    constraint: Option<String>,
}

#[derive(Default)]
struct State {
    tables: BTreeMap<String, Vec<MemColumn>>,
    executed: Vec<String>,
    calls: Vec<String>,
    queries: Vec<String>,
    fail_statements: Vec<String>,
    fail_lookups: bool,
    table_rows: Vec<TableDetails>,
    column_rows: BTreeMap<String, Vec<RawIntrospectedColumn>>,
}

impl State {
    fn column(&self, table: &str, column: &str) -> Option<&MemColumn> {
        self.tables.get(table)?.iter().find(|c| c.name == column)
    }

    fn should_fail(&self, sql: &str) -> bool {
        self.fail_statements.iter().any(|s| sql.contains(s.as_str()))
    }

    fn lookup(&mut self, call: &str) -> Result<()> {
        self.calls.push(call.to_string());
        if self.fail_lookups {
            return Err(SchemaError::execution(
                "checking existence",
                "Lost connection to MySQL server during query",
            ));
        }
        Ok(())
    }

    /// Apply the visible effect of a statement the orchestrator emits.
    fn apply(&mut self, sql: &str) {
        self.executed.push(sql.to_string());
        let words: Vec<&str> = sql.split_whitespace().collect();

        match words.as_slice() {
            ["CREATE", "TABLE", "IF", "NOT", "EXISTS", table, ..] => {
                self.tables.entry(table.to_string()).or_default();
            }
            ["DROP", "TABLE", table] => {
                self.tables.remove(*table);
            }
            ["ALTER", "TABLE", table, "DROP", "FOREIGN", "KEY", constraint] => {
                if let Some(columns) = self.tables.get_mut(*table) {
                    for column in columns.iter_mut() {
                        if column.constraint.as_deref() == Some(*constraint) {
                            column.constraint = None;
                        }
                    }
                }
            }
            ["ALTER", "TABLE", table, "DROP", "COLUMN", column] => {
                if let Some(columns) = self.tables.get_mut(*table) {
                    columns.retain(|c| c.name != *column);
                }
            }
            ["ALTER", "TABLE", table, "ADD", "COLUMN", column, column_type, ..] => {
                let constraint = sql
                    .contains("ADD FOREIGN KEY")
                    .then(|| format!("{}_ibfk_{}", table, column));
                if let Some(columns) = self.tables.get_mut(*table) {
                    columns.push(MemColumn {
                        name: column.to_string(),
                        column_type: column_type.trim_end_matches(',').to_lowercase(),
                        constraint,
                    });
                }
            }
            _ => {}
        }
    }
}

/// Shared, inspectable in-memory catalog.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<Mutex<State>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table with `(column, type)` pairs.
    pub fn with_table(self, table: &str, columns: &[(&str, &str)]) -> Self {
        self.state.lock().unwrap().tables.insert(
            table.to_string(),
            columns
                .iter()
                .map(|(name, column_type)| MemColumn {
                    name: name.to_string(),
                    column_type: column_type.to_string(),
                    constraint: None,
                })
                .collect(),
        );
        self
    }

    /// Attach a named foreign key constraint to an existing column.
    pub fn with_constraint(self, table: &str, column: &str, constraint: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let columns = state.tables.get_mut(table).expect("table must exist");
            let column = columns
                .iter_mut()
                .find(|c| c.name == column)
                .expect("column must exist");
            column.constraint = Some(constraint.to_string());
        }
        self
    }

    pub fn with_table_rows(self, rows: Vec<TableDetails>) -> Self {
        self.state.lock().unwrap().table_rows = rows;
        self
    }

    pub fn with_column_rows(self, table: &str, rows: Vec<RawIntrospectedColumn>) -> Self {
        self.state
            .lock()
            .unwrap()
            .column_rows
            .insert(table.to_string(), rows);
        self
    }

    /// Fail every statement containing `fragment`.
    pub fn fail_statements_containing(&self, fragment: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_statements
            .push(fragment.to_string());
    }

    /// Fail every existence check and type lookup.
    pub fn fail_lookups(&self) {
        self.state.lock().unwrap().fail_lookups = true;
    }

    /// Statements that took effect, in order.
    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    /// Queries passed to the introspection methods.
    pub fn queries(&self) -> Vec<String> {
        self.state.lock().unwrap().queries.clone()
    }

    /// Number of calls to a catalog or transaction method.
    pub fn calls(&self, method: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.as_str() == method)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.state.lock().unwrap().tables.contains_key(table)
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.state.lock().unwrap().column(table, column).is_some()
    }

    pub fn constraint_of(&self, table: &str, column: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .column(table, column)
            .and_then(|c| c.constraint.clone())
    }
}

#[async_trait]
impl SchemaCatalog for MemoryCatalog {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.lookup("table_exists")?;
        Ok(state.tables.contains_key(table))
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.lookup("column_exists")?;
        Ok(state.column(table, column).is_some())
    }

    async fn column_type_of(&self, table: &str, column: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.lookup("column_type_of")?;
        state
            .column(table, column)
            .map(|c| c.column_type.clone())
            .ok_or_else(|| SchemaError::execution("reading column type", "no such column"))
    }

    async fn foreign_key_constraint_name_of(&self, table: &str, column: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.lookup("foreign_key_constraint_name_of")?;
        Ok(state
            .column(table, column)
            .and_then(|c| c.constraint.clone())
            .unwrap_or_default())
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("execute".to_string());
        if state.should_fail(sql) {
            return Err(SchemaError::execution(
                "executing statement",
                "Duplicate column name 'secret_internal_detail'",
            ));
        }
        state.apply(sql);
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn SchemaTransaction>> {
        self.state.lock().unwrap().calls.push("begin".to_string());
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            staged: Vec::new(),
        }))
    }

    async fn fetch_tables(&self, sql: &str) -> Result<Vec<TableDetails>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("fetch_tables".to_string());
        state.queries.push(sql.to_string());
        Ok(state.table_rows.clone())
    }

    async fn fetch_columns(&self, sql: &str, table: &str) -> Result<Vec<RawIntrospectedColumn>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("fetch_columns".to_string());
        state.queries.push(sql.to_string());
        Ok(state.column_rows.get(table).cloned().unwrap_or_default())
    }

    fn db_type(&self) -> &str {
        "memory"
    }

    async fn close(&self) {}
}

/// Stages statements until commit; rollback or drop discards them.
struct MemoryTransaction {
    state: Arc<Mutex<State>>,
    staged: Vec<String>,
}

#[async_trait]
impl SchemaTransaction for MemoryTransaction {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("tx_execute".to_string());
        if state.should_fail(sql) {
            return Err(SchemaError::execution(
                "executing statement in transaction",
                "Lock wait timeout exceeded",
            ));
        }
        self.staged.push(sql.to_string());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("commit".to_string());
        for sql in &self.staged {
            state.apply(sql);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.state.lock().unwrap().calls.push("rollback".to_string());
        Ok(())
    }
}
