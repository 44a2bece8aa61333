//! Database collaborator traits.
//!
//! - [`SchemaCatalog`]: existence checks, type lookups, statement execution and
//!   introspection against the live database
//! - [`SchemaTransaction`]: an explicit transaction scope for compound operations
//!
//! The orchestrator only talks to the database through these traits, so it can
//! be driven by the MySQL catalog in production and by in-memory catalogs in tests.

use async_trait::async_trait;

use crate::error::Result;

use super::schema::{RawIntrospectedColumn, TableDetails};

/// Read and change schema objects in the target database.
///
/// Implementations are shared across concurrent requests, so every method
/// takes `&self`; any pooling happens inside the implementation.
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    // ===== Existence checks =====

    /// Check if a table exists.
    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// Check if a column exists on a table.
    async fn column_exists(&self, table: &str, column: &str) -> Result<bool>;

    /// Full engine type string of a column (e.g. `bigint unsigned`).
    async fn column_type_of(&self, table: &str, column: &str) -> Result<String>;

    /// Name of the foreign key constraint on a column, or an empty string if
    /// the column has none.
    async fn foreign_key_constraint_name_of(&self, table: &str, column: &str) -> Result<String>;

    // ===== Statement execution =====

    /// Execute one statement with the engine's native single-statement atomicity.
    async fn execute(&self, sql: &str) -> Result<()>;

    /// Open an explicit transaction.
    ///
    /// Dropping the returned scope without calling
    /// [`SchemaTransaction::commit`] must roll it back.
    async fn begin(&self) -> Result<Box<dyn SchemaTransaction>>;

    // ===== Introspection =====

    /// Run a table listing query.
    async fn fetch_tables(&self, sql: &str) -> Result<Vec<TableDetails>>;

    /// Run the column introspection query, binding `table` to its single
    /// placeholder. Rows are decoded positionally.
    async fn fetch_columns(&self, sql: &str, table: &str) -> Result<Vec<RawIntrospectedColumn>>;

    /// Get the database type identifier (e.g., "mysql").
    fn db_type(&self) -> &str;

    /// Close the connection pool.
    async fn close(&self);
}

/// An open transaction on one connection.
#[async_trait]
pub trait SchemaTransaction: Send {
    /// Execute a statement inside the transaction.
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Commit every statement executed so far.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard every statement executed so far.
    async fn rollback(self: Box<Self>) -> Result<()>;
}
