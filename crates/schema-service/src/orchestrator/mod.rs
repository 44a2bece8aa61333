//! Schema operation orchestrator.
//!
//! Every operation is a fixed sequence of gates: identifier validation,
//! existence preconditions, type resolution, synthesis, execution. The first
//! failing gate aborts the operation before anything is executed.
//! DropForeignKey is the only operation that runs more than one statement;
//! it does so inside one explicit transaction.

mod preconditions;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::{Config, Conventions};
use crate::core::identifier::validate_identifier;
use crate::core::schema::{ColumnListing, ColumnSpec, ForeignKeySpec, TableDetails};
use crate::core::traits::SchemaCatalog;
use crate::ddl::{ColumnDefinition, DdlSynthesizer, ForeignKeyDefinition};
use crate::drivers::mysql::MysqlCatalog;
use crate::error::{Result, SchemaError};
use crate::typemap;

use preconditions::Preconditions;

/// CreateTable request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTableRequest {
    pub table_name: String,

    /// Columns in caller order.
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,

    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeySpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_comment: Option<String>,
}

/// AddColumn request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddColumnRequest {
    pub table_name: String,
    pub column: ColumnSpec,
}

/// AddForeignKey request. The new column takes its type from the referenced
/// column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddForeignKeyRequest {
    pub table_name: String,
    pub foreign_key: ForeignKeySpec,
    #[serde(default)]
    pub not_nullable: bool,
}

/// Resolve every column type, failing on the first invalid column in caller
/// order.
fn resolve_columns(columns: &[ColumnSpec]) -> Result<Vec<ColumnDefinition>> {
    columns
        .iter()
        .map(|column| {
            validate_identifier(&column.name)?;
            ColumnDefinition::resolve(column)
        })
        .collect()
}

/// Render a CreateTable statement without consulting the database.
///
/// Runs identifier and type validation but no existence checks.
pub fn render_create_table(
    synthesizer: &DdlSynthesizer,
    request: &CreateTableRequest,
) -> Result<String> {
    validate_identifier(&request.table_name)?;
    let columns = resolve_columns(&request.columns)?;
    let foreign_keys = request
        .foreign_keys
        .iter()
        .map(|fk| {
            validate_identifier(&fk.column_name)?;
            Ok(ForeignKeyDefinition::from(fk))
        })
        .collect::<Result<Vec<_>>>()?;

    synthesizer.create_table(
        &request.table_name,
        &columns,
        &foreign_keys,
        request.table_comment.as_deref(),
    )
}

/// Schema operation service.
pub struct SchemaService {
    catalog: Arc<dyn SchemaCatalog>,
    synthesizer: DdlSynthesizer,
    database_name: String,
}

impl SchemaService {
    /// Create a service over an existing catalog.
    ///
    /// `database_name` scopes the ListTables and ListColumns queries.
    pub fn new(
        catalog: Arc<dyn SchemaCatalog>,
        database_name: impl Into<String>,
        conventions: Conventions,
    ) -> Result<Self> {
        Ok(Self {
            catalog,
            synthesizer: DdlSynthesizer::new(conventions)?,
            database_name: database_name.into(),
        })
    }

    /// Connect to the configured MySQL database.
    pub async fn connect(config: &Config) -> Result<Self> {
        let catalog = MysqlCatalog::new(&config.database).await?;
        Self::new(
            Arc::new(catalog),
            config.database.database.clone(),
            config.conventions.clone(),
        )
    }

    pub fn catalog(&self) -> &Arc<dyn SchemaCatalog> {
        &self.catalog
    }

    pub fn synthesizer(&self) -> &DdlSynthesizer {
        &self.synthesizer
    }

    fn preconditions(&self) -> Preconditions<'_> {
        Preconditions::new(self.catalog.as_ref())
    }

    async fn execute(&self, context: &str, sql: &str) -> Result<()> {
        debug!("Executing ({}): {}", context, sql);
        self.catalog.execute(sql).await.map_err(|e| {
            error!("Failed {}: {}", context, e);
            SchemaError::execution(context, e)
        })
    }

    /// Create a table and return the executed statement.
    pub async fn create_table(&self, request: &CreateTableRequest) -> Result<String> {
        let table = &request.table_name;
        validate_identifier(table)?;

        let checks = self.preconditions();
        checks.require_no_table(table).await?;

        let columns = resolve_columns(&request.columns)?;

        let mut foreign_keys = Vec::with_capacity(request.foreign_keys.len());
        for fk in &request.foreign_keys {
            validate_identifier(&fk.column_name)?;
            checks.require_reference(fk).await?;
            foreign_keys.push(ForeignKeyDefinition::from(fk));
        }

        let sql = self.synthesizer.create_table(
            table,
            &columns,
            &foreign_keys,
            request.table_comment.as_deref(),
        )?;
        self.execute("creating table", &sql).await?;

        info!(
            "Created table {} ({} columns, {} foreign keys)",
            table,
            columns.len(),
            foreign_keys.len()
        );
        Ok(sql)
    }

    pub async fn drop_table(&self, table_name: &str) -> Result<String> {
        validate_identifier(table_name)?;
        self.preconditions().require_table(table_name).await?;

        let sql = self.synthesizer.drop_table(table_name)?;
        self.execute("dropping table", &sql).await?;

        info!("Dropped table {}", table_name);
        Ok("table dropped".to_string())
    }

    pub async fn add_column(&self, request: &AddColumnRequest) -> Result<String> {
        let table = &request.table_name;
        let column = &request.column;
        validate_identifier(table)?;
        validate_identifier(&column.name)?;

        let checks = self.preconditions();
        checks.require_table(table).await?;
        checks.require_no_column(table, &column.name).await?;

        let definition = ColumnDefinition::resolve(column)?;
        let sql = self.synthesizer.add_column(table, &definition)?;
        self.execute("adding column", &sql).await?;

        info!("Added column {}.{} ({})", table, column.name, definition.sql_type);
        Ok("column added".to_string())
    }

    pub async fn drop_column(&self, table_name: &str, column_name: &str) -> Result<String> {
        validate_identifier(table_name)?;
        validate_identifier(column_name)?;

        let checks = self.preconditions();
        checks.require_table(table_name).await?;
        checks.require_column(table_name, column_name).await?;

        let sql = self.synthesizer.drop_column(table_name, column_name)?;
        self.execute("dropping column", &sql).await?;

        info!("Dropped column {}.{}", table_name, column_name);
        Ok("column dropped".to_string())
    }

    /// Add a column together with a foreign key constraint on it.
    ///
    /// References to the users table always produce a `BIGINT UNSIGNED`
    /// column and skip the type lookup.
    pub async fn add_foreign_key(&self, request: &AddForeignKeyRequest) -> Result<String> {
        let table = &request.table_name;
        let fk = &request.foreign_key;
        validate_identifier(table)?;
        validate_identifier(&fk.column_name)?;

        let checks = self.preconditions();
        checks.require_table(table).await?;
        checks.require_no_column(table, &fk.column_name).await?;
        checks.require_reference(fk).await?;

        let reference_type = if self.synthesizer.is_users_table(&fk.reference_table_name) {
            None
        } else {
            Some(
                checks
                    .reference_column_type(&fk.reference_table_name, &fk.reference_column_name)
                    .await?,
            )
        };

        let sql = self.synthesizer.add_foreign_key(
            table,
            fk,
            reference_type.as_deref(),
            request.not_nullable,
        )?;
        self.execute("adding foreign key", &sql).await?;

        info!(
            "Added foreign key {}.{} -> {}.{}",
            table, fk.column_name, fk.reference_table_name, fk.reference_column_name
        );
        Ok("foreign key added".to_string())
    }

    /// Drop a foreign key constraint and its column as one unit.
    ///
    /// Both statements run in one transaction; a failure on either rolls back
    /// and leaves the column and its constraint in place.
    ///
    /// On MySQL each `ALTER TABLE` commits implicitly, so the rollback cannot
    /// undo a constraint drop that already succeeded when the column drop
    /// fails. The all-or-nothing outcome holds only for catalogs with
    /// transactional DDL.
    pub async fn drop_foreign_key(&self, table_name: &str, column_name: &str) -> Result<String> {
        validate_identifier(table_name)?;
        validate_identifier(column_name)?;

        let checks = self.preconditions();
        checks.require_table(table_name).await?;
        checks.require_column(table_name, column_name).await?;
        let constraint = checks
            .foreign_key_constraint(table_name, column_name)
            .await?;

        let statements = self
            .synthesizer
            .drop_foreign_key(table_name, &constraint, column_name)?;

        let mut tx = self.catalog.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            SchemaError::transaction("starting transaction", e)
        })?;

        for sql in [&statements.drop_constraint, &statements.drop_column] {
            debug!("Executing (dropping foreign key): {}", sql);
            if let Err(e) = tx.execute(sql).await {
                error!(
                    "Failed to drop foreign key {}.{} ({}): {}",
                    table_name, column_name, constraint, e
                );
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Rollback failed: {}", rollback_err);
                }
                return Err(SchemaError::transaction("dropping foreign key", e));
            }
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            SchemaError::transaction("committing transaction", e)
        })?;

        info!(
            "Dropped foreign key {} and column {}.{}",
            constraint, table_name, column_name
        );
        Ok("foreign key dropped".to_string())
    }

    pub async fn list_tables(&self) -> Result<Vec<TableDetails>> {
        let sql = self.synthesizer.list_tables(&self.database_name)?;
        let tables = self.catalog.fetch_tables(&sql).await.map_err(|e| {
            error!("Failed to list tables: {}", e);
            SchemaError::execution("listing tables", e)
        })?;

        debug!("Listed {} tables in {}", tables.len(), self.database_name);
        Ok(tables)
    }

    /// Columns of a table rebuilt from introspection, with the foreign keys
    /// they carry.
    pub async fn list_columns(&self, table_name: &str) -> Result<ColumnListing> {
        validate_identifier(table_name)?;
        self.preconditions().require_table(table_name).await?;

        let sql = self.synthesizer.list_columns(&self.database_name)?;
        let rows = self
            .catalog
            .fetch_columns(&sql, table_name)
            .await
            .map_err(|e| {
                error!("Failed to list columns of {}: {}", table_name, e);
                SchemaError::execution("listing columns", e)
            })?;

        let mut listing = ColumnListing::default();
        for row in &rows {
            let column = typemap::from_introspection(row).inspect_err(|e| {
                error!("Failed to decode column {}.{}: {}", table_name, row.column_name, e);
            })?;
            if let Some(fk) = typemap::foreign_key_from_introspection(row) {
                listing.foreign_keys.push(fk);
            }
            listing.columns.push(column);
        }

        debug!(
            "Listed {} columns of {}",
            listing.columns.len(),
            table_name
        );
        Ok(listing)
    }

    /// Close the underlying catalog.
    pub async fn close(&self) {
        self.catalog.close().await;
    }
}
