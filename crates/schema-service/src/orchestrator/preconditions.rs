//! Existence preconditions checked before any DDL is issued.
//!
//! Each check either passes or fails with the specific not-found /
//! already-exists error. A failed lookup is wrapped as a precondition error
//! so callers only see which check could not run.

use tracing::error;

use crate::core::schema::ForeignKeySpec;
use crate::core::traits::SchemaCatalog;
use crate::error::{Result, SchemaError};

pub(crate) struct Preconditions<'a> {
    catalog: &'a dyn SchemaCatalog,
}

impl<'a> Preconditions<'a> {
    pub(crate) fn new(catalog: &'a dyn SchemaCatalog) -> Self {
        Self { catalog }
    }

    async fn table_exists(&self, table: &str, check: &str) -> Result<bool> {
        self.catalog.table_exists(table).await.map_err(|e| {
            error!("Failed to {} '{}': {}", check, table, e);
            SchemaError::precondition(check, e)
        })
    }

    async fn column_exists(&self, table: &str, column: &str, check: &str) -> Result<bool> {
        self.catalog.column_exists(table, column).await.map_err(|e| {
            error!("Failed to {} '{}.{}': {}", check, table, column, e);
            SchemaError::precondition(check, e)
        })
    }

    pub(crate) async fn require_table(&self, table: &str) -> Result<()> {
        if self.table_exists(table, "check if table exists").await? {
            Ok(())
        } else {
            Err(SchemaError::TableNotFound(table.to_string()))
        }
    }

    pub(crate) async fn require_no_table(&self, table: &str) -> Result<()> {
        if self.table_exists(table, "check if table exists").await? {
            Err(SchemaError::TableAlreadyExists(table.to_string()))
        } else {
            Ok(())
        }
    }

    pub(crate) async fn require_column(&self, table: &str, column: &str) -> Result<()> {
        if self
            .column_exists(table, column, "check if column exists")
            .await?
        {
            Ok(())
        } else {
            Err(SchemaError::ColumnNotFound {
                table: table.to_string(),
                column: column.to_string(),
            })
        }
    }

    pub(crate) async fn require_no_column(&self, table: &str, column: &str) -> Result<()> {
        if self
            .column_exists(table, column, "check if column exists")
            .await?
        {
            Err(SchemaError::ColumnAlreadyExists {
                table: table.to_string(),
                column: column.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Reference table first, then reference column.
    pub(crate) async fn require_reference(&self, fk: &ForeignKeySpec) -> Result<()> {
        let table = &fk.reference_table_name;
        let column = &fk.reference_column_name;

        if !self
            .table_exists(table, "check if reference table exists")
            .await?
        {
            return Err(SchemaError::ReferenceTableNotFound(table.clone()));
        }

        if !self
            .column_exists(table, column, "check if reference column exists")
            .await?
        {
            return Err(SchemaError::ReferenceColumnNotFound {
                table: table.clone(),
                column: column.clone(),
            });
        }

        Ok(())
    }

    pub(crate) async fn reference_column_type(&self, table: &str, column: &str) -> Result<String> {
        self.catalog
            .column_type_of(table, column)
            .await
            .map_err(|e| {
                error!(
                    "Failed to get reference column type '{}.{}': {}",
                    table, column, e
                );
                SchemaError::precondition("get reference column type", e)
            })
    }

    /// Name of the column's foreign key constraint; a column without one is
    /// [`SchemaError::ForeignKeyNotFound`].
    pub(crate) async fn foreign_key_constraint(&self, table: &str, column: &str) -> Result<String> {
        let name = self
            .catalog
            .foreign_key_constraint_name_of(table, column)
            .await
            .map_err(|e| {
                error!(
                    "Failed to get foreign key constraint '{}.{}': {}",
                    table, column, e
                );
                SchemaError::precondition("get foreign key constraints", e)
            })?;

        if name.is_empty() {
            return Err(SchemaError::ForeignKeyNotFound {
                table: table.to_string(),
                column: column.to_string(),
            });
        }

        Ok(name)
    }
}
