//! Configuration validation.

use super::{Config, Conventions};
use crate::error::{Result, SchemaError};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Database validation
    if config.database.host.is_empty() {
        return Err(SchemaError::Config("database.host is required".into()));
    }
    if config.database.database.is_empty() {
        return Err(SchemaError::Config("database.database is required".into()));
    }
    if config.database.user.is_empty() {
        return Err(SchemaError::Config("database.user is required".into()));
    }
    if config.database.max_connections == 0 {
        return Err(SchemaError::Config(
            "database.max_connections must be at least 1".into(),
        ));
    }

    validate_conventions(&config.conventions)
}

/// Validate the naming conventions on their own.
pub fn validate_conventions(conventions: &Conventions) -> Result<()> {
    // Convention names end up in every CREATE TABLE
    for (field, value) in [
        ("users_table", &conventions.users_table),
        ("users_id_column", &conventions.users_id_column),
        ("owner_column", &conventions.owner_column),
        ("created_at_column", &conventions.created_at_column),
        ("updated_at_column", &conventions.updated_at_column),
    ] {
        if value.trim().is_empty() {
            return Err(SchemaError::Config(format!(
                "conventions.{} cannot be empty",
                field
            )));
        }
    }

    Ok(())
}
