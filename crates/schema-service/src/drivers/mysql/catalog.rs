//! MySQL schema catalog.
//!
//! Implements [`SchemaCatalog`] over a `mysql_async` pool. Existence checks
//! and type lookups read `information_schema` with bound parameters, scoped
//! to the configured database.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use mysql_async::prelude::*;
use mysql_async::{
    Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, Row, SslOpts, Transaction, TxOpts,
};
use tracing::{debug, info, warn};

use crate::config::{DatabaseConfig, SslMode};
use crate::core::schema::{RawIntrospectedColumn, TableDetails};
use crate::core::traits::{SchemaCatalog, SchemaTransaction};
use crate::error::{Result, SchemaError};

const TABLE_EXISTS_SQL: &str = r#"
    SELECT COUNT(*) FROM information_schema.TABLES
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
"#;

const COLUMN_EXISTS_SQL: &str = r#"
    SELECT COUNT(*) FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND COLUMN_NAME = ?
"#;

const COLUMN_TYPE_SQL: &str = r#"
    SELECT COLUMN_TYPE FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND COLUMN_NAME = ?
"#;

const FOREIGN_KEY_CONSTRAINT_SQL: &str = r#"
    SELECT CONSTRAINT_NAME FROM information_schema.KEY_COLUMN_USAGE
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND COLUMN_NAME = ?
      AND REFERENCED_TABLE_NAME IS NOT NULL
    ORDER BY CONSTRAINT_NAME
    LIMIT 1
"#;

/// `CAST(CREATE_TIME AS CHAR)` format.
const CREATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn ssl_opts(mode: SslMode) -> Option<SslOpts> {
    match mode {
        SslMode::Disable => {
            warn!("MySQL TLS is disabled. Credentials will be transmitted in plaintext.");
            None
        }
        SslMode::Prefer | SslMode::Require => {
            Some(SslOpts::default().with_danger_accept_invalid_certs(true))
        }
        SslMode::VerifyCa => Some(SslOpts::default().with_danger_skip_domain_validation(true)),
        SslMode::VerifyFull => Some(SslOpts::default()),
    }
}

/// Read one positional value from a row.
fn value<T: FromValue>(row: &Row, index: usize, field: &str) -> Result<T> {
    match row.get_opt::<T, usize>(index) {
        Some(Ok(v)) => Ok(v),
        Some(Err(e)) => Err(SchemaError::execution(format!("decoding {}", field), e)),
        None => Err(SchemaError::execution(
            format!("decoding {}", field),
            format!("row has no column at position {}", index),
        )),
    }
}

fn decode_table(row: &Row) -> Result<TableDetails> {
    let create_time: Option<String> = value(row, 4, "create time")?;
    let create_time = create_time.and_then(|text| {
        NaiveDateTime::parse_from_str(&text, CREATE_TIME_FORMAT)
            .map_err(|e| warn!("Unparseable table create time '{}': {}", text, e))
            .ok()
    });

    Ok(TableDetails {
        table_name: value(row, 0, "table name")?,
        row_count: value(row, 1, "row count")?,
        size_bytes: value(row, 2, "table size")?,
        comment: value(row, 3, "table comment")?,
        create_time,
    })
}

fn decode_column(row: &Row) -> Result<RawIntrospectedColumn> {
    Ok(RawIntrospectedColumn {
        column_name: value(row, 0, "column name")?,
        data_type: value(row, 1, "data type")?,
        column_type: value(row, 2, "column type")?,
        is_nullable: value(row, 3, "nullability")?,
        column_default: value(row, 4, "column default")?,
        max_length: value(row, 5, "max length")?,
        extra: value::<Option<String>>(row, 6, "extra")?.unwrap_or_default(),
        is_unique: value(row, 7, "unique flag")?,
        is_primary: value(row, 8, "primary flag")?,
        is_foreign: value(row, 9, "foreign flag")?,
        reference_table_name: value(row, 10, "reference table")?,
        reference_column_name: value(row, 11, "reference column")?,
        on_update: value(row, 12, "update rule")?,
        on_delete: value(row, 13, "delete rule")?,
    })
}

/// MySQL catalog over a connection pool shared by all requests.
pub struct MysqlCatalog {
    pool: Pool,
    database: String,
}

impl MysqlCatalog {
    /// Create a catalog from configuration and verify connectivity.
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let mut builder = OptsBuilder::default()
            .ip_or_hostname(&config.host)
            .tcp_port(config.port)
            .db_name(Some(&config.database))
            .user(Some(&config.user))
            .pass(Some(&config.password))
            // Use utf8mb4 for full Unicode support
            .init(vec!["SET NAMES utf8mb4"]);

        if let Some(ssl) = ssl_opts(config.ssl_mode) {
            builder = builder.ssl_opts(ssl);
        }

        let constraints = PoolConstraints::new(1, config.max_connections).ok_or_else(|| {
            SchemaError::Config(format!(
                "invalid pool size: max_connections = {}",
                config.max_connections
            ))
        })?;
        let opts: Opts = builder
            .pool_opts(PoolOpts::new().with_constraints(constraints))
            .into();

        let catalog = Self {
            pool: Pool::new(opts),
            database: config.database.clone(),
        };
        catalog.ping().await?;

        info!(
            "Connected to MySQL: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(catalog)
    }

    /// Round-trip a trivial query on a pooled connection.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| SchemaError::pool(e, "getting MySQL connection"))?;
        conn.query_drop("SELECT 1")
            .await
            .map_err(|e| SchemaError::pool(e, "testing MySQL connection"))?;
        Ok(())
    }

    async fn count(&self, sql: &str, params: impl Into<mysql_async::Params> + Send) -> Result<bool> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| SchemaError::pool(e, "getting MySQL connection"))?;
        let count: Option<i64> = conn
            .exec_first(sql, params)
            .await
            .map_err(|e| SchemaError::execution("checking existence", e))?;
        Ok(count.unwrap_or(0) > 0)
    }
}

#[async_trait]
impl SchemaCatalog for MysqlCatalog {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        self.count(TABLE_EXISTS_SQL, (self.database.as_str(), table))
            .await
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        self.count(COLUMN_EXISTS_SQL, (self.database.as_str(), table, column))
            .await
    }

    async fn column_type_of(&self, table: &str, column: &str) -> Result<String> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| SchemaError::pool(e, "getting MySQL connection"))?;
        let column_type: Option<String> = conn
            .exec_first(COLUMN_TYPE_SQL, (self.database.as_str(), table, column))
            .await
            .map_err(|e| SchemaError::execution("reading column type", e))?;

        column_type.ok_or_else(|| {
            SchemaError::execution(
                "reading column type",
                format!("no column {}.{}", table, column),
            )
        })
    }

    async fn foreign_key_constraint_name_of(&self, table: &str, column: &str) -> Result<String> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| SchemaError::pool(e, "getting MySQL connection"))?;
        let name: Option<String> = conn
            .exec_first(
                FOREIGN_KEY_CONSTRAINT_SQL,
                (self.database.as_str(), table, column),
            )
            .await
            .map_err(|e| SchemaError::execution("reading foreign key constraint", e))?;

        Ok(name.unwrap_or_default())
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| SchemaError::pool(e, "getting MySQL connection"))?;
        conn.query_drop(sql)
            .await
            .map_err(|e| SchemaError::execution("executing statement", e))
    }

    /// MySQL commits DDL implicitly, so a rollback after an executed `ALTER`
    /// only discards work the engine has not yet committed.
    async fn begin(&self) -> Result<Box<dyn SchemaTransaction>> {
        let tx = self
            .pool
            .start_transaction(TxOpts::default())
            .await
            .map_err(|e| SchemaError::transaction("starting transaction", e))?;
        debug!("Started MySQL transaction");
        Ok(Box::new(MysqlTransaction { tx }))
    }

    async fn fetch_tables(&self, sql: &str) -> Result<Vec<TableDetails>> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| SchemaError::pool(e, "getting MySQL connection"))?;
        let rows: Vec<Row> = conn
            .query(sql)
            .await
            .map_err(|e| SchemaError::execution("listing tables", e))?;

        rows.iter().map(decode_table).collect()
    }

    async fn fetch_columns(&self, sql: &str, table: &str) -> Result<Vec<RawIntrospectedColumn>> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| SchemaError::pool(e, "getting MySQL connection"))?;
        let rows: Vec<Row> = conn
            .exec(sql, (table,))
            .await
            .map_err(|e| SchemaError::execution("listing columns", e))?;

        rows.iter().map(decode_column).collect()
    }

    fn db_type(&self) -> &str {
        "mysql"
    }

    async fn close(&self) {
        self.pool.clone().disconnect().await.ok();
    }
}

/// An open transaction holding one pooled connection.
///
/// Dropping it without commit rolls back when the connection returns to the
/// pool.
struct MysqlTransaction {
    tx: Transaction<'static>,
}

#[async_trait]
impl SchemaTransaction for MysqlTransaction {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.tx
            .query_drop(sql)
            .await
            .map_err(|e| SchemaError::execution("executing statement in transaction", e))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| SchemaError::transaction("committing transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| SchemaError::transaction("rolling back transaction", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssl_opts_mapping() {
        assert!(ssl_opts(SslMode::Disable).is_none());
        assert!(ssl_opts(SslMode::Prefer).is_some());
        assert!(ssl_opts(SslMode::VerifyFull).is_some());
    }

    #[test]
    fn test_create_time_format() {
        let parsed = NaiveDateTime::parse_from_str("2024-03-01 12:30:45", CREATE_TIME_FORMAT);
        assert!(parsed.is_ok());
    }
}
