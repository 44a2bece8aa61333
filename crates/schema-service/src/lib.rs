//! # schema-service
//!
//! Schema mapping and DDL synthesis for MySQL.
//!
//! This library turns a typed column and foreign key model into DDL, runs it
//! against a live database behind existence preconditions, and rebuilds the
//! model from `information_schema`:
//!
//! - **Type codec** between [`TypeVariant`] and SQL type fragments
//! - **Template-driven DDL** for create/drop table, add/drop column and
//!   add/drop foreign key
//! - **Precondition gates** before every mutation, with typed not-found /
//!   already-exists errors
//! - **Transactional foreign key removal** (constraint and column as one unit)
//!
//! ## Example
//!
//! ```rust,no_run
//! use schema_service::{ColumnSpec, Config, CreateTableRequest, SchemaService, TypeVariant};
//!
//! #[tokio::main]
//! async fn main() -> schema_service::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let service = SchemaService::connect(&config).await?;
//!     let sql = service
//!         .create_table(&CreateTableRequest {
//!             table_name: "posts".into(),
//!             columns: vec![ColumnSpec::new("title", TypeVariant::Varchar { length: 100 })],
//!             foreign_keys: vec![],
//!             table_comment: None,
//!         })
//!         .await?;
//!     println!("{}", sql);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod ddl;
pub mod drivers;
pub mod error;
pub mod orchestrator;
pub mod typemap;

// Re-exports for convenient access
pub use config::{Config, Conventions, DatabaseConfig, SslMode};
pub use crate::core::{
    ColumnListing, ColumnSpec, FloatKind, ForeignKeySpec, IntWidth, RawIntrospectedColumn,
    ReferentialAction, SchemaCatalog, SchemaTransaction, TableDetails, TypeVariant,
};
pub use ddl::DdlSynthesizer;
pub use drivers::MysqlCatalog;
pub use error::{Result, SchemaError, Status};
pub use orchestrator::{
    render_create_table, AddColumnRequest, AddForeignKeyRequest, CreateTableRequest,
    SchemaService,
};
