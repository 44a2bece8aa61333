//! Database driver implementations.
//!
//! - [`mysql`]: the production [`SchemaCatalog`](crate::core::SchemaCatalog)
//!   over a `mysql_async` pool

pub mod mysql;

pub use mysql::MysqlCatalog;
