//! MySQL/MariaDB database driver.
//!
//! - [`MysqlCatalog`]: schema catalog over a pooled `mysql_async` handle
//!
//! # Supported Versions
//!
//! - MySQL 5.7+, 8.0+
//! - MariaDB 10.2+

mod catalog;

pub use catalog::MysqlCatalog;
