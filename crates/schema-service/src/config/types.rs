//! Configuration type definitions.

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Managed database connection.
    pub database: DatabaseConfig,

    /// Names of the system users table and the audit columns every created
    /// table carries.
    #[serde(default)]
    pub conventions: Conventions,
}

/// MySQL connection configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Database (schema) name. Also scopes the introspection queries.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// TLS mode (default: "prefer").
    #[serde(default)]
    pub ssl_mode: SslMode,

    /// Connection pool size (default: 10).
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// TLS mode for the MySQL connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    /// Plain TCP.
    Disable,
    /// Use TLS without verifying the server.
    #[default]
    Prefer,
    /// Require TLS without verifying the server.
    Require,
    /// Require TLS and verify the certificate chain, not the host name.
    VerifyCa,
    /// Require TLS and verify both chain and host name.
    VerifyFull,
}

/// Names the synthesizer uses for the implicit owner relationship and audit
/// columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conventions {
    /// System users table every created table is owned by (default: "users").
    #[serde(default = "default_users_table")]
    pub users_table: String,

    /// Primary key of the users table (default: "id").
    #[serde(default = "default_users_id_column")]
    pub users_id_column: String,

    /// Creator id column appended to every created table (default: "created_by").
    #[serde(default = "default_owner_column")]
    pub owner_column: String,

    #[serde(default = "default_created_at_column")]
    pub created_at_column: String,

    #[serde(default = "default_updated_at_column")]
    pub updated_at_column: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            users_table: default_users_table(),
            users_id_column: default_users_id_column(),
            owner_column: default_owner_column(),
            created_at_column: default_created_at_column(),
            updated_at_column: default_updated_at_column(),
        }
    }
}

// Default value functions for serde
fn default_mysql_port() -> u16 {
    3306
}

fn default_max_connections() -> usize {
    10
}

fn default_users_table() -> String {
    "users".to_string()
}

fn default_users_id_column() -> String {
    "id".to_string()
}

fn default_owner_column() -> String {
    "created_by".to_string()
}

fn default_created_at_column() -> String {
    "created_at".to_string()
}

fn default_updated_at_column() -> String {
    "updated_at".to_string()
}
