//! Error types for schema operations.

use thiserror::Error;

/// Boxed engine error kept for operator-facing logs.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Caller-facing status of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotFound,
    AlreadyExists,
    InvalidArgument,
    Internal,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NotFound => "NOT_FOUND",
            Status::AlreadyExists => "ALREADY_EXISTS",
            Status::InvalidArgument => "INVALID_ARGUMENT",
            Status::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for schema operations.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Target table does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Target column does not exist.
    #[error("column not found: {table}.{column}")]
    ColumnNotFound { table: String, column: String },

    /// Table to be created already exists.
    #[error("table already exists: {0}")]
    TableAlreadyExists(String),

    /// Column to be added already exists.
    #[error("column already exists: {table}.{column}")]
    ColumnAlreadyExists { table: String, column: String },

    /// Foreign key target table does not exist.
    #[error("reference table not found: {0}")]
    ReferenceTableNotFound(String),

    /// Foreign key target column does not exist.
    #[error("reference column not found: {table}.{column}")]
    ReferenceColumnNotFound { table: String, column: String },

    /// Column carries no foreign key constraint to drop.
    #[error("no foreign key constraint on {table}.{column}")]
    ForeignKeyNotFound { table: String, column: String },

    /// Table or column name rejected before any statement is built.
    #[error("invalid identifier {name:?}: {reason}")]
    InvalidIdentifier { name: String, reason: String },

    /// Column type missing, unrecognized, or out of bounds.
    #[error("invalid column type for '{column}': {reason}")]
    InvalidColumnType { column: String, reason: String },

    /// Introspected data type outside the supported set.
    #[error("unsupported column type '{data_type}' for column '{column}'")]
    UnsupportedColumnType { column: String, data_type: String },

    /// Introspection row the engine reported in an undecodable shape.
    #[error("cannot decode column '{column}': {reason}")]
    IntrospectionDecode { column: String, reason: String },

    /// Statement template failed to render.
    #[error("failed to render template '{template}'")]
    TemplateRendering {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    /// An existence or type lookup against the database failed.
    #[error("precondition check failed: {check}")]
    Precondition {
        check: String,
        #[source]
        source: BoxError,
    },

    /// The database rejected a statement.
    #[error("statement execution failed: {context}")]
    StatementExecution {
        context: String,
        #[source]
        source: BoxError,
    },

    /// A multi-statement transaction failed and was rolled back.
    #[error("transaction failed: {context}")]
    Transaction {
        context: String,
        #[source]
        source: BoxError,
    },

    /// Connection pool error.
    #[error("connection pool error: {context}")]
    Pool {
        context: String,
        #[source]
        source: BoxError,
    },

    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    /// Create an InvalidColumnType error.
    pub fn invalid_type(column: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::InvalidColumnType {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidIdentifier error.
    pub fn invalid_identifier(name: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::InvalidIdentifier {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a Precondition error wrapping the engine error.
    pub fn precondition(check: impl Into<String>, source: impl Into<BoxError>) -> Self {
        SchemaError::Precondition {
            check: check.into(),
            source: source.into(),
        }
    }

    /// Create a StatementExecution error wrapping the engine error.
    pub fn execution(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        SchemaError::StatementExecution {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Create a Transaction error wrapping the underlying failure.
    pub fn transaction(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        SchemaError::Transaction {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Create a Pool error.
    pub fn pool(source: impl Into<BoxError>, context: impl Into<String>) -> Self {
        SchemaError::Pool {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Map this error onto the status surfaced to callers.
    pub fn status(&self) -> Status {
        match self {
            SchemaError::TableNotFound(_)
            | SchemaError::ColumnNotFound { .. }
            | SchemaError::ReferenceTableNotFound(_)
            | SchemaError::ReferenceColumnNotFound { .. }
            | SchemaError::ForeignKeyNotFound { .. } => Status::NotFound,
            SchemaError::TableAlreadyExists(_) | SchemaError::ColumnAlreadyExists { .. } => {
                Status::AlreadyExists
            }
            SchemaError::InvalidIdentifier { .. } | SchemaError::InvalidColumnType { .. } => {
                Status::InvalidArgument
            }
            SchemaError::UnsupportedColumnType { .. }
            | SchemaError::IntrospectionDecode { .. }
            | SchemaError::TemplateRendering { .. }
            | SchemaError::Precondition { .. }
            | SchemaError::StatementExecution { .. }
            | SchemaError::Transaction { .. }
            | SchemaError::Pool { .. }
            | SchemaError::Config(_)
            | SchemaError::Io(_)
            | SchemaError::Yaml(_)
            | SchemaError::Json(_) => Status::Internal,
        }
    }

    /// Message safe to hand to callers.
    ///
    /// Internal errors never expose the engine error; it stays in the source
    /// chain for logs.
    pub fn client_message(&self) -> String {
        match self.status() {
            Status::Internal => match self {
                SchemaError::UnsupportedColumnType { .. }
                | SchemaError::IntrospectionDecode { .. } => {
                    "failed to decode column type".to_string()
                }
                SchemaError::TemplateRendering { .. } => "failed to render statement".to_string(),
                SchemaError::Precondition { check, .. } => format!("failed to {}", check),
                SchemaError::StatementExecution { context, .. }
                | SchemaError::Transaction { context, .. } => format!("failed {}", context),
                SchemaError::Pool { .. } => "failed to connect to database".to_string(),
                _ => "internal error".to_string(),
            },
            _ => self.to_string(),
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            SchemaError::Config(_) | SchemaError::Yaml(_) | SchemaError::Json(_) => 1,
            SchemaError::Pool { .. } => 6,
            SchemaError::Io(_) => 7,
            _ => match self.status() {
                Status::NotFound => 2,
                Status::AlreadyExists => 3,
                Status::InvalidArgument => 4,
                Status::Internal => 5,
            },
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
