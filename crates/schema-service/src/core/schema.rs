//! Column, foreign key, and introspection types.
//!
//! These types are built per request from caller input or rebuilt per row
//! from introspection; nothing here is cached between operations.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::typemap::referential::action_from_sql;

/// Integer column widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntWidth {
    Tinyint,
    Smallint,
    Mediumint,
    Int,
    Bigint,
}

impl IntWidth {
    /// SQL keyword for this width.
    pub fn keyword(&self) -> &'static str {
        match self {
            IntWidth::Tinyint => "TINYINT",
            IntWidth::Smallint => "SMALLINT",
            IntWidth::Mediumint => "MEDIUMINT",
            IntWidth::Int => "INT",
            IntWidth::Bigint => "BIGINT",
        }
    }

    /// Parse an engine data type keyword (case-insensitive).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "tinyint" => Some(IntWidth::Tinyint),
            "smallint" => Some(IntWidth::Smallint),
            "mediumint" => Some(IntWidth::Mediumint),
            "int" | "integer" => Some(IntWidth::Int),
            "bigint" => Some(IntWidth::Bigint),
            _ => None,
        }
    }
}

/// Approximate numeric kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FloatKind {
    Float,
    Double,
}

impl FloatKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            FloatKind::Float => "FLOAT",
            FloatKind::Double => "DOUBLE",
        }
    }
}

/// Column type with its modifiers. Exactly one variant is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeVariant {
    Int {
        width: IntWidth,
        #[serde(default)]
        unsigned: bool,
        #[serde(default)]
        auto_increment: bool,
    },
    Varchar {
        length: u32,
    },
    Decimal {
        precision: u32,
        scale: u32,
    },
    FixedPoint {
        #[serde(rename = "float_kind")]
        kind: FloatKind,
        precision: u32,
    },
    Bool,
    Timestamp,
    Text,
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,

    /// Column type. `None` means the caller supplied no type.
    #[serde(rename = "type", default)]
    pub column_type: Option<TypeVariant>,

    /// Whether the column accepts NULL (default: true).
    #[serde(default = "default_true")]
    pub nullable: bool,

    #[serde(default)]
    pub unique: bool,

    #[serde(default)]
    pub primary_key: bool,

    /// Default value as text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ColumnSpec {
    /// Create a nullable column with no constraints.
    pub fn new(name: impl Into<String>, column_type: TypeVariant) -> Self {
        Self {
            name: name.into(),
            column_type: Some(column_type),
            nullable: true,
            unique: false,
            primary_key: false,
            default_value: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Action applied to dependent rows when a foreign key target changes.
///
/// Unrecognized values deserialize to `NoAction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    Restrict,
    #[default]
    NoAction,
}

impl From<String> for ReferentialAction {
    fn from(value: String) -> Self {
        action_from_sql(&value.trim().replace('_', " ").to_ascii_uppercase())
    }
}

/// A foreign key from one column to a column of another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeySpec {
    pub column_name: String,
    pub reference_table_name: String,
    pub reference_column_name: String,
    #[serde(default)]
    pub on_update: ReferentialAction,
    #[serde(default)]
    pub on_delete: ReferentialAction,
}

impl ForeignKeySpec {
    /// Create a foreign key with `NO ACTION` on both update and delete.
    pub fn new(
        column_name: impl Into<String>,
        reference_table_name: impl Into<String>,
        reference_column_name: impl Into<String>,
    ) -> Self {
        Self {
            column_name: column_name.into(),
            reference_table_name: reference_table_name.into(),
            reference_column_name: reference_column_name.into(),
            on_update: ReferentialAction::NoAction,
            on_delete: ReferentialAction::NoAction,
        }
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = action;
        self
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = action;
        self
    }
}

/// One row of the column introspection query.
///
/// Field order mirrors the query's select list and must not change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawIntrospectedColumn {
    pub column_name: String,
    /// Engine type keyword, e.g. `int`, `varchar`.
    pub data_type: String,
    /// Full engine type string, e.g. `int unsigned`, `decimal(10,2)`.
    pub column_type: String,
    /// `YES` or `NO`.
    pub is_nullable: String,
    pub column_default: Option<String>,
    pub max_length: Option<u64>,
    /// e.g. `auto_increment`.
    pub extra: String,
    pub is_unique: bool,
    pub is_primary: bool,
    pub is_foreign: bool,
    pub reference_table_name: Option<String>,
    pub reference_column_name: Option<String>,
    pub on_update: Option<String>,
    pub on_delete: Option<String>,
}

/// Table summary returned by ListTables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDetails {
    pub table_name: String,
    pub row_count: u64,
    pub size_bytes: u64,
    pub comment: Option<String>,
    pub create_time: Option<NaiveDateTime>,
}

/// Columns and foreign keys of one table, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnListing {
    pub columns: Vec<ColumnSpec>,
    pub foreign_keys: Vec<ForeignKeySpec>,
}

fn default_true() -> bool {
    true
}
