//! Core types and the database collaborator seam.
//!
//! - [`identifier`]: identifier validation and quoting
//! - [`schema`]: column type model, foreign keys, introspection rows
//! - [`traits`]: [`SchemaCatalog`] and [`SchemaTransaction`]

pub mod identifier;
pub mod schema;
pub mod traits;

pub use schema::{
    ColumnListing, ColumnSpec, FloatKind, ForeignKeySpec, IntWidth, RawIntrospectedColumn,
    ReferentialAction, TableDetails, TypeVariant,
};
pub use traits::{SchemaCatalog, SchemaTransaction};
