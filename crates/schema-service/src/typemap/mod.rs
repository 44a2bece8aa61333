//! Type mapping between the column model and MySQL.
//!
//! Encoding ([`to_sql`]) validates bounds and never guesses: a missing type is
//! an error. Decoding ([`from_introspection`]) accepts a fixed set of engine
//! data types and rejects everything else.

pub mod referential;

use crate::core::schema::{
    ColumnSpec, FloatKind, ForeignKeySpec, IntWidth, RawIntrospectedColumn, TypeVariant,
};
use crate::error::{Result, SchemaError};

use referential::action_from_sql;

/// Largest VARCHAR length accepted.
pub const VARCHAR_MAX_LENGTH: u32 = 65_535;

/// Encode a column's type as an SQL type fragment.
pub fn to_sql(column: &ColumnSpec) -> Result<String> {
    let variant = column
        .column_type
        .as_ref()
        .ok_or_else(|| SchemaError::invalid_type(&column.name, "column type is required"))?;

    match variant {
        TypeVariant::Int {
            width,
            unsigned,
            auto_increment,
        } => {
            let mut sql = width.keyword().to_string();
            if *unsigned {
                sql.push_str(" UNSIGNED");
            }
            if *auto_increment {
                sql.push_str(" AUTO_INCREMENT");
            }
            Ok(sql)
        }
        TypeVariant::Varchar { length } => {
            if *length < 1 || *length > VARCHAR_MAX_LENGTH {
                return Err(SchemaError::invalid_type(
                    &column.name,
                    format!(
                        "varchar length must be between 1 and {}, got {}",
                        VARCHAR_MAX_LENGTH, length
                    ),
                ));
            }
            Ok(format!("VARCHAR({})", length))
        }
        TypeVariant::Decimal { precision, scale } => {
            if *precision == 0 {
                return Err(SchemaError::invalid_type(
                    &column.name,
                    "decimal precision is required",
                ));
            }
            // scale = 0 is rejected as well; see DESIGN.md before relaxing this.
            if *scale == 0 {
                return Err(SchemaError::invalid_type(
                    &column.name,
                    "decimal scale is required",
                ));
            }
            Ok(format!("DECIMAL({}, {})", precision, scale))
        }
        TypeVariant::FixedPoint { kind, precision } => {
            Ok(format!("{}({})", kind.keyword(), precision))
        }
        TypeVariant::Bool => Ok("BOOLEAN".to_string()),
        TypeVariant::Timestamp => Ok("TIMESTAMP".to_string()),
        TypeVariant::Text => Ok("TEXT".to_string()),
    }
}

/// Rebuild a column definition from one introspection row.
///
/// `tinyint` always decodes to [`TypeVariant::Bool`]; its width and
/// signedness are dropped. MySQL does not report a precision for FLOAT or
/// DOUBLE, so those decode with precision 0.
pub fn from_introspection(raw: &RawIntrospectedColumn) -> Result<ColumnSpec> {
    let data_type = raw.data_type.to_ascii_lowercase();
    let column_type = raw.column_type.to_ascii_lowercase();

    let variant = match data_type.as_str() {
        "tinyint" => TypeVariant::Bool,
        "smallint" | "mediumint" | "int" | "bigint" => TypeVariant::Int {
            width: IntWidth::from_keyword(&data_type).ok_or_else(|| unsupported(raw))?,
            unsigned: column_type.contains("unsigned"),
            auto_increment: raw.extra.to_ascii_lowercase().contains("auto_increment"),
        },
        "varchar" => {
            let length = raw
                .max_length
                .and_then(|len| u32::try_from(len).ok())
                .ok_or_else(|| SchemaError::IntrospectionDecode {
                    column: raw.column_name.clone(),
                    reason: "varchar column reports no usable maximum length".to_string(),
                })?;
            TypeVariant::Varchar { length }
        }
        "decimal" => {
            let args = type_arguments(&column_type);
            TypeVariant::Decimal {
                precision: args.first().copied().unwrap_or(0),
                scale: args.get(1).copied().unwrap_or(0),
            }
        }
        "float" | "double" => {
            let kind = if data_type == "float" {
                FloatKind::Float
            } else {
                FloatKind::Double
            };
            TypeVariant::FixedPoint {
                kind,
                precision: type_arguments(&column_type).first().copied().unwrap_or(0),
            }
        }
        "text" => TypeVariant::Text,
        "timestamp" => TypeVariant::Timestamp,
        _ => return Err(unsupported(raw)),
    };

    Ok(ColumnSpec {
        name: raw.column_name.clone(),
        column_type: Some(variant),
        nullable: !raw.is_nullable.eq_ignore_ascii_case("NO"),
        unique: raw.is_unique,
        primary_key: raw.is_primary,
        default_value: raw.column_default.clone(),
    })
}

/// Foreign key carried by an introspection row, if any.
///
/// Missing or unknown referential actions fall back to `NO ACTION`.
pub fn foreign_key_from_introspection(raw: &RawIntrospectedColumn) -> Option<ForeignKeySpec> {
    if !raw.is_foreign {
        return None;
    }

    Some(ForeignKeySpec {
        column_name: raw.column_name.clone(),
        reference_table_name: raw.reference_table_name.clone().unwrap_or_default(),
        reference_column_name: raw.reference_column_name.clone().unwrap_or_default(),
        on_update: action_from_sql(raw.on_update.as_deref().unwrap_or_default()),
        on_delete: action_from_sql(raw.on_delete.as_deref().unwrap_or_default()),
    })
}

fn unsupported(raw: &RawIntrospectedColumn) -> SchemaError {
    SchemaError::UnsupportedColumnType {
        column: raw.column_name.clone(),
        data_type: raw.data_type.clone(),
    }
}

/// Numeric arguments of a type string: `decimal(10,2) unsigned` → `[10, 2]`.
fn type_arguments(column_type: &str) -> Vec<u32> {
    let Some(open) = column_type.find('(') else {
        return Vec::new();
    };
    let Some(close) = column_type[open..].find(')') else {
        return Vec::new();
    };

    column_type[open + 1..open + close]
        .split(',')
        .filter_map(|arg| arg.trim().parse().ok())
        .collect()
}
