//! Identifier validation and quoting for MySQL.
//!
//! Table and column names cannot be bound as statement parameters, so every
//! name that reaches a DDL statement is validated first and quoted when it is
//! not a plain word.

use crate::error::{Result, SchemaError};

/// MySQL identifier length limit.
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Reserved words that must be quoted even though they look like plain names.
const RESERVED_WORDS: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "AS", "ASC", "BETWEEN", "BIGINT", "BY", "CASCADE", "CASE",
    "CHANGE", "CHECK", "COLUMN", "CONSTRAINT", "CREATE", "CROSS", "DATABASE", "DECIMAL",
    "DEFAULT", "DELETE", "DESC", "DISTINCT", "DOUBLE", "DROP", "ELSE", "EXISTS", "FALSE",
    "FLOAT", "FOR", "FOREIGN", "FROM", "FULLTEXT", "GROUP", "HAVING", "IF", "IN", "INDEX",
    "INNER", "INSERT", "INT", "INTEGER", "INTERVAL", "INTO", "IS", "JOIN", "KEY", "KEYS",
    "LEFT", "LIKE", "LIMIT", "LOCK", "MEDIUMINT", "NOT", "NULL", "ON", "OR", "ORDER", "OUTER",
    "PRIMARY", "RANGE", "REFERENCES", "RENAME", "REPLACE", "RESTRICT", "RIGHT", "ROW", "ROWS",
    "SELECT", "SET", "SMALLINT", "TABLE", "THEN", "TINYINT", "TO", "TRUE", "UNION", "UNIQUE",
    "UNSIGNED", "UPDATE", "USAGE", "USING", "VALUES", "VARCHAR", "WHEN", "WHERE", "WITH",
];

/// Validate a caller-supplied identifier.
///
/// Rejects empty names, names containing NUL, and names longer than
/// [`MAX_IDENTIFIER_LENGTH`] characters.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SchemaError::invalid_identifier(name, "identifier cannot be empty"));
    }

    if name.contains('\0') {
        return Err(SchemaError::invalid_identifier(
            name,
            "identifier contains a null byte",
        ));
    }

    let length = name.chars().count();
    if length > MAX_IDENTIFIER_LENGTH {
        return Err(SchemaError::invalid_identifier(
            name,
            format!(
                "identifier exceeds maximum length of {} characters (got {})",
                MAX_IDENTIFIER_LENGTH, length
            ),
        ));
    }

    Ok(())
}

/// Whether `name` can appear in a statement without backticks.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

    starts_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED_WORDS
            .iter()
            .any(|word| word.eq_ignore_ascii_case(name))
}

/// Quote a MySQL identifier.
///
/// Plain names are returned as-is; anything else is wrapped in backticks with
/// embedded backticks doubled.
pub fn quote_mysql(name: &str) -> String {
    if is_plain_identifier(name) {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_normal() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("column with spaces").is_ok());
        assert!(validate_identifier("日本語").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_empty() {
        let err = validate_identifier("").unwrap_err();
        assert!(err.to_string().contains("empty"));
        assert_eq!(err.status(), crate::error::Status::InvalidArgument);
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        let err = validate_identifier("table\0name").unwrap_err();
        assert!(err.to_string().contains("null byte"));
    }

    #[test]
    fn test_validate_identifier_length() {
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH)).is_ok());
        let err = validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH + 1)).unwrap_err();
        assert!(err.to_string().contains("maximum length"));
    }

    #[test]
    fn test_plain_identifiers_stay_bare() {
        assert_eq!(quote_mysql("title"), "title");
        assert_eq!(quote_mysql("created_by"), "created_by");
        assert_eq!(quote_mysql("_tmp2"), "_tmp2");
    }

    #[test]
    fn test_reserved_and_unusual_names_are_quoted() {
        assert_eq!(quote_mysql("order"), "`order`");
        assert_eq!(quote_mysql("Key"), "`Key`");
        assert_eq!(quote_mysql("2fa"), "`2fa`");
        assert_eq!(quote_mysql("first name"), "`first name`");
    }

    #[test]
    fn test_quote_mysql_escapes_backtick() {
        assert_eq!(quote_mysql("table`name"), "`table``name`");
        assert_eq!(
            quote_mysql("Robert`); DROP TABLE Students;--"),
            "`Robert``); DROP TABLE Students;--`"
        );
    }
}
