//! SQL filters for the statement templates.

use minijinja::Environment;

use crate::core::identifier::quote_mysql;

/// Defaults that are SQL expressions rather than string literals.
const DEFAULT_KEYWORDS: &[&str] = &[
    "CURRENT_TIMESTAMP",
    "CURRENT_TIMESTAMP()",
    "NOW()",
    "NULL",
    "TRUE",
    "FALSE",
];

/// SQL-specific filters
pub struct SqlFilters;

impl SqlFilters {
    /// Quote a string literal.
    pub fn sqlquote(value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

    /// Quote an identifier (table/column name) when it is not a plain word.
    pub fn ident(value: &str) -> String {
        quote_mysql(value)
    }

    /// Render a column default: keywords and numbers verbatim, anything else
    /// as a string literal.
    pub fn sql_default(value: &str) -> String {
        let trimmed = value.trim();
        if DEFAULT_KEYWORDS
            .iter()
            .any(|keyword| keyword.eq_ignore_ascii_case(trimmed))
        {
            trimmed.to_ascii_uppercase()
        } else if is_numeric_literal(trimmed) {
            trimmed.to_string()
        } else {
            Self::sqlquote(value)
        }
    }
}

/// `-12`, `3.5`, `0.25`; not `1e5`, `.5` or `NaN`.
fn is_numeric_literal(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(whole) && fraction.map_or(true, all_digits)
}

/// Register all SQL filters with a MiniJinja environment
pub fn register_filters(env: &mut Environment) {
    env.add_filter("sqlquote", |value: String| SqlFilters::sqlquote(&value));
    env.add_filter("ident", |value: String| SqlFilters::ident(&value));
    env.add_filter("sql_default", |value: String| {
        SqlFilters::sql_default(&value)
    });
}
