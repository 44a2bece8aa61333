//! DDL synthesis from embedded statement templates.
//!
//! Rendering is pure: every fact a statement needs (resolved column types,
//! constraint names, the database name) is passed in by the caller. Any
//! rendering failure is a [`SchemaError::TemplateRendering`], which callers
//! see as an internal error.
//!
//! - [`filters`]: `ident`, `sqlquote` and `sql_default`

pub mod filters;

use minijinja::{context, Environment, ErrorKind, UndefinedBehavior};
use serde::Serialize;
use tracing::debug;

use crate::config::Conventions;
use crate::core::schema::{ColumnSpec, ForeignKeySpec};
use crate::error::{Result, SchemaError};
use crate::typemap::{self, referential::action_to_sql};

/// Column type used for any column that references the users table.
pub const OWNER_REFERENCE_TYPE: &str = "BIGINT UNSIGNED";

const TEMPLATES: &[(&str, &str)] = &[
    (
        "column_definition.sql",
        include_str!("../../templates/column_definition.sql"),
    ),
    (
        "create_table.sql",
        include_str!("../../templates/create_table.sql"),
    ),
    ("drop_table.sql", include_str!("../../templates/drop_table.sql")),
    ("add_column.sql", include_str!("../../templates/add_column.sql")),
    ("drop_column.sql", include_str!("../../templates/drop_column.sql")),
    (
        "add_foreign_key.sql",
        include_str!("../../templates/add_foreign_key.sql"),
    ),
    (
        "drop_foreign_key_constraint.sql",
        include_str!("../../templates/drop_foreign_key_constraint.sql"),
    ),
    (
        "drop_foreign_key_column.sql",
        include_str!("../../templates/drop_foreign_key_column.sql"),
    ),
    (
        "list_tables.sql",
        include_str!("../../templates/list_tables.sql"),
    ),
    (
        "list_columns.sql",
        include_str!("../../templates/list_columns.sql"),
    ),
];

/// A column whose type has been resolved to its SQL fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    /// Resolve a column's type through the type codec.
    pub fn resolve(column: &ColumnSpec) -> Result<Self> {
        Ok(Self {
            name: column.name.clone(),
            sql_type: typemap::to_sql(column)?,
            nullable: column.nullable,
            unique: column.unique,
            primary_key: column.primary_key,
            default_value: column.default_value.clone(),
        })
    }
}

/// A foreign key with its referential actions rendered to SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyDefinition {
    pub column_name: String,
    pub reference_table_name: String,
    pub reference_column_name: String,
    pub on_update: &'static str,
    pub on_delete: &'static str,
}

impl From<&ForeignKeySpec> for ForeignKeyDefinition {
    fn from(fk: &ForeignKeySpec) -> Self {
        Self {
            column_name: fk.column_name.clone(),
            reference_table_name: fk.reference_table_name.clone(),
            reference_column_name: fk.reference_column_name.clone(),
            on_update: action_to_sql(fk.on_update),
            on_delete: action_to_sql(fk.on_delete),
        }
    }
}

/// The two statements that remove a foreign key column, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropForeignKeyStatements {
    pub drop_constraint: String,
    pub drop_column: String,
}

/// Renders DDL and introspection statements.
pub struct DdlSynthesizer {
    env: Environment<'static>,
    conventions: Conventions,
}

impl DdlSynthesizer {
    /// Build the template environment.
    pub fn new(conventions: Conventions) -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        filters::register_filters(&mut env);

        for &(name, text) in TEMPLATES {
            env.add_template(name, text)
                .map_err(|source| SchemaError::TemplateRendering {
                    template: name.to_string(),
                    source,
                })?;
        }

        Ok(Self { env, conventions })
    }

    pub fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    /// Whether `table` is the system users table.
    pub fn is_users_table(&self, table: &str) -> bool {
        table == self.conventions.users_table
    }

    /// `CREATE TABLE IF NOT EXISTS` with the caller's columns, the audit
    /// columns, the owning foreign key and the caller's foreign keys.
    pub fn create_table(
        &self,
        table_name: &str,
        columns: &[ColumnDefinition],
        foreign_keys: &[ForeignKeyDefinition],
        table_comment: Option<&str>,
    ) -> Result<String> {
        self.render(
            "create_table.sql",
            context! {
                table_name,
                columns,
                foreign_keys,
                table_comment,
                conventions => &self.conventions,
            },
        )
    }

    pub fn drop_table(&self, table_name: &str) -> Result<String> {
        self.render("drop_table.sql", context! { table_name })
    }

    pub fn add_column(&self, table_name: &str, column: &ColumnDefinition) -> Result<String> {
        self.render("add_column.sql", context! { table_name, column })
    }

    pub fn drop_column(&self, table_name: &str, column_name: &str) -> Result<String> {
        self.render("drop_column.sql", context! { table_name, column_name })
    }

    /// One `ALTER TABLE` adding the column and its constraint.
    ///
    /// A reference to the users table always gets [`OWNER_REFERENCE_TYPE`];
    /// any other reference needs the referenced column's type.
    pub fn add_foreign_key(
        &self,
        table_name: &str,
        foreign_key: &ForeignKeySpec,
        reference_column_type: Option<&str>,
        not_nullable: bool,
    ) -> Result<String> {
        let column_type = if self.is_users_table(&foreign_key.reference_table_name) {
            OWNER_REFERENCE_TYPE
        } else {
            reference_column_type.ok_or_else(|| SchemaError::TemplateRendering {
                template: "add_foreign_key.sql".to_string(),
                source: minijinja::Error::new(
                    ErrorKind::UndefinedError,
                    "reference column type is required",
                ),
            })?
        };
        let fk = ForeignKeyDefinition::from(foreign_key);

        self.render(
            "add_foreign_key.sql",
            context! {
                table_name,
                column_name => fk.column_name,
                column_type,
                reference_table_name => fk.reference_table_name,
                reference_column_name => fk.reference_column_name,
                not_nullable,
                on_update => fk.on_update,
                on_delete => fk.on_delete,
            },
        )
    }

    pub fn drop_foreign_key(
        &self,
        table_name: &str,
        constraint_name: &str,
        column_name: &str,
    ) -> Result<DropForeignKeyStatements> {
        Ok(DropForeignKeyStatements {
            drop_constraint: self.render(
                "drop_foreign_key_constraint.sql",
                context! { table_name, constraint_name },
            )?,
            drop_column: self.render(
                "drop_foreign_key_column.sql",
                context! { table_name, column_name },
            )?,
        })
    }

    /// Table listing query for one database.
    pub fn list_tables(&self, database_name: &str) -> Result<String> {
        self.render("list_tables.sql", context! { database_name })
    }

    /// Column introspection query for one database, with a single `?`
    /// placeholder for the table name.
    pub fn list_columns(&self, database_name: &str) -> Result<String> {
        self.render("list_columns.sql", context! { database_name })
    }

    fn render<S: Serialize>(&self, template: &str, ctx: S) -> Result<String> {
        let wrap = |source: minijinja::Error| SchemaError::TemplateRendering {
            template: template.to_string(),
            source,
        };
        let sql = self
            .env
            .get_template(template)
            .and_then(|tmpl| tmpl.render(ctx))
            .map_err(wrap)?;
        let sql = sql.trim().to_string();
        debug!("Rendered {}: {}", template, sql);
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{IntWidth, ReferentialAction, TypeVariant};

    fn synthesizer() -> DdlSynthesizer {
        DdlSynthesizer::new(Conventions::default()).unwrap()
    }

    fn resolve(columns: &[ColumnSpec]) -> Vec<ColumnDefinition> {
        columns
            .iter()
            .map(|c| ColumnDefinition::resolve(c).unwrap())
            .collect()
    }

    #[test]
    fn test_create_table_contains_columns_and_owner() {
        let columns = resolve(&[ColumnSpec::new("title", TypeVariant::Varchar { length: 100 })]);
        let sql = synthesizer()
            .create_table("posts", &columns, &[], None)
            .unwrap();

        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS posts ("));
        assert!(sql.contains("title VARCHAR(100),"));
        assert!(sql.contains("created_by BIGINT UNSIGNED NOT NULL"));
        assert!(sql.contains("created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP"));
        assert!(sql.contains("ON UPDATE CURRENT_TIMESTAMP"));
        assert!(sql.contains(
            "FOREIGN KEY (created_by) REFERENCES users(id) ON UPDATE CASCADE ON DELETE CASCADE"
        ));
        assert!(sql.ends_with(')'));
        assert!(!sql.contains("COMMENT"));
    }

    #[test]
    fn test_create_table_preserves_column_order_and_clauses() {
        let columns = resolve(&[
            ColumnSpec::new(
                "id",
                TypeVariant::Int {
                    width: IntWidth::Bigint,
                    unsigned: true,
                    auto_increment: true,
                },
            )
            .not_null()
            .primary_key(),
            ColumnSpec::new("slug", TypeVariant::Varchar { length: 64 })
                .not_null()
                .unique(),
            ColumnSpec::new("status", TypeVariant::Varchar { length: 16 }).with_default("draft"),
        ]);
        let sql = synthesizer()
            .create_table("posts", &columns, &[], Some("Blog posts"))
            .unwrap();

        let id = sql
            .find("id BIGINT UNSIGNED AUTO_INCREMENT NOT NULL PRIMARY KEY")
            .unwrap();
        let slug = sql.find("slug VARCHAR(64) NOT NULL UNIQUE").unwrap();
        let status = sql.find("status VARCHAR(16) DEFAULT 'draft'").unwrap();
        assert!(id < slug && slug < status);
        assert!(sql.ends_with(") COMMENT = 'Blog posts'"));
    }

    #[test]
    fn test_create_table_appends_caller_foreign_keys() {
        let columns = resolve(&[ColumnSpec::new(
            "category_id",
            TypeVariant::Int {
                width: IntWidth::Int,
                unsigned: true,
                auto_increment: false,
            },
        )]);
        let fk = ForeignKeySpec::new("category_id", "categories", "id")
            .on_delete(ReferentialAction::SetNull);
        let sql = synthesizer()
            .create_table("posts", &columns, &[ForeignKeyDefinition::from(&fk)], None)
            .unwrap();

        let owner = sql.find("FOREIGN KEY (created_by)").unwrap();
        let category = sql
            .find("FOREIGN KEY (category_id) REFERENCES categories(id) ON UPDATE NO ACTION ON DELETE SET NULL")
            .unwrap();
        assert!(owner < category);
    }

    #[test]
    fn test_create_table_quotes_unusual_names() {
        let columns = resolve(&[ColumnSpec::new("order", TypeVariant::Text)]);
        let sql = synthesizer()
            .create_table("my table", &columns, &[], Some("it's"))
            .unwrap();
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS `my table`"));
        assert!(sql.contains("`order` TEXT,"));
        assert!(sql.contains("COMMENT = 'it''s'"));
    }

    #[test]
    fn test_create_table_uses_conventions() {
        let conventions = Conventions {
            users_table: "accounts".to_string(),
            users_id_column: "account_id".to_string(),
            owner_column: "owner".to_string(),
            created_at_column: "inserted_at".to_string(),
            updated_at_column: "modified_at".to_string(),
        };
        let sql = DdlSynthesizer::new(conventions)
            .unwrap()
            .create_table("notes", &[], &[], None)
            .unwrap();
        assert!(sql.contains("owner BIGINT UNSIGNED NOT NULL"));
        assert!(sql.contains("inserted_at TIMESTAMP"));
        assert!(sql.contains("modified_at TIMESTAMP"));
        assert!(sql.contains("REFERENCES accounts(account_id)"));
    }

    #[test]
    fn test_add_and_drop_column() {
        let synth = synthesizer();
        let column = ColumnDefinition::resolve(
            &ColumnSpec::new("published_at", TypeVariant::Timestamp)
                .with_default("CURRENT_TIMESTAMP"),
        )
        .unwrap();
        assert_eq!(
            synth.add_column("posts", &column).unwrap(),
            "ALTER TABLE posts ADD COLUMN published_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP"
        );
        assert_eq!(
            synth.drop_column("posts", "published_at").unwrap(),
            "ALTER TABLE posts DROP COLUMN published_at"
        );
        assert_eq!(synth.drop_table("posts").unwrap(), "DROP TABLE posts");
    }

    #[test]
    fn test_add_foreign_key_to_users_ignores_looked_up_type() {
        let fk = ForeignKeySpec::new("owner_id", "users", "id");
        let sql = synthesizer()
            .add_foreign_key("posts", &fk, Some("int"), false)
            .unwrap();
        assert!(sql.contains("ADD COLUMN owner_id BIGINT UNSIGNED,"));
        assert!(sql.contains(
            "ADD FOREIGN KEY (owner_id) REFERENCES users(id) ON UPDATE NO ACTION ON DELETE NO ACTION"
        ));
    }

    #[test]
    fn test_add_foreign_key_uses_reference_type() {
        let fk = ForeignKeySpec::new("category_id", "categories", "id")
            .on_update(ReferentialAction::Cascade)
            .on_delete(ReferentialAction::Restrict);
        let sql = synthesizer()
            .add_foreign_key("posts", &fk, Some("int unsigned"), true)
            .unwrap();
        assert!(sql.starts_with("ALTER TABLE posts"));
        assert!(sql.contains("ADD COLUMN category_id int unsigned NOT NULL,"));
        assert!(sql.contains("ON UPDATE CASCADE ON DELETE RESTRICT"));
    }

    #[test]
    fn test_add_foreign_key_without_reference_type_is_internal() {
        let fk = ForeignKeySpec::new("category_id", "categories", "id");
        let err = synthesizer()
            .add_foreign_key("posts", &fk, None, false)
            .unwrap_err();
        assert!(matches!(err, SchemaError::TemplateRendering { .. }));
        assert_eq!(err.status(), crate::error::Status::Internal);
    }

    #[test]
    fn test_drop_foreign_key_statements() {
        let statements = synthesizer()
            .drop_foreign_key("posts", "posts_ibfk_2", "category_id")
            .unwrap();
        assert_eq!(
            statements.drop_constraint,
            "ALTER TABLE posts DROP FOREIGN KEY posts_ibfk_2"
        );
        assert_eq!(
            statements.drop_column,
            "ALTER TABLE posts DROP COLUMN category_id"
        );
    }

    #[test]
    fn test_introspection_queries_scope_database() {
        let synth = synthesizer();
        let tables = synth.list_tables("app").unwrap();
        assert!(tables.contains("information_schema.TABLES"));
        assert!(tables.contains("TABLE_SCHEMA = 'app'"));

        let columns = synth.list_columns("o'app").unwrap();
        assert!(columns.contains("c.TABLE_SCHEMA = 'o''app'"));
        assert_eq!(columns.matches('?').count(), 1);
        assert!(columns.starts_with("SELECT"));
    }

    #[test]
    fn test_list_columns_yields_one_row_per_column() {
        let columns = synthesizer().list_columns("app").unwrap();
        // one foreign key per column, picked the same way as the constraint lookup
        assert!(columns.contains("SELECT MIN(first_fk.CONSTRAINT_NAME)"));
        assert!(columns.contains("first_fk.REFERENCED_TABLE_NAME IS NOT NULL"));
        // composite UNIQUE constraints do not mark their members unique
        assert!(columns.contains(") = 1"));
        assert_eq!(columns.matches("LEFT JOIN").count(), 2);
    }
}
