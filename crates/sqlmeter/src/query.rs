//! Query values and the engines that render them to SQL.

use std::fmt;

/// SQL dialect used to render a [`Query`].
pub trait Engine: Send + Sync + fmt::Debug {
    /// Short dialect name, for logs.
    fn name(&self) -> &'static str;

    /// Quote a single identifier part.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Placeholder for the 1-based bind parameter `index`.
    fn placeholder(&self, index: usize) -> String {
        let _ = index;
        "?".to_string()
    }

    /// Quote a possibly qualified name (`schema.table`) part by part.
    fn quote_name(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn quote_with(ident: &str, open: char, close: char) -> String {
    let mut quoted = String::with_capacity(ident.len() + 2);
    quoted.push(open);
    for c in ident.chars() {
        if c == close {
            quoted.push(close);
        }
        quoted.push(c);
    }
    quoted.push(close);
    quoted
}

/// PostgreSQL: `"ident"`, `$n` placeholders.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresEngine;

impl Engine for PostgresEngine {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_with(ident, '"', '"')
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }
}

/// MySQL: `` `ident` ``, `?` placeholders.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlEngine;

impl Engine for MySqlEngine {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_with(ident, '`', '`')
    }
}

/// SQLite: `"ident"`, `?` placeholders.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteEngine;

impl Engine for SqliteEngine {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_with(ident, '"', '"')
    }
}

/// Dialect-neutral rendering with bare identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonEngine;

impl Engine for CommonEngine {
    fn name(&self) -> &'static str {
        "common"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        ident.to_string()
    }
}

/// Something that renders to SQL text for a given engine.
pub trait Query {
    /// Render this query.
    fn sql(&self, engine: &dyn Engine) -> String;
}

impl Query for str {
    fn sql(&self, _engine: &dyn Engine) -> String {
        self.to_string()
    }
}

impl Query for String {
    fn sql(&self, _engine: &dyn Engine) -> String {
        self.clone()
    }
}

impl<Q: Query + ?Sized> Query for &Q {
    fn sql(&self, engine: &dyn Engine) -> String {
        (**self).sql(engine)
    }
}

/// SQL text passed through as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSql(String);

impl RawSql {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Query for RawSql {
    fn sql(&self, _engine: &dyn Engine) -> String {
        self.0.clone()
    }
}

/// Minimal `SELECT` builder.
///
/// ```
/// use sqlmeter::query::{MySqlEngine, PostgresEngine, Query, Select};
///
/// let query = Select::new()
///     .columns(["id", "username"])
///     .from("users")
///     .where_eq("id");
/// assert_eq!(
///     query.sql(&PostgresEngine),
///     r#"SELECT "id", "username" FROM "users" WHERE "id" = $1"#
/// );
/// assert_eq!(
///     query.sql(&MySqlEngine),
///     "SELECT `id`, `username` FROM `users` WHERE `id` = ?"
/// );
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Select {
    table: String,
    columns: Vec<String>,
    filters: Vec<String>,
}

impl Select {
    /// Empty select; all columns unless [`Select::columns`] is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the table to select from.
    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set the selected columns.
    pub fn columns<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add `column = <param>`; filters are joined with `AND`.
    pub fn where_eq(mut self, column: impl Into<String>) -> Self {
        self.filters.push(column.into());
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl Query for Select {
    fn sql(&self, engine: &dyn Engine) -> String {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(|c| engine.quote_name(c))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = format!("SELECT {} FROM {}", columns, engine.quote_name(&self.table));
        for (i, column) in self.filters.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(&engine.quote_name(column));
            sql.push_str(" = ");
            sql.push_str(&engine.placeholder(i + 1));
        }
        sql
    }
}
