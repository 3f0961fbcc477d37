//! Classification of statements as generated by common query builders.

use pretty_assertions::assert_eq;
use sqlmeter_lang::{extract, ExtractErrorKind, Method, QueryLabel};

fn label(method: Method, table: &str) -> QueryLabel {
    QueryLabel {
        method,
        table: table.to_string(),
    }
}

#[test]
fn test_builder_output_for_each_dialect() {
    let cases = [
        (
            r#"SELECT "id", "username" FROM "users" WHERE "id" = $1"#,
            label(Method::Select, "users"),
        ),
        (
            "SELECT `id`, `username` FROM `users` WHERE `id` = ?",
            label(Method::Select, "users"),
        ),
        (
            "SELECT [id] FROM [users] WHERE [id] = :id",
            label(Method::Select, "users"),
        ),
        (
            r#"INSERT INTO "users" ("username") VALUES ($1) RETURNING "id""#,
            label(Method::Insert, "users"),
        ),
        (
            "UPDATE `users` SET `username` = ? WHERE `id` = ?",
            label(Method::Update, "users"),
        ),
        (
            r#"DELETE FROM "users" WHERE "id" = $1"#,
            label(Method::Delete, "users"),
        ),
    ];

    for (sql, expected) in cases {
        assert_eq!(extract(sql).unwrap(), expected, "{}", sql);
    }
}

#[test]
fn test_case_and_whitespace_do_not_matter() {
    let a = extract("select id from users").unwrap();
    let b = extract("  SELECT\n\tid\n  FROM\n users ;").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_joins_label_the_first_table() {
    let sql = "SELECT u.id, o.total FROM users u \
               LEFT JOIN orders o ON o.user_id = u.id \
               WHERE o.total > 100";
    assert_eq!(extract(sql).unwrap(), label(Method::Select, "users"));
}

#[test]
fn test_subquery_in_where_does_not_change_table() {
    let sql = "SELECT * FROM orders WHERE user_id IN (SELECT id FROM users)";
    assert_eq!(extract(sql).unwrap(), label(Method::Select, "orders"));
}

#[test]
fn test_insert_select_labels_target() {
    let sql = "INSERT INTO archive (id) SELECT id FROM events WHERE old";
    assert_eq!(extract(sql).unwrap(), label(Method::Insert, "archive"));
}

#[test]
fn test_with_select() {
    let sql = "WITH active AS (SELECT id FROM users WHERE active) \
               SELECT count(*) FROM active";
    assert_eq!(extract(sql).unwrap(), label(Method::Select, "active"));
}

#[test]
fn test_extraction_is_idempotent() {
    let sql = "DELETE FROM sessions WHERE expires_at < now()";
    let first = extract(sql).unwrap();
    for _ in 0..3 {
        assert_eq!(extract(sql).unwrap(), first);
    }
}

#[test]
fn test_errors_carry_location() {
    let source = "SELECT id\nFROM users\nWHERE name = 'open";
    let err = extract(source).unwrap_err();
    assert_eq!(err.kind, ExtractErrorKind::InvalidToken);

    let formatted = err.format_with_source(source);
    assert!(formatted.contains("line 3:"), "{}", formatted);
}

#[test]
fn test_schema_and_session_statements_are_labelled() {
    let cases = [
        ("SHOW TABLES", label(Method::Show, "")),
        ("SET search_path TO app", label(Method::Set, "")),
        (
            "CREATE INDEX idx_users_email ON users (email)",
            label(Method::Create, "users"),
        ),
        (
            "ALTER TABLE users ADD COLUMN age integer",
            label(Method::Alter, "users"),
        ),
        ("DROP VIEW IF EXISTS active_users", label(Method::Drop, "active_users")),
        (
            "EXPLAIN ANALYZE SELECT * FROM orders WHERE total > 10",
            label(Method::Explain, "orders"),
        ),
        ("DESCRIBE `users`", label(Method::Describe, "users")),
        ("BEGIN", label(Method::Begin, "")),
        ("COMMIT", label(Method::Commit, "")),
    ];

    for (sql, expected) in cases {
        assert_eq!(extract(sql).unwrap(), expected, "{}", sql);
    }
}

#[test]
fn test_non_ascii_table_names() {
    assert_eq!(
        extract("SELECT * FROM café").unwrap(),
        label(Method::Select, "café")
    );
    assert_eq!(
        extract("UPDATE 顧客 SET 名前 = ?").unwrap(),
        label(Method::Update, "顧客")
    );
}

#[test]
fn test_text_that_is_not_sql_is_rejected() {
    for sql in ["hello world", "42", "'just a string'", "= 1"] {
        let err = extract(sql).unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::UnsupportedStatement, "{}", sql);
        assert!(err.hint.as_deref().is_some_and(|h| h.contains("WITH")));
    }
}

#[test]
fn test_method_display() {
    assert_eq!(Method::Truncate.to_string(), "TRUNCATE");
    assert_eq!(format!("{}", Method::Select), "SELECT");
}
