//! Statement classification.
//!
//! [`extract`] reduces a SQL statement to the `(method, table)` pair used to
//! label query metrics. It is not a SQL parser: it walks the token stream just
//! far enough to find the statement verb and the primary object it targets.

use std::fmt;

use crate::error::ExtractError;
use crate::lexer::{tokenize, SpannedToken, Token};
use crate::span::Span;

/// Statement verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `SELECT`
    Select,
    /// `INSERT`
    Insert,
    /// `UPDATE`
    Update,
    /// `DELETE`
    Delete,
    /// `REPLACE`
    Replace,
    /// `TRUNCATE`
    Truncate,
    /// `CREATE`
    Create,
    /// `ALTER`
    Alter,
    /// `DROP`
    Drop,
    /// `SHOW`
    Show,
    /// `SET`
    Set,
    /// `EXPLAIN`
    Explain,
    /// `DESCRIBE` or `DESC`
    Describe,
    /// `BEGIN`
    Begin,
    /// `COMMIT`
    Commit,
    /// `ROLLBACK`
    Rollback,
}

/// Verbs the lexer leaves as plain identifiers.
const WORD_METHODS: [(&str, Method); 10] = [
    ("CREATE", Method::Create),
    ("ALTER", Method::Alter),
    ("DROP", Method::Drop),
    ("SHOW", Method::Show),
    ("EXPLAIN", Method::Explain),
    ("DESCRIBE", Method::Describe),
    ("DESC", Method::Describe),
    ("BEGIN", Method::Begin),
    ("COMMIT", Method::Commit),
    ("ROLLBACK", Method::Rollback),
];

/// Words naming the kind of object a DDL statement targets.
const OBJECT_KINDS: [&str; 10] = [
    "INDEX",
    "VIEW",
    "SEQUENCE",
    "SCHEMA",
    "DATABASE",
    "TRIGGER",
    "FUNCTION",
    "PROCEDURE",
    "TYPE",
    "EXTENSION",
];

impl Method {
    /// Every classified verb, in the order they are documented.
    pub const ALL: [Method; 16] = [
        Method::Select,
        Method::Insert,
        Method::Update,
        Method::Delete,
        Method::Replace,
        Method::Truncate,
        Method::Create,
        Method::Alter,
        Method::Drop,
        Method::Show,
        Method::Set,
        Method::Explain,
        Method::Describe,
        Method::Begin,
        Method::Commit,
        Method::Rollback,
    ];

    /// Upper-case verb, as used for the `type` label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Select => "SELECT",
            Method::Insert => "INSERT",
            Method::Update => "UPDATE",
            Method::Delete => "DELETE",
            Method::Replace => "REPLACE",
            Method::Truncate => "TRUNCATE",
            Method::Create => "CREATE",
            Method::Alter => "ALTER",
            Method::Drop => "DROP",
            Method::Show => "SHOW",
            Method::Set => "SET",
            Method::Explain => "EXPLAIN",
            Method::Describe => "DESCRIBE",
            Method::Begin => "BEGIN",
            Method::Commit => "COMMIT",
            Method::Rollback => "ROLLBACK",
        }
    }

    /// Whether the statement reads or writes rows. Only these can follow a
    /// `WITH` clause or be the subject of `EXPLAIN`.
    pub fn is_data(&self) -> bool {
        matches!(
            self,
            Method::Select | Method::Insert | Method::Update | Method::Delete | Method::Replace
        )
    }

    fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Select => Some(Method::Select),
            Token::Insert => Some(Method::Insert),
            Token::Update => Some(Method::Update),
            Token::Delete => Some(Method::Delete),
            Token::Replace => Some(Method::Replace),
            Token::Truncate => Some(Method::Truncate),
            Token::Set => Some(Method::Set),
            Token::Ident(word) => WORD_METHODS
                .iter()
                .find(|(verb, _)| word.eq_ignore_ascii_case(verb))
                .map(|&(_, method)| method),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The labels derived from one statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryLabel {
    /// Statement verb.
    pub method: Method,
    /// Primary table or object, unquoted; qualified names keep their dots.
    /// Empty when the statement names none, as in `SELECT 1` or `SHOW TABLES`.
    pub table: String,
}

/// Derive `(method, table)` from SQL text.
///
/// ```
/// use sqlmeter_lang::{extract, Method};
///
/// let label = extract(r#"SELECT "id" FROM "users" WHERE "id" = 5"#).unwrap();
/// assert_eq!(label.method, Method::Select);
/// assert_eq!(label.table, "users");
/// ```
pub fn extract(sql: &str) -> Result<QueryLabel, ExtractError> {
    let tokens = tokenize(sql)?;
    Extractor {
        sql,
        tokens: &tokens,
        end: Span::new(sql.len(), sql.len()),
    }
    .statement()
}

fn is_word(token: &Token, word: &str) -> bool {
    matches!(token, Token::Ident(s) if s.eq_ignore_ascii_case(word))
}

fn is_object_kind(token: &Token) -> bool {
    *token == Token::Table || OBJECT_KINDS.iter().any(|kind| is_word(token, kind))
}

struct Extractor<'a> {
    sql: &'a str,
    tokens: &'a [SpannedToken],
    end: Span,
}

impl Extractor<'_> {
    fn statement(&self) -> Result<QueryLabel, ExtractError> {
        // Allow a parenthesised statement: (SELECT ...) UNION (SELECT ...)
        let start = self
            .tokens
            .iter()
            .position(|t| t.token != Token::LParen)
            .ok_or_else(|| ExtractError::empty(self.end))?;
        let first = &self.tokens[start];

        if first.token == Token::With {
            return self.common_table_expression(start + 1);
        }

        match Method::from_token(&first.token) {
            Some(method) => self.classify(method, start, first.span),
            None => Err(ExtractError::unsupported(self.text_of(first), first.span)),
        }
    }

    /// `WITH a AS (...), b AS (...) <statement>` is classified by the statement
    /// that follows the definitions.
    fn common_table_expression(&self, from: usize) -> Result<QueryLabel, ExtractError> {
        match self.data_statement(from) {
            Some((method, i)) => self.classify(method, i, self.tokens[i].span),
            None => Err(ExtractError::unsupported("WITH", self.tokens[from - 1].span)
                .with_hint("a WITH clause must be followed by a statement")),
        }
    }

    /// First data verb at parenthesis depth zero, starting at `from`.
    fn data_statement(&self, from: usize) -> Option<(Method, usize)> {
        let mut depth = 0usize;
        for (i, tok) in self.tokens.iter().enumerate().skip(from) {
            match tok.token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                ref token if depth == 0 => {
                    if let Some(method) = Method::from_token(token).filter(Method::is_data) {
                        return Some((method, i));
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn classify(&self, method: Method, at: usize, span: Span) -> Result<QueryLabel, ExtractError> {
        let table = match method {
            Method::Select => Some(self.select_table(at + 1).unwrap_or_default()),
            Method::Insert | Method::Replace => self
                .position_of(at + 1, &Token::Into)
                .and_then(|i| self.name_at(i + 1)),
            Method::Update => self.name_at(self.skip(at + 1, &[Token::Only])),
            Method::Delete => self
                .position_of(at + 1, &Token::From)
                .and_then(|i| self.name_at(self.skip(i + 1, &[Token::Only]))),
            Method::Truncate => {
                self.name_at(self.skip(at + 1, &[Token::Table, Token::Only]))
            }
            Method::Create | Method::Alter | Method::Drop => {
                Some(self.object_name(at + 1).unwrap_or_default())
            }
            // SHOW COLUMNS FROM users, SHOW CREATE TABLE users
            Method::Show => Some(
                self.position_of(at + 1, &Token::From)
                    .and_then(|i| self.name_at(i + 1))
                    .or_else(|| self.object_name(at + 1))
                    .unwrap_or_default(),
            ),
            Method::Explain | Method::Describe => {
                Some(self.explained_table(at + 1).unwrap_or_default())
            }
            Method::Set | Method::Begin | Method::Commit | Method::Rollback => Some(String::new()),
        };

        match table {
            Some(table) => Ok(QueryLabel { method, table }),
            None => {
                let err = ExtractError::missing_table(method.as_str(), span);
                Err(match method {
                    Method::Insert | Method::Replace => err.with_hint("expected INTO <table>"),
                    Method::Delete => err.with_hint("expected FROM <table>"),
                    _ => err,
                })
            }
        }
    }

    /// First `FROM <name>` of the outer query, falling back to one nested in a
    /// derived table.
    fn select_table(&self, from: usize) -> Option<String> {
        let mut depth = 0usize;
        let mut nested = None;
        for (i, tok) in self.tokens.iter().enumerate().skip(from) {
            match tok.token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                Token::From => {
                    if let Some(name) = self.name_at(i + 1) {
                        if depth == 0 {
                            return Some(name);
                        }
                        nested.get_or_insert(name);
                    }
                }
                Token::Semicolon if depth == 0 => break,
                _ => {}
            }
        }
        nested
    }

    /// `CREATE [OR REPLACE] [TEMPORARY] TABLE [IF NOT EXISTS] <name>` and the
    /// like. Index statements name the indexed table when they have `ON <table>`.
    fn object_name(&self, from: usize) -> Option<String> {
        let kind = self
            .tokens
            .iter()
            .enumerate()
            .skip(from)
            .take_while(|(_, t)| t.token != Token::LParen)
            .find(|(_, t)| is_object_kind(&t.token))
            .map(|(i, _)| i)?;

        if is_word(&self.tokens[kind].token, "INDEX") {
            let on = self
                .tokens
                .iter()
                .skip(kind + 1)
                .position(|t| is_word(&t.token, "ON"));
            if let Some(on) = on {
                return self.name_at(kind + 1 + on + 1);
            }
        }

        let at = self.skip_words(kind + 1, &["IF", "NOT", "EXISTS", "CONCURRENTLY"]);
        self.name_at(self.skip(at, &[Token::Only]))
    }

    /// Table of the statement after `EXPLAIN [options]`, or the name after
    /// `DESCRIBE`.
    fn explained_table(&self, from: usize) -> Option<String> {
        let explained = match self.tokens.get(from) {
            Some(tok) if tok.token == Token::With => self.common_table_expression(from + 1).ok(),
            _ => self
                .data_statement(from)
                .and_then(|(method, i)| self.classify(method, i, self.tokens[i].span).ok()),
        };
        match explained {
            Some(label) => Some(label.table),
            None => self.name_at(from),
        }
    }

    fn position_of(&self, from: usize, wanted: &Token) -> Option<usize> {
        self.tokens
            .iter()
            .skip(from)
            .position(|t| &t.token == wanted)
            .map(|p| p + from)
    }

    fn skip(&self, mut at: usize, optional: &[Token]) -> usize {
        while self
            .tokens
            .get(at)
            .is_some_and(|t| optional.contains(&t.token))
        {
            at += 1;
        }
        at
    }

    fn skip_words(&self, mut at: usize, optional: &[&str]) -> usize {
        while self
            .tokens
            .get(at)
            .is_some_and(|t| optional.iter().any(|word| is_word(&t.token, word)))
        {
            at += 1;
        }
        at
    }

    /// Read a possibly qualified name (`schema.table`) starting at `at`.
    fn name_at(&self, at: usize) -> Option<String> {
        let mut name = self.tokens.get(at)?.token.name_part()?.to_string();
        let mut i = at + 1;
        while let (Some(dot), Some(part)) = (self.tokens.get(i), self.tokens.get(i + 1)) {
            match (&dot.token, part.token.name_part()) {
                (Token::Dot, Some(part)) => {
                    name.push('.');
                    name.push_str(part);
                    i += 2;
                }
                _ => break,
            }
        }
        Some(name)
    }

    fn text_of(&self, tok: &SpannedToken) -> &str {
        self.sql.get(tok.span.start..tok.span.end).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractErrorKind;

    fn labels(sql: &str) -> (&'static str, String) {
        let label = extract(sql).unwrap();
        (label.method.as_str(), label.table)
    }

    #[test]
    fn test_select() {
        assert_eq!(
            labels("SELECT id, username FROM users WHERE id = 5"),
            ("SELECT", "users".to_string())
        );
    }

    #[test]
    fn test_select_postgres_quoting() {
        assert_eq!(
            labels(r#"SELECT "id", "username" FROM "users" WHERE "id" = $1"#),
            ("SELECT", "users".to_string())
        );
    }

    #[test]
    fn test_select_qualified_table() {
        assert_eq!(
            labels("select * from public.accounts a join users u on u.id = a.user_id"),
            ("SELECT", "public.accounts".to_string())
        );
    }

    #[test]
    fn test_select_without_from() {
        assert_eq!(labels("SELECT 1"), ("SELECT", String::new()));
    }

    #[test]
    fn test_select_function_with_from_keyword() {
        assert_eq!(
            labels("SELECT EXTRACT(YEAR FROM created_at) FROM orders"),
            ("SELECT", "orders".to_string())
        );
    }

    #[test]
    fn test_select_from_derived_table() {
        assert_eq!(
            labels("SELECT c FROM (SELECT count(*) AS c FROM sessions) t"),
            ("SELECT", "sessions".to_string())
        );
    }

    #[test]
    fn test_parenthesised_select() {
        assert_eq!(
            labels("(SELECT id FROM a) UNION (SELECT id FROM b)"),
            ("SELECT", "a".to_string())
        );
    }

    #[test]
    fn test_insert() {
        assert_eq!(
            labels("INSERT INTO `orders` (`id`) VALUES (?)"),
            ("INSERT", "orders".to_string())
        );
    }

    #[test]
    fn test_replace() {
        assert_eq!(
            labels("REPLACE INTO kv (k, v) VALUES ('a', 'b')"),
            ("REPLACE", "kv".to_string())
        );
    }

    #[test]
    fn test_update() {
        assert_eq!(
            labels("UPDATE ONLY users SET name = 'x' WHERE id = 1"),
            ("UPDATE", "users".to_string())
        );
    }

    #[test]
    fn test_delete() {
        assert_eq!(
            labels("DELETE FROM [dbo].[sessions] WHERE expired"),
            ("DELETE", "dbo.sessions".to_string())
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(
            labels("TRUNCATE TABLE audit_log"),
            ("TRUNCATE", "audit_log".to_string())
        );
    }

    #[test]
    fn test_with_clause_uses_following_statement() {
        assert_eq!(
            labels(
                "WITH recent AS (SELECT * FROM events WHERE ts > now()) \
                 DELETE FROM archive WHERE id IN (SELECT id FROM recent)"
            ),
            ("DELETE", "archive".to_string())
        );
    }

    #[test]
    fn test_empty() {
        let err = extract("  -- only a comment\n").unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::Empty);
    }

    #[test]
    fn test_create() {
        assert_eq!(
            labels("CREATE TABLE IF NOT EXISTS app.users (id int)"),
            ("CREATE", "app.users".to_string())
        );
        assert_eq!(
            labels("create or replace temporary view recent as select 1"),
            ("CREATE", "recent".to_string())
        );
        assert_eq!(labels("CREATE USER bob"), ("CREATE", String::new()));
    }

    #[test]
    fn test_create_index_labels_indexed_table() {
        assert_eq!(
            labels("CREATE UNIQUE INDEX CONCURRENTLY idx_email ON users (email)"),
            ("CREATE", "users".to_string())
        );
        assert_eq!(
            labels("CREATE INDEX ON orders (placed_at)"),
            ("CREATE", "orders".to_string())
        );
    }

    #[test]
    fn test_alter_and_drop() {
        assert_eq!(
            labels("ALTER TABLE ONLY users ADD COLUMN age int"),
            ("ALTER", "users".to_string())
        );
        assert_eq!(
            labels("DROP TABLE IF EXISTS sessions, tokens"),
            ("DROP", "sessions".to_string())
        );
    }

    #[test]
    fn test_show() {
        assert_eq!(labels("SHOW TABLES"), ("SHOW", String::new()));
        assert_eq!(
            labels("SHOW COLUMNS FROM `orders`"),
            ("SHOW", "orders".to_string())
        );
        assert_eq!(
            labels("SHOW CREATE TABLE orders"),
            ("SHOW", "orders".to_string())
        );
    }

    #[test]
    fn test_session_statements_have_no_table() {
        assert_eq!(labels("SET search_path TO app"), ("SET", String::new()));
        assert_eq!(labels("BEGIN"), ("BEGIN", String::new()));
        assert_eq!(labels("commit;"), ("COMMIT", String::new()));
        assert_eq!(labels("ROLLBACK"), ("ROLLBACK", String::new()));
    }

    #[test]
    fn test_explain_labels_explained_table() {
        assert_eq!(
            labels("EXPLAIN SELECT * FROM users WHERE id = 1"),
            ("EXPLAIN", "users".to_string())
        );
        assert_eq!(
            labels("EXPLAIN (ANALYZE, BUFFERS) DELETE FROM sessions"),
            ("EXPLAIN", "sessions".to_string())
        );
        assert_eq!(
            labels("EXPLAIN QUERY PLAN WITH t AS (SELECT 1) INSERT INTO log SELECT * FROM t"),
            ("EXPLAIN", "log".to_string())
        );
    }

    #[test]
    fn test_describe() {
        assert_eq!(labels("DESCRIBE users"), ("DESCRIBE", "users".to_string()));
        assert_eq!(labels("desc orders"), ("DESCRIBE", "orders".to_string()));
    }

    #[test]
    fn test_unicode_identifiers() {
        assert_eq!(
            labels("SELECT * FROM café WHERE naïve = 1"),
            ("SELECT", "café".to_string())
        );
        assert_eq!(
            labels("INSERT INTO données (clé) VALUES (1)"),
            ("INSERT", "données".to_string())
        );
    }

    #[test]
    fn test_unsupported() {
        let err = extract("hello world").unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::UnsupportedStatement);
        assert_eq!(err.span, Span::new(0, 5));
        assert!(err.message.contains("'hello'"));

        let err = extract("42").unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::UnsupportedStatement);
    }

    #[test]
    fn test_unsupported_reports_source_text() {
        let err = extract("from users").unwrap_err();
        assert_eq!(err.message, "unsupported statement 'from'");
    }

    #[test]
    fn test_missing_table() {
        let err = extract("INSERT VALUES (1)").unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::MissingTable);
        assert_eq!(err.hint.as_deref(), Some("expected INTO <table>"));

        let err = extract("UPDATE SET x = 1").unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::MissingTable);
    }

    #[test]
    fn test_idempotent() {
        let sql = "SELECT id FROM users";
        assert_eq!(extract(sql).unwrap(), extract(sql).unwrap());
    }
}
