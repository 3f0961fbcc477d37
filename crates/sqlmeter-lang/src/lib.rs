//! SQL statement classification for sqlmeter.
//!
//! This crate turns SQL text into the `(type, table)` pair that labels every
//! query metric. It tokenizes with [logos](https://docs.rs/logos) and scans the
//! token stream for the statement verb and the table it targets; it does not
//! build a syntax tree.
//!
//! # Supported statements
//!
//! ```text
//! SELECT ... FROM <table> ...              -> (SELECT, table)
//! SELECT 1                                 -> (SELECT, "")
//! INSERT INTO <table> ...                  -> (INSERT, table)
//! REPLACE INTO <table> ...                 -> (REPLACE, table)
//! UPDATE [ONLY] <table> SET ...            -> (UPDATE, table)
//! DELETE FROM [ONLY] <table> ...           -> (DELETE, table)
//! TRUNCATE [TABLE] [ONLY] <table>          -> (TRUNCATE, table)
//! WITH cte AS (...) <statement>            -> classified by <statement>
//! CREATE|ALTER|DROP <kind> [IF [NOT] EXISTS] <name>
//!                                          -> (verb, name); indexes use ON <table>
//! SHOW ... [FROM <table>]                  -> (SHOW, table or "")
//! EXPLAIN [options] <statement>            -> (EXPLAIN, table of <statement>)
//! DESCRIBE <table>                         -> (DESCRIBE, table)
//! SET, BEGIN, COMMIT, ROLLBACK             -> (verb, "")
//! ```
//!
//! Identifiers may be bare, including non-ASCII letters, or quoted with
//! `"..."`, `` `...` `` or `[...]`; quotes are removed and `schema.table` is
//! kept as written.
//!
//! # Usage
//!
//! ```rust
//! use sqlmeter_lang::{extract, ExtractErrorKind, Method};
//!
//! let label = extract("UPDATE `users` SET `name` = ? WHERE `id` = ?").unwrap();
//! assert_eq!(label.method, Method::Update);
//! assert_eq!(label.table, "users");
//!
//! let err = extract("hello world").unwrap_err();
//! assert_eq!(err.kind, ExtractErrorKind::UnsupportedStatement);
//! ```

pub mod error;
pub mod extract;
pub mod lexer;
pub mod span;

pub use error::{ExtractError, ExtractErrorKind};
pub use extract::{extract, Method, QueryLabel};
pub use lexer::{SpannedToken, Token};
pub use span::Span;

/// Tokenize a source string (for debugging/testing).
///
/// # Example
///
/// ```rust
/// use sqlmeter_lang::tokenize;
///
/// let tokens = tokenize("SELECT id FROM users").unwrap();
/// assert_eq!(tokens.len(), 4);
/// ```
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, ExtractError> {
    lexer::tokenize(source)
}
