//! SQL lexer using logos.
//!
//! Only the tokens needed to classify a statement get their own variant;
//! everything else collapses into identifiers, literals and punctuation.

use crate::error::ExtractError;
use crate::span::Span;
use logos::Logos;

/// Token types for SQL text.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"--[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    // Statement verbs
    #[token("select", ignore(ascii_case))]
    Select,
    #[token("insert", ignore(ascii_case))]
    Insert,
    #[token("update", ignore(ascii_case))]
    Update,
    #[token("delete", ignore(ascii_case))]
    Delete,
    #[token("replace", ignore(ascii_case))]
    Replace,
    #[token("truncate", ignore(ascii_case))]
    Truncate,
    #[token("with", ignore(ascii_case))]
    With,

    // Clause keywords that precede a table name
    #[token("from", ignore(ascii_case))]
    From,
    #[token("into", ignore(ascii_case))]
    Into,
    #[token("only", ignore(ascii_case))]
    Only,
    #[token("table", ignore(ascii_case))]
    Table,
    #[token("set", ignore(ascii_case))]
    Set,

    // Identifier, including non-ASCII letters
    #[regex(r"[\p{XID_Start}_][\p{XID_Continue}$]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Quoted identifiers: "name", `name`, [name]
    #[regex(r#""([^"]|"")*""#, |lex| unquote(lex.slice(), '"'))]
    #[regex(r"`([^`]|``)*`", |lex| unquote(lex.slice(), '`'))]
    #[regex(r"\[[^\]]*\]", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    QuotedIdent(String),

    // String literal (single-quoted, '' escapes a quote)
    #[regex(r"'([^']|'')*'", |lex| unquote(lex.slice(), '\''))]
    String(String),

    // Numeric literal
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    Number(String),

    // Bind parameters: $1, ?, :name
    #[regex(r"\$[0-9]+")]
    #[regex(r":[a-zA-Z_][a-zA-Z0-9_]*")]
    #[token("?")]
    Param,

    // Punctuation
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("-")]
    Minus,
    #[token("/")]
    Slash,

    // Any other operator run (=, <>, >=, ||, *, ...)
    #[regex(r"[=<>!+%|&^~*@#]+")]
    Operator,
}

impl Token {
    /// Whether this token can start or continue a (possibly qualified) name.
    pub fn name_part(&self) -> Option<&str> {
        match self {
            Token::Ident(s) | Token::QuotedIdent(s) => Some(s),
            _ => None,
        }
    }
}

/// Strip the surrounding quote characters and collapse doubled quotes.
fn unquote(s: &str, quote: char) -> String {
    let inner = &s[1..s.len() - 1];
    let doubled: String = [quote, quote].iter().collect();
    inner.replace(&doubled, &quote.to_string())
}

/// A token with its span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Lexer that produces spanned tokens.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
        }
    }

    /// Get the next token, failing on input the lexer does not recognise.
    pub fn next_token(&mut self) -> Option<Result<SpannedToken, ExtractError>> {
        match self.inner.next()? {
            Ok(token) => Some(Ok(SpannedToken {
                token,
                span: self.inner.span().into(),
            })),
            Err(()) => Some(Err(ExtractError::invalid_token(
                self.inner.slice(),
                self.inner.span().into(),
            ))),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<SpannedToken, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Tokenize a source string into a vector of spanned tokens.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, ExtractError> {
    Lexer::new(source).collect()
}
