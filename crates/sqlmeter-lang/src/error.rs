//! Error type for statement classification.

use crate::extract::Method;
use crate::span::{offset_to_line_col, Span};
use thiserror::Error;

/// Kinds of extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractErrorKind {
    /// The text holds no tokens at all.
    Empty,
    /// The lexer hit a character sequence it does not understand.
    InvalidToken,
    /// The statement verb is not one that is classified.
    UnsupportedStatement,
    /// The statement verb was recognised but no table name follows it.
    MissingTable,
}

/// Failure to derive `(method, table)` from SQL text.
#[derive(Debug, Clone, Error)]
pub struct ExtractError {
    /// The error message.
    pub message: String,
    /// Source span where the error occurred.
    pub span: Span,
    /// Error kind for programmatic handling.
    pub kind: ExtractErrorKind,
    /// Optional hint for fixing the error.
    pub hint: Option<String>,
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ExtractError {
    /// Create a new extraction error.
    pub fn new(message: impl Into<String>, span: Span, kind: ExtractErrorKind) -> Self {
        Self {
            message: message.into(),
            span,
            kind,
            hint: None,
        }
    }

    /// Add a hint to the error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub(crate) fn empty(span: Span) -> Self {
        Self::new("empty SQL statement", span, ExtractErrorKind::Empty)
    }

    pub(crate) fn invalid_token(text: &str, span: Span) -> Self {
        Self::new(
            format!("unexpected character sequence '{}'", text),
            span,
            ExtractErrorKind::InvalidToken,
        )
    }

    pub(crate) fn unsupported(found: &str, span: Span) -> Self {
        let verbs: Vec<&str> = Method::ALL.iter().map(Method::as_str).collect();
        Self::new(
            format!("unsupported statement '{}'", found),
            span,
            ExtractErrorKind::UnsupportedStatement,
        )
        .with_hint(format!("supported statements: WITH, {}", verbs.join(", ")))
    }

    pub(crate) fn missing_table(method: &str, span: Span) -> Self {
        Self::new(
            format!("no table name found in {} statement", method),
            span,
            ExtractErrorKind::MissingTable,
        )
    }

    /// Format the error with source context.
    pub fn format_with_source(&self, source: &str) -> String {
        let (line, col) = offset_to_line_col(source, self.span.start);
        let mut result = format!("error[{:?}]: {}\n", self.kind, self.message);
        result.push_str(&format!("  --> line {}:{}\n", line, col));

        if let Some(source_line) = source.lines().nth(line - 1) {
            result.push_str(&format!("   |\n{:3}| {}\n   |", line, source_line));

            for _ in 0..col {
                result.push(' ');
            }
            result.push('^');

            let span_len = self.span.len();
            if span_len > 1 {
                let room = source_line.len().saturating_sub(col) + 1;
                for _ in 1..span_len.min(room) {
                    result.push('~');
                }
            }
            result.push('\n');
        }

        if let Some(hint) = &self.hint {
            result.push_str(&format!("   = hint: {}\n", hint));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting() {
        let source = "MERGE INTO users USING staged";
        let err = ExtractError::unsupported("MERGE", Span::new(0, 5));

        let formatted = err.format_with_source(source);
        assert!(formatted.contains("line 1:1"));
        assert!(formatted.contains("unsupported statement 'MERGE'"));
        assert!(formatted.contains("hint: supported statements"));
        assert!(formatted.contains("^~~~~"));
    }

    #[test]
    fn test_unsupported_hint_lists_every_verb() {
        let err = ExtractError::unsupported("MERGE", Span::new(0, 5));
        let hint = err.hint.unwrap();
        assert!(hint.contains("WITH"));
        for method in Method::ALL {
            assert!(hint.contains(method.as_str()), "{}", hint);
        }
    }

    #[test]
    fn test_error_display_is_message() {
        let err = ExtractError::missing_table("INSERT", Span::new(0, 6));
        assert_eq!(err.to_string(), "no table name found in INSERT statement");
        assert_eq!(err.kind, ExtractErrorKind::MissingTable);
    }
}
