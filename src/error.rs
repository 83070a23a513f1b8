//! Error types for the Jack compiler.
//!
//! Merges the lexical/syntax taxonomy the teacher split into a separate
//! `jack-analyzer` crate with the semantic/IO taxonomy of the compiler
//! proper, since this crate has no internal crate boundary to split them
//! across.

use crate::token::{Span, Token};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during Jack compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Unmatched character, unterminated string/comment, or an integer
    /// literal outside `0..=32767`.
    #[error("lexical error at {span}: {message}")]
    Lexical { span: Span, message: String },

    /// An `expect()` mismatch while parsing.
    #[error("syntax error in {context}: expected {expected}, found {found} at {span}")]
    Syntax {
        span: Span,
        expected: String,
        found: String,
        context: String,
    },

    /// Variable used but not declared in either symbol table.
    #[error("undefined variable '{name}' in {context} at {span}")]
    UndefinedVariable {
        name: String,
        span: Span,
        context: String,
    },

    /// A keyword appeared in constant position where it isn't one of
    /// `true | false | null | this`.
    #[error("invalid keyword constant '{found}' in {context} at {span}")]
    InvalidKeywordConstant {
        found: String,
        span: Span,
        context: String,
    },

    /// A token that isn't `int | char | boolean | <identifier>` appeared
    /// where a type was required.
    #[error("invalid type token {found} in {context} at {span}")]
    InvalidType {
        found: String,
        span: Span,
        context: String,
    },

    /// An internal request for a variable kind outside
    /// `static | field | arg | var`. Should be unreachable from correct
    /// engine code, since `SymbolKind` is a closed enum — kept because
    /// spec.md §7 names "invalid variable kind" as a semantic category.
    #[error("invalid variable kind '{found}' in {context} at {span}")]
    InvalidKind {
        found: String,
        span: Span,
        context: String,
    },

    /// Requesting a typed token accessor for the wrong token kind. Should
    /// be unreachable from correct engine code.
    #[error("accessor mismatch: expected {expected_kind} token, found {found} at {span}")]
    AccessorMismatch {
        expected_kind: &'static str,
        found: String,
        span: Span,
    },

    /// File I/O error.
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    pub fn lexical(span: Span, message: impl Into<String>) -> Self {
        Self::Lexical {
            span,
            message: message.into(),
        }
    }

    pub fn syntax(
        span: Span,
        expected: impl Into<String>,
        found: &Token,
        context: impl Into<String>,
    ) -> Self {
        Self::Syntax {
            span,
            expected: expected.into(),
            found: found.to_string(),
            context: context.into(),
        }
    }

    pub fn undefined_variable(
        name: impl Into<String>,
        span: Span,
        context: impl Into<String>,
    ) -> Self {
        Self::UndefinedVariable {
            name: name.into(),
            span,
            context: context.into(),
        }
    }

    pub fn invalid_keyword_constant(
        found: impl Into<String>,
        span: Span,
        context: impl Into<String>,
    ) -> Self {
        Self::InvalidKeywordConstant {
            found: found.into(),
            span,
            context: context.into(),
        }
    }

    pub fn invalid_type(found: &Token, span: Span, context: impl Into<String>) -> Self {
        Self::InvalidType {
            found: found.to_string(),
            span,
            context: context.into(),
        }
    }

    pub fn invalid_kind(found: impl Into<String>, span: Span, context: impl Into<String>) -> Self {
        Self::InvalidKind {
            found: found.into(),
            span,
            context: context.into(),
        }
    }

    pub fn accessor_mismatch(expected_kind: &'static str, found: &Token, span: Span) -> Self {
        Self::AccessorMismatch {
            expected_kind,
            found: found.to_string(),
            span,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The source span this error is anchored to, if any.
    pub fn span(&self) -> Option<&Span> {
        match self {
            Self::Lexical { span, .. }
            | Self::Syntax { span, .. }
            | Self::UndefinedVariable { span, .. }
            | Self::InvalidKeywordConstant { span, .. }
            | Self::InvalidType { span, .. }
            | Self::InvalidKind { span, .. }
            | Self::AccessorMismatch { span, .. } => Some(span),
            Self::Io { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_span() -> Span {
        Span::new(0, 1, 1, 1)
    }

    #[test]
    fn test_error_display() {
        let err = CompileError::undefined_variable("foo", test_span(), "Main.bar");
        assert!(err.to_string().contains("foo"));
        assert!(err.to_string().contains("undefined"));
        assert!(err.to_string().contains("Main.bar"));
    }

    #[test]
    fn test_syntax_error_display() {
        let err = CompileError::syntax(test_span(), "';'", &Token::Symbol('}'), "Main.bar");
        assert!(err.to_string().contains("expected ';'"));
        assert!(err.to_string().contains("Main.bar"));
    }
}
