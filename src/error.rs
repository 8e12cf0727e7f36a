//! Error types shared across the interpreter.
//!
//! Every failure in the core is fatal to the current evaluation and carries
//! the source position it was raised at. Hosts receive one error type so
//! they can report diagnostics without crashing.

use std::fmt;

/// Line/column position in the source text, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Broad category of a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unterminated literal, illegal character, malformed escape.
    Lexical,
    /// Unbalanced brackets, operator in the wrong position, missing token.
    Syntax,
    /// Type mismatch, non-lvalue assignment, unknown member, zero divisor.
    Semantic,
    /// Arena exhaustion or an imbalanced stack pop.
    Resource,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Lexical => "lexical error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Semantic => "error",
            ErrorKind::Resource => "resource error",
        };
        f.write_str(name)
    }
}

/// A fatal interpreter error. There is no local recovery: evaluation
/// unwinds to the host, which reports the message and discards or resets
/// the interpreter instance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{file}:{pos}: {kind}: {message}")]
pub struct EvalError {
    pub kind: ErrorKind,
    pub message: String,
    pub file: String,
    pub pos: Position,
}

impl EvalError {
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        file: impl Into<String>,
        pos: Position,
    ) -> Self {
        EvalError {
            kind,
            message: message.into(),
            file: file.into(),
            pos,
        }
    }

    /// An error with no useful source position, e.g. arena exhaustion
    /// during host-driven registration.
    pub fn bare(kind: ErrorKind, message: impl Into<String>) -> Self {
        EvalError {
            kind,
            message: message.into(),
            file: String::new(),
            pos: Position::default(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_position() {
        let err = EvalError::new(
            ErrorKind::Syntax,
            "expected ']'",
            "test.c",
            Position::new(3, 14),
        );
        assert_eq!(err.to_string(), "test.c:3:14: syntax error: expected ']'");
    }
}
