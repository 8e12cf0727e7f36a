//! The parse cursor: a position in a shared token buffer.
//!
//! Cursors are cheap to clone; saving a copy and assigning it back is the
//! rewind mechanism used everywhere an expression or declaration may need
//! to back out. A cursor also carries the run/skip mode (skip parses
//! without executing) and the `#if` nesting state used by preprocessed
//! token fetches.

use std::rc::Rc;

use crate::error::{ErrorKind, EvalError, Position};
use crate::lexer::token::{Spanned, Token, TokenBuffer};

/// Whether fetched code is executed or only parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Run,
    Skip,
}

#[derive(Debug, Clone)]
pub struct Cursor {
    pub tokens: Rc<TokenBuffer>,
    pub index: usize,
    /// Tokens at or past this index read as end-of-function; used to
    /// bound macro bodies inside a larger buffer.
    pub limit: Option<usize>,
    pub mode: RunMode,
    /// Current `#if`/`#ifdef` nesting depth.
    pub hash_if_level: u32,
    /// Depth up to which conditions evaluated true; tokens are skipped
    /// while this is below `hash_if_level`.
    pub hash_if_evaluate_to_level: u32,
    /// Position of the most recently fetched token, for diagnostics.
    pub pos: Position,
}

impl Cursor {
    pub fn new(tokens: Rc<TokenBuffer>) -> Self {
        Cursor {
            tokens,
            index: 0,
            limit: None,
            mode: RunMode::Run,
            hash_if_level: 0,
            hash_if_evaluate_to_level: 0,
            pos: Position::new(1, 1),
        }
    }

    /// A cursor over a sub-range of the same buffer, as used for macro
    /// bodies. Reads past `end` produce the end-of-function sentinel.
    pub fn slice(&self, start: usize, end: usize) -> Cursor {
        Cursor {
            tokens: Rc::clone(&self.tokens),
            index: start,
            limit: Some(end),
            mode: self.mode,
            hash_if_level: 0,
            hash_if_evaluate_to_level: 0,
            pos: self.tokens.get(start).pos,
        }
    }

    pub fn file(&self) -> &str {
        &self.tokens.file
    }

    pub fn fail(&self, kind: ErrorKind, message: impl Into<String>) -> EvalError {
        EvalError::new(kind, message, self.file(), self.pos)
    }

    /// The token at the cursor without any skipping, as stored.
    pub fn peek_stored(&self) -> Spanned {
        if let Some(limit) = self.limit {
            if self.index >= limit {
                return Spanned {
                    token: Token::EndOfFunction,
                    pos: self.pos,
                };
            }
        }
        self.tokens.get(self.index)
    }

    /// Fetches the next token, transparently stepping over end-of-line
    /// markers. Preprocessor directives are NOT interpreted here; use the
    /// interpreter's token fetch for that.
    pub fn next_raw(&mut self) -> Spanned {
        loop {
            let spanned = self.peek_stored();
            match spanned.token {
                Token::EndOfLine => self.index += 1,
                Token::Eof | Token::EndOfFunction => {
                    self.pos = spanned.pos;
                    return spanned;
                }
                _ => {
                    self.index += 1;
                    self.pos = spanned.pos;
                    return spanned;
                }
            }
        }
    }

    /// Advances to (but not past) the next stored end-of-line or
    /// end-of-input token. Used to delimit `#define` bodies.
    pub fn to_end_of_line(&mut self) {
        loop {
            match self.peek_stored().token {
                Token::EndOfLine | Token::Eof | Token::EndOfFunction => return,
                _ => self.index += 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::scan::tokenize;
    use crate::symbols::Interner;
    use pretty_assertions::assert_eq;

    fn cursor_for(src: &str) -> Cursor {
        let mut interner = Interner::new();
        let buf = tokenize(src, "test.c", &mut interner).unwrap();
        Cursor::new(Rc::new(buf))
    }

    #[test]
    fn raw_fetch_steps_over_newlines() {
        let mut c = cursor_for("1\n\n2");
        assert_eq!(c.next_raw().token, Token::CharLit(1));
        assert_eq!(c.next_raw().token, Token::CharLit(2));
        assert_eq!(c.next_raw().token, Token::Eof);
    }

    #[test]
    fn clone_rewinds() {
        let mut c = cursor_for("1 2 3");
        let saved = c.clone();
        c.next_raw();
        c.next_raw();
        c = saved;
        assert_eq!(c.next_raw().token, Token::CharLit(1));
    }

    #[test]
    fn slice_ends_with_end_of_function() {
        let mut c = cursor_for("1 2 3");
        let mut body = c.slice(0, 2);
        assert_eq!(body.next_raw().token, Token::CharLit(1));
        assert_eq!(body.next_raw().token, Token::CharLit(2));
        assert_eq!(body.next_raw().token, Token::EndOfFunction);
        assert_eq!(c.next_raw().token, Token::CharLit(1));
    }

    #[test]
    fn to_end_of_line_stops_at_the_marker() {
        let mut c = cursor_for("1 2\n3");
        c.next_raw();
        c.to_end_of_line();
        assert_eq!(c.peek_stored().token, Token::EndOfLine);
    }
}
