//! Preprocessed token fetch.
//!
//! The cursor's raw fetch knows nothing about `#if`; this layer interprets
//! the conditional directives and silently drops tokens inside false
//! branches. The cursor tracks two depths: the current nesting level and
//! the level up to which conditions evaluated true. Tokens pass through
//! only while the two are equal.

use crate::error::{ErrorKind, Result};
use crate::interp::Interpreter;
use crate::lexer::cursor::Cursor;
use crate::lexer::token::{Spanned, Token};
use crate::symbols::StrId;
use crate::types::BaseKind;

impl Interpreter {
    /// Fetches the next token with preprocessor filtering applied.
    pub(crate) fn get_token(&self, c: &mut Cursor) -> Result<Spanned> {
        loop {
            let spanned = c.next_raw();
            match spanned.token {
                Token::HashIfdef => self.hash_ifdef(c, false)?,
                Token::HashIfndef => self.hash_ifdef(c, true)?,
                Token::HashIf => self.hash_if(c)?,
                Token::HashElse => self.hash_else(c)?,
                Token::HashEndif => self.hash_endif(c)?,
                token => {
                    if c.hash_if_evaluate_to_level < c.hash_if_level && token != Token::Eof {
                        continue;
                    }
                    return Ok(spanned);
                }
            }
        }
    }

    /// Looks at the next token without consuming it.
    pub(crate) fn peek_token(&self, c: &Cursor) -> Result<Spanned> {
        let mut probe = c.clone();
        self.get_token(&mut probe)
    }

    pub(crate) fn expect_token(&self, c: &mut Cursor, expected: Token) -> Result<Spanned> {
        let spanned = self.get_token(c)?;
        if spanned.token != expected {
            return Err(c.fail(
                ErrorKind::Syntax,
                format!("expected {}, found {}", expected, spanned.token),
            ));
        }
        Ok(spanned)
    }

    pub(crate) fn expect_ident(&self, c: &mut Cursor) -> Result<StrId> {
        match self.get_token(c)?.token {
            Token::Ident(name) => Ok(name),
            other => Err(c.fail(
                ErrorKind::Syntax,
                format!("expected identifier, found {}", other),
            )),
        }
    }

    fn hash_ifdef(&self, c: &mut Cursor, if_not: bool) -> Result<()> {
        let name = match c.next_raw().token {
            Token::Ident(name) => name,
            _ => return Err(c.fail(ErrorKind::Syntax, "identifier expected after #ifdef")),
        };
        let defined = self.globals.contains(name);
        if c.hash_if_evaluate_to_level == c.hash_if_level && defined != if_not {
            c.hash_if_evaluate_to_level += 1;
        }
        c.hash_if_level += 1;
        Ok(())
    }

    /// `#if` takes a numeric constant or the name of a macro whose body
    /// starts with one.
    fn hash_if(&self, c: &mut Cursor) -> Result<()> {
        let spanned = c.next_raw();
        let condition = match spanned.token {
            Token::CharLit(v) => v as i64,
            Token::IntLit(v) => v,
            Token::Ident(name) => {
                let slot = self
                    .globals
                    .get(name)
                    .ok_or_else(|| {
                        c.fail(
                            ErrorKind::Semantic,
                            format!("'{}' is undefined", self.interner.resolve(name)),
                        )
                    })?;
                if self.types.node(slot.value.typ).base != BaseKind::Macro {
                    return Err(c.fail(ErrorKind::Semantic, "value expected after #if"));
                }
                let def = self.macro_def(c, &slot.value)?;
                let mut body = def.body.clone();
                match body.next_raw().token {
                    Token::CharLit(v) => v as i64,
                    Token::IntLit(v) => v,
                    _ => return Err(c.fail(ErrorKind::Semantic, "value expected after #if")),
                }
            }
            _ => return Err(c.fail(ErrorKind::Semantic, "value expected after #if")),
        };
        if c.hash_if_evaluate_to_level == c.hash_if_level && condition != 0 {
            c.hash_if_evaluate_to_level += 1;
        }
        c.hash_if_level += 1;
        Ok(())
    }

    fn hash_else(&self, c: &mut Cursor) -> Result<()> {
        if c.hash_if_evaluate_to_level == c.hash_if_level.wrapping_sub(1) {
            // the #if branch was inactive, activate this one
            c.hash_if_evaluate_to_level += 1;
        } else if c.hash_if_evaluate_to_level == c.hash_if_level {
            if c.hash_if_level == 0 {
                return Err(c.fail(ErrorKind::Syntax, "#else without #if"));
            }
            c.hash_if_evaluate_to_level -= 1;
        }
        Ok(())
    }

    fn hash_endif(&self, c: &mut Cursor) -> Result<()> {
        if c.hash_if_level == 0 {
            return Err(c.fail(ErrorKind::Syntax, "#endif without #if"));
        }
        c.hash_if_level -= 1;
        if c.hash_if_evaluate_to_level > c.hash_if_level {
            c.hash_if_evaluate_to_level = c.hash_if_level;
        }
        Ok(())
    }
}
