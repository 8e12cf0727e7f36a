//! The top-level driver.
//!
//! Runs a source text as a sequence of top-level items: struct/union/enum
//! definitions, variable declarations with optional initializers,
//! typedefs, `#define`s, and expression statements. Each item executes
//! inside its own arena frame so expression temporaries never outlive the
//! item that made them; long-lived storage (globals, macro payloads,
//! string literals) goes to the heap side and survives the frame pop.

use std::rc::Rc;

use tracing::warn;

use crate::error::{ErrorKind, Result};
use crate::interp::{Interpreter, MacroDef};
use crate::lexer::cursor::{Cursor, RunMode};
use crate::lexer::scan::tokenize;
use crate::lexer::token::Token;
use crate::memory::scalar::Scalar;
use crate::memory::value::Value;
use crate::symbols::DeclSite;
use crate::types::{BaseKind, TypeId};

impl Interpreter {
    /// Runs a source text and returns the last expression statement's
    /// scalar result, if any.
    pub fn run(&mut self, source: &str, file: &str) -> Result<Option<Scalar>> {
        let buffer = tokenize(source, file, &mut self.interner)?;
        let mut c = Cursor::new(Rc::new(buffer));
        let mut last = None;
        loop {
            match self.peek_token(&c)?.token {
                Token::Eof | Token::EndOfFunction => break,
                _ => {}
            }
            if let Some(result) = self.top_level_item(&mut c)? {
                last = Some(result);
            }
        }
        Ok(last)
    }

    /// Evaluates a single expression and returns its scalar result.
    pub fn evaluate_expression(&mut self, source: &str, file: &str) -> Result<Option<Scalar>> {
        let buffer = tokenize(source, file, &mut self.interner)?;
        let mut c = Cursor::new(Rc::new(buffer));
        self.arena.push_frame();
        let result = (|this: &mut Self| {
            let value = this
                .expression_parse(&mut c)?
                .ok_or_else(|| c.fail(ErrorKind::Syntax, "expression expected"))?;
            this.scalar_result(&c, &value)
        })(self);
        let popped = self.arena.pop_frame();
        let value = result?;
        popped.map_err(|e| self.mem_fail(&c, e))?;
        Ok(value)
    }

    /// Evaluates an expression and coerces the result to an integer.
    pub fn evaluate_integer_expression(&mut self, source: &str, file: &str) -> Result<i64> {
        match self.evaluate_expression(source, file)? {
            Some(scalar) => Ok(scalar.as_int()),
            None => Err(crate::error::EvalError::bare(
                ErrorKind::Semantic,
                "integer value expected",
            )),
        }
    }

    /// One top-level item, wrapped in an arena frame. Expression
    /// statements yield their scalar result.
    fn top_level_item(&mut self, c: &mut Cursor) -> Result<Option<Scalar>> {
        self.arena.push_frame();
        let result = self.item_inner(c);
        let popped = self.arena.pop_frame();
        let value = result?;
        popped.map_err(|e| self.mem_fail(c, e))?;
        Ok(value)
    }

    fn item_inner(&mut self, c: &mut Cursor) -> Result<Option<Scalar>> {
        match self.peek_token(c)?.token {
            Token::Semicolon => {
                self.get_token(c)?;
                Ok(None)
            }
            Token::HashDefine => {
                self.get_token(c)?;
                self.parse_macro_definition(c)?;
                Ok(None)
            }
            Token::HashInclude => {
                self.get_token(c)?;
                warn!(file = c.file(), line = c.pos.line, "ignoring #include");
                c.to_end_of_line();
                Ok(None)
            }
            Token::TypedefKw => {
                self.get_token(c)?;
                self.parse_typedef(c)?;
                Ok(None)
            }
            _ => match self.type_parse_front(c)? {
                Some((basic, is_static)) => {
                    self.parse_declaration(c, basic, is_static)?;
                    Ok(None)
                }
                None => {
                    let value = self
                        .expression_parse(c)?
                        .ok_or_else(|| c.fail(ErrorKind::Syntax, "statement expected"))?;
                    let result = self.scalar_result(c, &value)?;
                    match self.peek_token(c)?.token {
                        Token::Semicolon => {
                            self.get_token(c)?;
                        }
                        Token::Eof | Token::EndOfFunction => {}
                        other => {
                            return Err(c.fail(
                                ErrorKind::Syntax,
                                format!("expected ';', found {}", other),
                            ))
                        }
                    }
                    Ok(result)
                }
            },
        }
    }

    /// `type name [= expr] [, name ...] ;` after the basic type has been
    /// parsed. A bare `struct foo { ... };` declares only the type.
    fn parse_declaration(
        &mut self,
        c: &mut Cursor,
        basic: TypeId,
        is_static: bool,
    ) -> Result<()> {
        loop {
            let site_pos = self.peek_token(c)?.pos;
            let (typ, ident) = self.type_parse_ident_part(c, basic)?;
            let name = match ident {
                Some(name) => name,
                None => {
                    self.expect_token(c, Token::Semicolon)?;
                    return Ok(());
                }
            };
            let file = self.interner.intern(c.file());
            let decl = DeclSite {
                file,
                pos: site_pos,
            };
            let value = self.variable_define_but_ignore_identical(c, name, typ, is_static, decl)?;
            if self.peek_token(c)?.token == Token::Assign {
                self.get_token(c)?;
                let init = self
                    .expression_parse(c)?
                    .ok_or_else(|| c.fail(ErrorKind::Syntax, "expression expected"))?;
                if c.mode == RunMode::Run {
                    self.expression_assign(c, &value, &init, true, false, None)?;
                }
            }
            match self.get_token(c)?.token {
                Token::Comma => continue,
                Token::Semicolon => return Ok(()),
                other => {
                    return Err(c.fail(
                        ErrorKind::Syntax,
                        format!("expected ',' or ';', found {}", other),
                    ))
                }
            }
        }
    }

    /// `typedef <type> <name>;` binds the name to a type-kind value.
    fn parse_typedef(&mut self, c: &mut Cursor) -> Result<()> {
        let (typ, name, _) = self.type_parse(c)?;
        let name = name.ok_or_else(|| c.fail(ErrorKind::Syntax, "identifier expected"))?;
        let type_t = self.types.type_t;
        let value = self.variable_define(c, name, type_t, false, None)?;
        self.store_type_payload(c, &value, typ)?;
        self.expect_token(c, Token::Semicolon)?;
        Ok(())
    }

    /// `#define name body` or `#define name(params) body`. The body is
    /// the captured token range up to the end of the line.
    fn parse_macro_definition(&mut self, c: &mut Cursor) -> Result<()> {
        let name = self.expect_ident(c)?;
        let mut params = Vec::new();
        // a '(' directly after the name introduces parameters; with a
        // space in between it would be part of the body
        if c.peek_stored().token == Token::OpenMacroBracket {
            c.next_raw();
            if c.peek_stored().token == Token::CloseBracket {
                c.next_raw();
            } else {
                loop {
                    params.push(self.expect_ident(c)?);
                    match self.get_token(c)?.token {
                        Token::Comma => continue,
                        Token::CloseBracket => break,
                        other => {
                            return Err(c.fail(
                                ErrorKind::Syntax,
                                format!("expected ',' or ')', found {}", other),
                            ))
                        }
                    }
                }
            }
        }
        let start = c.index;
        c.to_end_of_line();
        let body = c.slice(start, c.index);
        self.define_macro(c, name, MacroDef { params, body })
    }

    /// Reads a value's payload as a scalar; non-scalar results (whole
    /// structs, arrays) have no scalar rendering.
    fn scalar_result(&self, c: &Cursor, v: &Value) -> Result<Option<Scalar>> {
        let base = self.types.node(v.typ).base;
        if self.types.is_numeric_coercible(v.typ) || base == BaseKind::Pointer {
            let scalar =
                Scalar::load(&self.arena, base, v.addr).map_err(|e| self.mem_fail(c, e))?;
            Ok(Some(scalar))
        } else {
            Ok(None)
        }
    }
}
