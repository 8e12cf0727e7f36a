//! Declaration type parsing.
//!
//! Turns token sequences like `static unsigned long *names[4]` into type
//! graph nodes plus the declared identifier. Split the same way the
//! grammar splits: the front covers storage classes and the basic type
//! (including struct/union/enum bodies and typedef names), the identifier
//! part covers `*` derivations and the name, and the back covers array
//! suffixes.

use crate::error::{ErrorKind, Result};
use crate::interp::Interpreter;
use crate::lexer::cursor::Cursor;
use crate::lexer::token::Token;
use crate::memory::scalar::Scalar;
use crate::symbols::StrId;
use crate::types::{BaseKind, TypeId};

impl Interpreter {
    /// Parses a full type plus optional declared name. Fails if no type is
    /// present.
    pub(crate) fn type_parse(&mut self, c: &mut Cursor) -> Result<(TypeId, Option<StrId>, bool)> {
        match self.type_parse_front(c)? {
            Some((basic, is_static)) => {
                let (typ, ident) = self.type_parse_ident_part(c, basic)?;
                Ok((typ, ident, is_static))
            }
            None => Err(c.fail(ErrorKind::Syntax, "type expected")),
        }
    }

    /// Storage classes and the basic type name. Returns `None` (with the
    /// cursor rewound) when the next tokens do not start a type.
    pub(crate) fn type_parse_front(
        &mut self,
        c: &mut Cursor,
    ) -> Result<Option<(TypeId, bool)>> {
        let saved = c.clone();
        let mut is_static = false;
        let mut spanned = self.get_token(c)?;
        while matches!(
            spanned.token,
            Token::StaticKw | Token::AutoKw | Token::RegisterKw | Token::ExternKw
        ) {
            if spanned.token == Token::StaticKw {
                is_static = true;
            }
            spanned = self.get_token(c)?;
        }
        let typ = match spanned.token {
            Token::IntKw => self.types.int_t,
            Token::ShortKw => self.types.short_t,
            Token::CharKw => self.types.char_t,
            Token::LongKw => self.types.long_t,
            Token::FloatKw | Token::DoubleKw => self.types.fp_t,
            Token::VoidKw => self.types.void_t,
            Token::SignedKw | Token::UnsignedKw => {
                let unsigned = spanned.token == Token::UnsignedKw;
                match self.peek_token(c)?.token {
                    Token::IntKw => {
                        self.get_token(c)?;
                        if unsigned {
                            self.types.unsigned_int_t
                        } else {
                            self.types.int_t
                        }
                    }
                    Token::ShortKw => {
                        self.get_token(c)?;
                        if unsigned {
                            self.types.unsigned_short_t
                        } else {
                            self.types.short_t
                        }
                    }
                    Token::LongKw => {
                        self.get_token(c)?;
                        if unsigned {
                            self.types.unsigned_long_t
                        } else {
                            self.types.long_t
                        }
                    }
                    Token::CharKw => {
                        self.get_token(c)?;
                        self.types.char_t
                    }
                    _ => {
                        if unsigned {
                            self.types.unsigned_int_t
                        } else {
                            self.types.int_t
                        }
                    }
                }
            }
            Token::StructKw => self.parse_composite(c, false)?,
            Token::UnionKw => self.parse_composite(c, true)?,
            Token::EnumKw => self.parse_enum(c)?,
            Token::Ident(name) => {
                // a typedef name acts as a basic type
                match self.lookup(name) {
                    Some(slot) if self.types.node(slot.value.typ).base == BaseKind::Type => {
                        let value = slot.value;
                        self.type_payload(c, &value)?
                    }
                    _ => {
                        *c = saved;
                        return Ok(None);
                    }
                }
            }
            _ => {
                *c = saved;
                return Ok(None);
            }
        };
        Ok(Some((typ, is_static)))
    }

    /// `*` derivations and the declared name, then array suffixes.
    pub(crate) fn type_parse_ident_part(
        &mut self,
        c: &mut Cursor,
        basic: TypeId,
    ) -> Result<(TypeId, Option<StrId>)> {
        let mut typ = basic;
        loop {
            match self.peek_token(c)?.token {
                Token::Star => {
                    self.get_token(c)?;
                    typ = self.types.pointer_to(typ);
                }
                Token::Ident(name) => {
                    self.get_token(c)?;
                    let typ = self.type_parse_back(c, typ)?;
                    return Ok((typ, Some(name)));
                }
                _ => return Ok((typ, None)),
            }
        }
    }

    /// Array suffixes after a declared name. `int a[2][3]` is an array of
    /// two arrays of three ints.
    pub(crate) fn type_parse_back(&mut self, c: &mut Cursor, from: TypeId) -> Result<TypeId> {
        if self.peek_token(c)?.token != Token::LeftSquare {
            return Ok(from);
        }
        self.get_token(c)?;
        let len = if self.peek_token(c)?.token == Token::RightSquare {
            0
        } else {
            let n = self.expression_parse_int(c)?;
            if n < 0 {
                return Err(c.fail(ErrorKind::Semantic, "array size must not be negative"));
            }
            n as usize
        };
        self.expect_token(c, Token::RightSquare)?;
        let element = self.type_parse_back(c, from)?;
        Ok(self.types.array_of(element, len))
    }

    /// `struct`/`union` after the keyword: a name, an optional body, or an
    /// anonymous body.
    fn parse_composite(&mut self, c: &mut Cursor, is_union: bool) -> Result<TypeId> {
        let kind = if is_union {
            BaseKind::Union
        } else {
            BaseKind::Struct
        };
        let name = match self.peek_token(c)?.token {
            Token::Ident(name) => {
                self.get_token(c)?;
                name
            }
            Token::LeftBrace => self.make_temp_name(if is_union { 'u' } else { 's' }),
            other => {
                return Err(c.fail(
                    ErrorKind::Syntax,
                    format!("expected identifier or '{{', found {}", other),
                ))
            }
        };
        let void_t = self.types.void_t;
        let typ = self.types.derive(void_t, kind, 0, Some(name));
        if self.peek_token(c)?.token != Token::LeftBrace {
            return Ok(typ);
        }
        if self.types.node(typ).sealed {
            return Err(c.fail(
                ErrorKind::Semantic,
                format!("'{}' is already defined", self.interner.resolve(name)),
            ));
        }
        self.get_token(c)?;
        loop {
            let (member_basic, _) = match self.type_parse_front(c)? {
                Some(front) => front,
                None => return Err(c.fail(ErrorKind::Syntax, "member type expected")),
            };
            loop {
                let (member_type, member_name) = self.type_parse_ident_part(c, member_basic)?;
                let member_name = member_name
                    .ok_or_else(|| c.fail(ErrorKind::Syntax, "member name expected"))?;
                self.types
                    .add_member(typ, member_name, member_type)
                    .map_err(|msg| c.fail(ErrorKind::Semantic, msg))?;
                if self.peek_token(c)?.token != Token::Comma {
                    break;
                }
                self.get_token(c)?;
            }
            self.expect_token(c, Token::Semicolon)?;
            if self.peek_token(c)?.token == Token::RightBrace {
                self.get_token(c)?;
                break;
            }
        }
        self.types.seal_composite(typ);
        Ok(typ)
    }

    /// `enum` after the keyword. Enumerators become non-writable int
    /// constants in the global scope.
    fn parse_enum(&mut self, c: &mut Cursor) -> Result<TypeId> {
        let name = match self.peek_token(c)?.token {
            Token::Ident(name) => {
                self.get_token(c)?;
                name
            }
            Token::LeftBrace => self.make_temp_name('e'),
            other => {
                return Err(c.fail(
                    ErrorKind::Syntax,
                    format!("expected identifier or '{{', found {}", other),
                ))
            }
        };
        let int_t = self.types.int_t;
        let typ = self.types.derive(int_t, BaseKind::Enum, 0, Some(name));
        if self.peek_token(c)?.token != Token::LeftBrace {
            return Ok(typ);
        }
        self.get_token(c)?;
        let mut next_value: i64 = 0;
        loop {
            let entry = self.expect_ident(c)?;
            if self.peek_token(c)?.token == Token::Assign {
                self.get_token(c)?;
                next_value = self.expression_parse_int(c)?;
            }
            let constant = self.variable_define(c, entry, int_t, false, None)?;
            Scalar::store_int(&mut self.arena, BaseKind::Int, constant.addr, next_value)
                .map_err(|e| self.mem_fail(c, e))?;
            next_value += 1;
            match self.get_token(c)?.token {
                Token::Comma => {
                    if self.peek_token(c)?.token == Token::RightBrace {
                        self.get_token(c)?;
                        break;
                    }
                }
                Token::RightBrace => break,
                other => {
                    return Err(c.fail(
                        ErrorKind::Syntax,
                        format!("expected ',' or '}}', found {}", other),
                    ))
                }
            }
        }
        Ok(typ)
    }

    /// Reads the type handle stored in a type-kind value payload.
    pub(crate) fn type_payload(&self, c: &Cursor, v: &crate::memory::value::Value) -> Result<TypeId> {
        let bytes = self
            .arena
            .bytes(v.addr, 4)
            .map_err(|e| self.mem_fail(c, e))?;
        let raw = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Ok(TypeId::from_raw(raw))
    }

    /// Stores a type handle into a type-kind value payload.
    pub(crate) fn store_type_payload(
        &mut self,
        c: &Cursor,
        v: &crate::memory::value::Value,
        typ: TypeId,
    ) -> Result<()> {
        self.arena
            .write_bytes(v.addr, &typ.to_raw().to_le_bytes())
            .map_err(|e| self.mem_fail(c, e))
    }
}
