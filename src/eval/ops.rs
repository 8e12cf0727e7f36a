//! Operator semantics.
//!
//! Everything the collapse loop delegates to: numeric coercion, the
//! assignment family, and the prefix/postfix/infix operator bodies.
//! Operators read their operands as [`Value`] descriptors, compute in
//! word-width arithmetic (wrapping on overflow), and push their result
//! back on the expression stack as a fresh non-lvalue temporary unless
//! the operator is defined to yield its destination.

use crate::error::{ErrorKind, Result};
use crate::eval::stack::ExprStack;
use crate::interp::Interpreter;
use crate::lexer::cursor::{Cursor, RunMode};
use crate::lexer::token::Token;
use crate::memory::arena::Addr;
use crate::memory::scalar::Scalar;
use crate::memory::value::{Storage, Value};
use crate::symbols::StrId;
use crate::types::{BaseKind, TypeId};

/// Where an assignment came from, for diagnostics: `None` for a plain
/// `=`, or the function name and 1-based argument number when binding a
/// call argument.
pub(crate) type AssignCtx = Option<(StrId, usize)>;

impl Interpreter {
    /// Reads a value as a signed word. Pointers coerce to their address;
    /// non-scalar values read as zero.
    pub(crate) fn coerce_integer(&self, c: &Cursor, v: &Value) -> Result<i64> {
        let base = self.types.node(v.typ).base;
        if self.types.is_numeric_coercible(v.typ) || base == BaseKind::Pointer {
            let s = Scalar::load(&self.arena, base, v.addr).map_err(|e| self.mem_fail(c, e))?;
            Ok(s.as_int())
        } else {
            Ok(0)
        }
    }

    pub(crate) fn coerce_unsigned(&self, c: &Cursor, v: &Value) -> Result<u64> {
        let base = self.types.node(v.typ).base;
        if self.types.is_numeric_coercible(v.typ) || base == BaseKind::Pointer {
            let s = Scalar::load(&self.arena, base, v.addr).map_err(|e| self.mem_fail(c, e))?;
            Ok(s.as_unsigned())
        } else {
            Ok(0)
        }
    }

    pub(crate) fn coerce_fp(&self, c: &Cursor, v: &Value) -> Result<f64> {
        if self.types.is_numeric_coercible(v.typ) {
            let base = self.types.node(v.typ).base;
            let s = Scalar::load(&self.arena, base, v.addr).map_err(|e| self.mem_fail(c, e))?;
            Ok(s.as_fp())
        } else {
            Ok(0.0)
        }
    }

    /// Reads the address stored in a pointer value's payload.
    pub(crate) fn load_pointer(&self, c: &Cursor, v: &Value) -> Result<Addr> {
        match Scalar::load(&self.arena, BaseKind::Pointer, v.addr)
            .map_err(|e| self.mem_fail(c, e))?
        {
            Scalar::Pointer(addr) => Ok(addr),
            _ => unreachable!("pointer kind always loads a pointer scalar"),
        }
    }

    /// Stores an integer into an lvalue, truncating to its width. Returns
    /// the stored value, or the previous value when `after` is set
    /// (post-increment semantics).
    pub(crate) fn assign_int(
        &mut self,
        c: &Cursor,
        dest: &Value,
        value: i64,
        after: bool,
    ) -> Result<i64> {
        if !dest.is_lvalue {
            return Err(c.fail(ErrorKind::Semantic, "can't assign to this"));
        }
        let result = if after {
            self.coerce_integer(c, dest)?
        } else {
            value
        };
        let base = self.types.node(dest.typ).base;
        if self.types.is_integer_numeric(dest.typ) {
            Scalar::store_int(&mut self.arena, base, dest.addr, value)
                .map_err(|e| self.mem_fail(c, e))?;
        }
        Ok(result)
    }

    pub(crate) fn assign_fp(&mut self, c: &Cursor, dest: &Value, value: f64) -> Result<f64> {
        if !dest.is_lvalue {
            return Err(c.fail(ErrorKind::Semantic, "can't assign to this"));
        }
        Scalar::store_fp(&mut self.arena, dest.addr, value)
            .map_err(|e| self.mem_fail(c, e))?;
        Ok(value)
    }

    fn assign_fail(&self, c: &Cursor, detail: String, ctx: AssignCtx) -> crate::error::EvalError {
        let message = match ctx {
            Some((func, n)) => format!(
                "can't set {} in argument {} of call to {}()",
                detail,
                n,
                self.interner.resolve(func)
            ),
            None => format!("can't assign {}", detail),
        };
        c.fail(ErrorKind::Semantic, message)
    }

    fn type_pair(&self, dest: TypeId, src: TypeId) -> String {
        format!(
            "{} from {}",
            self.types.describe(dest, &self.interner),
            self.types.describe(src, &self.interner)
        )
    }

    /// Assigns any kind of value to any kind of destination, applying the
    /// implicit conversion rules. `force` permits writing through a
    /// non-lvalue, as casts and return slots need.
    pub(crate) fn expression_assign(
        &mut self,
        c: &Cursor,
        dest: &Value,
        src: &Value,
        force: bool,
        allow_pointer_coercion: bool,
        ctx: AssignCtx,
    ) -> Result<()> {
        if !dest.is_lvalue && !force {
            return Err(self.assign_fail(c, "not an lvalue".into(), ctx));
        }
        let coercible_source = self.types.is_numeric_coercible(src.typ)
            || (allow_pointer_coercion && self.types.is_pointer(src.typ));
        if self.types.is_numeric_coercible(dest.typ) && !coercible_source {
            return Err(self.assign_fail(c, self.type_pair(dest.typ, src.typ), ctx));
        }
        match self.types.node(dest.typ).base {
            BaseKind::Int | BaseKind::Short | BaseKind::Long | BaseKind::Enum => {
                let n = self.coerce_integer(c, src)?;
                let base = self.types.node(dest.typ).base;
                Scalar::store_int(&mut self.arena, base, dest.addr, n)
                    .map_err(|e| self.mem_fail(c, e))?;
            }
            BaseKind::Char
            | BaseKind::UnsignedInt
            | BaseKind::UnsignedShort
            | BaseKind::UnsignedLong => {
                let n = self.coerce_unsigned(c, src)?;
                let base = self.types.node(dest.typ).base;
                Scalar::store_int(&mut self.arena, base, dest.addr, n as i64)
                    .map_err(|e| self.mem_fail(c, e))?;
            }
            BaseKind::Fp => {
                let n = self.coerce_fp(c, src)?;
                Scalar::store_fp(&mut self.arena, dest.addr, n)
                    .map_err(|e| self.mem_fail(c, e))?;
            }
            BaseKind::Pointer => {
                self.assign_to_pointer(c, dest, src, allow_pointer_coercion, ctx)?;
            }
            BaseKind::Array => {
                if dest.typ != src.typ {
                    return Err(self.assign_fail(c, self.type_pair(dest.typ, src.typ), ctx));
                }
                self.copy_payload(c, dest.addr, src)?;
            }
            BaseKind::Struct | BaseKind::Union => {
                if dest.typ != src.typ {
                    return Err(self.assign_fail(c, self.type_pair(dest.typ, src.typ), ctx));
                }
                self.copy_payload(c, dest.addr, src)?;
            }
            _ => {
                let detail = self.types.describe(dest.typ, &self.interner);
                return Err(self.assign_fail(c, detail, ctx));
            }
        }
        Ok(())
    }

    /// The pointer-destination arm of assignment: matching pointers,
    /// `void *` in either direction, array decay, null literals, and (for
    /// casts) arbitrary numeric and cross-type pointer coercion.
    fn assign_to_pointer(
        &mut self,
        c: &Cursor,
        dest: &Value,
        src: &Value,
        allow_coercion: bool,
        ctx: AssignCtx,
    ) -> Result<()> {
        let dest_pointee = self
            .types
            .node(dest.typ)
            .from
            .expect("pointer types always have a pointee");
        let src_node_base = self.types.node(src.typ).base;
        let void_ptr = self.types.void_ptr_t;
        let target: Addr = if src.typ == dest.typ
            || src.typ == void_ptr
            || (dest.typ == void_ptr && src_node_base == BaseKind::Pointer)
        {
            self.load_pointer(c, src)?
        } else if src_node_base == BaseKind::Array
            && (self.types.node(src.typ).from == Some(dest_pointee) || dest.typ == void_ptr)
        {
            // blah *x = array of blah; the array decays to its first element
            src.addr
        } else if src_node_base == BaseKind::Pointer
            && self
                .types
                .node(src.typ)
                .from
                .map(|p| self.types.node(p).base == BaseKind::Array)
                .unwrap_or(false)
            && (self
                .types
                .node(src.typ)
                .from
                .and_then(|p| self.types.node(p).from)
                == Some(dest_pointee)
                || dest.typ == void_ptr)
        {
            // blah *x = pointer to array of blah
            self.load_pointer(c, src)?
        } else if self.types.is_numeric_coercible(src.typ)
            && self.coerce_integer(c, src)? == 0
        {
            0
        } else if allow_coercion && self.types.is_numeric_coercible(src.typ) {
            self.coerce_unsigned(c, src)?
        } else if allow_coercion && src_node_base == BaseKind::Pointer {
            self.load_pointer(c, src)?
        } else {
            return Err(self.assign_fail(c, self.type_pair(dest.typ, src.typ), ctx));
        };
        Scalar::store_pointer(&mut self.arena, dest.addr, target)
            .map_err(|e| self.mem_fail(c, e))
    }

    /// Pushes a fresh int temporary holding `n`.
    pub(crate) fn push_int(&mut self, c: &Cursor, stack: &mut ExprStack, n: i64) -> Result<()> {
        let v = self.alloc_value(c, self.types.int_t, false, false)?;
        Scalar::store_int(&mut self.arena, BaseKind::Int, v.addr, n)
            .map_err(|e| self.mem_fail(c, e))?;
        stack.push_value(v);
        Ok(())
    }

    pub(crate) fn push_fp(&mut self, c: &Cursor, stack: &mut ExprStack, n: f64) -> Result<()> {
        let v = self.alloc_value(c, self.types.fp_t, false, false)?;
        Scalar::store_fp(&mut self.arena, v.addr, n).map_err(|e| self.mem_fail(c, e))?;
        stack.push_value(v);
        Ok(())
    }

    /// Pushes a blank non-lvalue temporary of the given type and returns
    /// its descriptor.
    pub(crate) fn push_value_by_type(
        &mut self,
        c: &Cursor,
        stack: &mut ExprStack,
        typ: TypeId,
    ) -> Result<Value> {
        let v = self.alloc_value(c, typ, false, false)?;
        stack.push_value(v);
        Ok(v)
    }

    /// Pushes a non-lvalue copy of an existing value.
    pub(crate) fn push_value_copy(
        &mut self,
        c: &Cursor,
        stack: &mut ExprStack,
        src: &Value,
    ) -> Result<()> {
        let dest = self.alloc_value(c, src.typ, false, false)?;
        self.copy_payload(c, dest.addr, src)?;
        stack.push_value(dest);
        Ok(())
    }

    pub(crate) fn prefix_operator(
        &mut self,
        c: &Cursor,
        stack: &mut ExprStack,
        op: Token,
        top: Value,
    ) -> Result<()> {
        match op {
            Token::Ampersand => {
                if !top.is_lvalue {
                    return Err(c.fail(ErrorKind::Semantic, "can't get the address of this"));
                }
                let ptr_t = self.types.pointer_to(top.typ);
                let v = self.alloc_value(c, ptr_t, false, false)?;
                Scalar::store_pointer(&mut self.arena, v.addr, top.addr)
                    .map_err(|e| self.mem_fail(c, e))?;
                stack.push_value(v);
                Ok(())
            }
            Token::Star => {
                let target = self.dereference(c, &top)?;
                stack.push_value(target);
                Ok(())
            }
            Token::Sizeof => {
                let typ = if self.types.node(top.typ).base == BaseKind::Type {
                    self.type_payload(c, &top)?
                } else {
                    top.typ
                };
                let size = self
                    .types
                    .type_size(typ, self.types.node(typ).array_len, true);
                self.push_int(c, stack, size as i64)
            }
            _ => self.prefix_arithmetic(c, stack, op, top),
        }
    }

    fn prefix_arithmetic(
        &mut self,
        c: &Cursor,
        stack: &mut ExprStack,
        op: Token,
        top: Value,
    ) -> Result<()> {
        let base = self.types.node(top.typ).base;
        if base == BaseKind::Fp {
            let n = self.coerce_fp(c, &top)?;
            let result = match op {
                Token::Plus => n,
                Token::Minus => -n,
                _ => return Err(c.fail(ErrorKind::Semantic, "invalid operation")),
            };
            self.push_fp(c, stack, result)
        } else if self.types.is_numeric_coercible(top.typ) {
            let n = self.coerce_integer(c, &top)?;
            let result = match op {
                Token::Plus => n,
                Token::Minus => n.wrapping_neg(),
                Token::Increment => self.assign_int(c, &top, n.wrapping_add(1), false)?,
                Token::Decrement => self.assign_int(c, &top, n.wrapping_sub(1), false)?,
                Token::Not => (n == 0) as i64,
                Token::Tilde => !n,
                _ => return Err(c.fail(ErrorKind::Semantic, "invalid operation")),
            };
            self.push_int(c, stack, result)
        } else if base == BaseKind::Pointer {
            let pointee = self
                .types
                .node(top.typ)
                .from
                .expect("pointer types always have a pointee");
            let size = self.types.type_size(pointee, 0, true) as u64;
            let ptr = self.load_pointer(c, &top)?;
            if ptr == 0 {
                return Err(c.fail(ErrorKind::Semantic, "invalid use of a NULL pointer"));
            }
            if !top.is_lvalue {
                return Err(c.fail(ErrorKind::Semantic, "can't assign to this"));
            }
            let moved = match op {
                Token::Increment => ptr.wrapping_add(size),
                Token::Decrement => ptr.wrapping_sub(size),
                _ => return Err(c.fail(ErrorKind::Semantic, "invalid operation")),
            };
            Scalar::store_pointer(&mut self.arena, top.addr, moved)
                .map_err(|e| self.mem_fail(c, e))?;
            let v = self.push_value_by_type(c, stack, top.typ)?;
            Scalar::store_pointer(&mut self.arena, v.addr, moved)
                .map_err(|e| self.mem_fail(c, e))
        } else {
            Err(c.fail(ErrorKind::Semantic, "invalid operation"))
        }
    }

    pub(crate) fn postfix_operator(
        &mut self,
        c: &Cursor,
        stack: &mut ExprStack,
        op: Token,
        top: Value,
    ) -> Result<()> {
        if self.types.is_numeric_coercible(top.typ) {
            let n = self.coerce_integer(c, &top)?;
            let result = match op {
                Token::Increment => self.assign_int(c, &top, n.wrapping_add(1), true)?,
                Token::Decrement => self.assign_int(c, &top, n.wrapping_sub(1), true)?,
                Token::RightSquare | Token::CloseBracket => {
                    return Err(c.fail(ErrorKind::Semantic, "not supported"))
                }
                _ => return Err(c.fail(ErrorKind::Semantic, "invalid operation")),
            };
            self.push_int(c, stack, result)
        } else if self.types.node(top.typ).base == BaseKind::Pointer {
            // pointer postfix arithmetic yields the pre-step pointer
            let pointee = self
                .types
                .node(top.typ)
                .from
                .expect("pointer types always have a pointee");
            let size = self.types.type_size(pointee, 0, true) as u64;
            let ptr = self.load_pointer(c, &top)?;
            if ptr == 0 {
                return Err(c.fail(ErrorKind::Semantic, "invalid use of a NULL pointer"));
            }
            if !top.is_lvalue {
                return Err(c.fail(ErrorKind::Semantic, "can't assign to this"));
            }
            let moved = match op {
                Token::Increment => ptr.wrapping_add(size),
                Token::Decrement => ptr.wrapping_sub(size),
                _ => return Err(c.fail(ErrorKind::Semantic, "invalid operation")),
            };
            Scalar::store_pointer(&mut self.arena, top.addr, moved)
                .map_err(|e| self.mem_fail(c, e))?;
            let v = self.push_value_by_type(c, stack, top.typ)?;
            Scalar::store_pointer(&mut self.arena, v.addr, ptr)
                .map_err(|e| self.mem_fail(c, e))
        } else {
            Err(c.fail(ErrorKind::Semantic, "invalid operation"))
        }
    }

    pub(crate) fn infix_operator(
        &mut self,
        c: &Cursor,
        stack: &mut ExprStack,
        op: Token,
        bottom: Value,
        top: Value,
    ) -> Result<()> {
        if op == Token::LeftSquare {
            return self.array_index(c, stack, &bottom, &top);
        }
        if op == Token::Question {
            return self.question_operator(c, stack, &bottom, &top);
        }
        if op == Token::Colon {
            return self.colon_operator(c, stack, &bottom, &top);
        }
        let top_fp = self.types.node(top.typ).base == BaseKind::Fp;
        let bottom_fp = self.types.node(bottom.typ).base == BaseKind::Fp;
        if (top_fp && (bottom_fp || self.types.is_numeric_coercible(bottom.typ)))
            || (bottom_fp && self.types.is_numeric_coercible(top.typ))
        {
            self.fp_infix(c, stack, op, &bottom, &top)
        } else if self.types.is_numeric_coercible(top.typ)
            && self.types.is_numeric_coercible(bottom.typ)
        {
            self.integer_infix(c, stack, op, &bottom, &top)
        } else if self.types.is_pointer(bottom.typ) && self.types.is_numeric_coercible(top.typ) {
            self.pointer_integer_infix(c, stack, op, bottom, &top)
        } else if self.types.is_pointer(bottom.typ)
            && self.types.is_pointer(top.typ)
            && op != Token::Assign
        {
            self.pointer_pointer_infix(c, stack, op, &bottom, &top)
        } else if op == Token::Assign {
            self.expression_assign(c, &bottom, &top, false, false, None)?;
            stack.push_value(bottom);
            Ok(())
        } else if op == Token::Cast {
            let typ = self.type_payload(c, &bottom)?;
            let dest = self.push_value_by_type(c, stack, typ)?;
            self.expression_assign(c, &dest, &top, true, true, None)
        } else {
            Err(c.fail(ErrorKind::Semantic, "invalid operation"))
        }
    }

    /// `a[i]`: the element descriptor aliases the array or pointed-to
    /// storage, so writing through it writes the container.
    fn array_index(
        &mut self,
        c: &Cursor,
        stack: &mut ExprStack,
        bottom: &Value,
        top: &Value,
    ) -> Result<()> {
        if !self.types.is_numeric_coercible(top.typ) {
            return Err(c.fail(ErrorKind::Semantic, "array index must be an integer"));
        }
        let index = self.coerce_integer(c, top)?;
        let node = self.types.node(bottom.typ);
        let result = match node.base {
            BaseKind::Array => {
                let element = node.from.expect("array types always have an element type");
                let offset = self.types.type_size(element, 0, true) as i64 * index;
                Value::new(
                    element,
                    bottom.addr.wrapping_add(offset as u64),
                    bottom.is_lvalue,
                    Storage::Borrowed,
                )
            }
            BaseKind::Pointer => {
                let pointee = node.from.expect("pointer types always have a pointee");
                let offset = self.types.type_size(pointee, 0, true) as i64 * index;
                let ptr = self.load_pointer(c, bottom)?;
                Value::new(
                    pointee,
                    ptr.wrapping_add(offset as u64),
                    bottom.is_lvalue,
                    Storage::Borrowed,
                )
            }
            _ => {
                return Err(c.fail(
                    ErrorKind::Semantic,
                    format!(
                        "this {} is not an array",
                        self.types.describe(bottom.typ, &self.interner)
                    ),
                ))
            }
        };
        stack.push_value(result);
        Ok(())
    }

    /// First half of `cond ? then`: a true condition yields a copy of the
    /// then-value, a false one yields a void marker for ':' to detect.
    fn question_operator(
        &mut self,
        c: &Cursor,
        stack: &mut ExprStack,
        cond: &Value,
        then_value: &Value,
    ) -> Result<()> {
        if !self.types.is_numeric_coercible(cond.typ) {
            return Err(c.fail(
                ErrorKind::Semantic,
                "first argument to '?' should be a number",
            ));
        }
        if self.coerce_integer(c, cond)? != 0 {
            self.push_value_copy(c, stack, then_value)
        } else {
            let void_t = self.types.void_t;
            self.push_value_by_type(c, stack, void_t)?;
            Ok(())
        }
    }

    /// Second half of `? :`: a void then-result means the condition was
    /// false, so the else-value wins.
    fn colon_operator(
        &mut self,
        c: &Cursor,
        stack: &mut ExprStack,
        then_result: &Value,
        else_value: &Value,
    ) -> Result<()> {
        if self.types.node(then_result.typ).base == BaseKind::Void {
            self.push_value_copy(c, stack, else_value)
        } else {
            self.push_value_copy(c, stack, then_result)
        }
    }

    fn fp_infix(
        &mut self,
        c: &Cursor,
        stack: &mut ExprStack,
        op: Token,
        bottom: &Value,
        top: &Value,
    ) -> Result<()> {
        let t = self.coerce_fp(c, top)?;
        let b = self.coerce_fp(c, bottom)?;
        let int_result = match op {
            Token::Equal => Some(b == t),
            Token::NotEqual => Some(b != t),
            Token::LessThan => Some(b < t),
            Token::GreaterThan => Some(b > t),
            Token::LessEqual => Some(b <= t),
            Token::GreaterEqual => Some(b >= t),
            _ => None,
        };
        if let Some(flag) = int_result {
            return self.push_int(c, stack, flag as i64);
        }
        let result = match op {
            Token::Assign => self.assign_fp(c, bottom, t)?,
            Token::AddAssign => self.assign_fp(c, bottom, b + t)?,
            Token::SubAssign => self.assign_fp(c, bottom, b - t)?,
            Token::MulAssign => self.assign_fp(c, bottom, b * t)?,
            Token::DivAssign => self.assign_fp(c, bottom, b / t)?,
            Token::Plus => b + t,
            Token::Minus => b - t,
            Token::Star => b * t,
            Token::Slash => b / t,
            _ => return Err(c.fail(ErrorKind::Semantic, "invalid operation")),
        };
        self.push_fp(c, stack, result)
    }

    fn integer_infix(
        &mut self,
        c: &Cursor,
        stack: &mut ExprStack,
        op: Token,
        bottom: &Value,
        top: &Value,
    ) -> Result<()> {
        let t = self.coerce_integer(c, top)?;
        let b = self.coerce_integer(c, bottom)?;
        let divide = |c: &Cursor, n: i64, d: i64| -> Result<i64> {
            if d == 0 {
                Err(c.fail(ErrorKind::Semantic, "division by zero"))
            } else {
                Ok(n.wrapping_div(d))
            }
        };
        let modulus = |c: &Cursor, n: i64, d: i64| -> Result<i64> {
            if d == 0 {
                Err(c.fail(ErrorKind::Semantic, "division by zero"))
            } else {
                Ok(n.wrapping_rem(d))
            }
        };
        let result = match op {
            Token::Assign => self.assign_int(c, bottom, t, false)?,
            Token::AddAssign => self.assign_int(c, bottom, b.wrapping_add(t), false)?,
            Token::SubAssign => self.assign_int(c, bottom, b.wrapping_sub(t), false)?,
            Token::MulAssign => self.assign_int(c, bottom, b.wrapping_mul(t), false)?,
            Token::DivAssign => {
                let n = divide(c, b, t)?;
                self.assign_int(c, bottom, n, false)?
            }
            Token::ModAssign => {
                let n = modulus(c, b, t)?;
                self.assign_int(c, bottom, n, false)?
            }
            Token::ShlAssign => self.assign_int(c, bottom, b.wrapping_shl(t as u32 & 63), false)?,
            Token::ShrAssign => self.assign_int(c, bottom, b.wrapping_shr(t as u32 & 63), false)?,
            Token::AndAssign => self.assign_int(c, bottom, b & t, false)?,
            Token::OrAssign => self.assign_int(c, bottom, b | t, false)?,
            Token::XorAssign => self.assign_int(c, bottom, b ^ t, false)?,
            Token::LogicalOr => (b != 0 || t != 0) as i64,
            Token::LogicalAnd => (b != 0 && t != 0) as i64,
            Token::BitOr => b | t,
            Token::BitXor => b ^ t,
            Token::Ampersand => b & t,
            Token::Equal => (b == t) as i64,
            Token::NotEqual => (b != t) as i64,
            Token::LessThan => (b < t) as i64,
            Token::GreaterThan => (b > t) as i64,
            Token::LessEqual => (b <= t) as i64,
            Token::GreaterEqual => (b >= t) as i64,
            Token::ShiftLeft => b.wrapping_shl(t as u32 & 63),
            Token::ShiftRight => b.wrapping_shr(t as u32 & 63),
            Token::Plus => b.wrapping_add(t),
            Token::Minus => b.wrapping_sub(t),
            Token::Star => b.wrapping_mul(t),
            Token::Slash => divide(c, b, t)?,
            Token::Percent => modulus(c, b, t)?,
            _ => return Err(c.fail(ErrorKind::Semantic, "invalid operation")),
        };
        self.push_int(c, stack, result)
    }

    fn pointer_integer_infix(
        &mut self,
        c: &Cursor,
        stack: &mut ExprStack,
        op: Token,
        bottom: Value,
        top: &Value,
    ) -> Result<()> {
        let t = self.coerce_integer(c, top)?;
        match op {
            Token::Equal | Token::NotEqual => {
                // pointers only compare against a literal zero
                if t != 0 {
                    return Err(c.fail(ErrorKind::Semantic, "invalid operation"));
                }
                let ptr = self.load_pointer(c, &bottom)?;
                let flag = if op == Token::Equal {
                    ptr == 0
                } else {
                    ptr != 0
                };
                self.push_int(c, stack, flag as i64)
            }
            Token::Plus | Token::Minus => {
                let size = self.pointee_size(&bottom);
                let ptr = self.load_pointer(c, &bottom)?;
                if ptr == 0 {
                    return Err(c.fail(ErrorKind::Semantic, "invalid use of a NULL pointer"));
                }
                let moved = if op == Token::Plus {
                    ptr.wrapping_add((t as u64).wrapping_mul(size))
                } else {
                    ptr.wrapping_sub((t as u64).wrapping_mul(size))
                };
                let v = self.push_value_by_type(c, stack, bottom.typ)?;
                Scalar::store_pointer(&mut self.arena, v.addr, moved)
                    .map_err(|e| self.mem_fail(c, e))
            }
            Token::Assign if t == 0 => {
                self.expression_assign(c, &bottom, top, false, false, None)?;
                stack.push_value(bottom);
                Ok(())
            }
            Token::AddAssign | Token::SubAssign => {
                let size = self.pointee_size(&bottom);
                let ptr = self.load_pointer(c, &bottom)?;
                if ptr == 0 {
                    return Err(c.fail(ErrorKind::Semantic, "invalid use of a NULL pointer"));
                }
                let moved = if op == Token::AddAssign {
                    ptr.wrapping_add((t as u64).wrapping_mul(size))
                } else {
                    ptr.wrapping_sub((t as u64).wrapping_mul(size))
                };
                Scalar::store_pointer(&mut self.arena, bottom.addr, moved)
                    .map_err(|e| self.mem_fail(c, e))?;
                stack.push_value(bottom);
                Ok(())
            }
            _ => Err(c.fail(ErrorKind::Semantic, "invalid operation")),
        }
    }

    fn pointer_pointer_infix(
        &mut self,
        c: &Cursor,
        stack: &mut ExprStack,
        op: Token,
        bottom: &Value,
        top: &Value,
    ) -> Result<()> {
        let t = self.load_pointer(c, top)?;
        let b = self.load_pointer(c, bottom)?;
        match op {
            Token::Equal => self.push_int(c, stack, (b == t) as i64),
            Token::NotEqual => self.push_int(c, stack, (b != t) as i64),
            Token::Minus => {
                // difference in elements, not bytes
                let size = self.pointee_size(bottom).max(1);
                let diff = (b as i64).wrapping_sub(t as i64) / size as i64;
                self.push_int(c, stack, diff)
            }
            _ => Err(c.fail(ErrorKind::Semantic, "invalid operation")),
        }
    }

    fn pointee_size(&self, ptr: &Value) -> u64 {
        let pointee = self
            .types
            .node(ptr.typ)
            .from
            .expect("pointer types always have a pointee");
        self.types.type_size(pointee, 0, true) as u64
    }

    /// `.` and `->`: reads the member name from the token stream and
    /// replaces the struct value on the stack with an lvalue aliasing the
    /// member's storage.
    pub(crate) fn struct_element(
        &mut self,
        c: &mut Cursor,
        stack: &mut ExprStack,
        op: Token,
    ) -> Result<()> {
        let member = match self.get_token(c)?.token {
            Token::Ident(name) => name,
            _ => {
                return Err(c.fail(
                    ErrorKind::Syntax,
                    format!("need a structure or union member after {}", op),
                ))
            }
        };
        if c.mode != RunMode::Run {
            return Ok(());
        }
        let base = stack
            .pop_value()
            .ok_or_else(|| c.fail(ErrorKind::Syntax, "invalid expression"))?;
        let (composite, data_addr) = if op == Token::Arrow {
            let target = self.dereference(c, &base)?;
            (target.typ, target.addr)
        } else {
            (base.typ, base.addr)
        };
        let node = self.types.node(composite);
        if !matches!(node.base, BaseKind::Struct | BaseKind::Union) {
            return Err(c.fail(
                ErrorKind::Semantic,
                format!(
                    "can't use {} on a {}",
                    op,
                    self.types.describe(base.typ, &self.interner)
                ),
            ));
        }
        let info = match node.members.as_ref().and_then(|t| t.get(member)) {
            Some(info) => *info,
            None => {
                return Err(c.fail(
                    ErrorKind::Semantic,
                    format!(
                        "doesn't have a member called '{}'",
                        self.interner.resolve(member)
                    ),
                ))
            }
        };
        stack.push_value(Value::new(
            info.typ,
            data_addr + info.offset as u64,
            true,
            Storage::Borrowed,
        ));
        Ok(())
    }
}
