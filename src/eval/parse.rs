//! Operator-precedence expression parsing.
//!
//! A single forward pass pushes values and operators onto the expression
//! stack; before each push the stack is collapsed down to the incoming
//! operator's precedence, which evaluates everything that binds tighter.
//! Right-to-left levels collapse to precedence+1 so equal-precedence
//! chains reduce from the right. Short-circuit `&&`/`||` set an ignore
//! watermark: operators at or below it are parsed but produce dummy
//! results instead of running.

use crate::error::{ErrorKind, Result};
use crate::eval::precedence::{is_left_to_right, precedence_of, BRACKET_PRECEDENCE, DEEP_PRECEDENCE};
use crate::eval::stack::{Entry, ExprStack, Order};
use crate::interp::{CallFrame, Interpreter, MacroDef};
use crate::lexer::cursor::{Cursor, RunMode};
use crate::lexer::token::Token;
use crate::memory::scalar::Scalar;
use crate::memory::value::Value;
use crate::symbols::{Slot, StrId, SymbolMap};
use crate::types::BaseKind;

impl Interpreter {
    /// Parses and (in run mode) evaluates one expression. Returns `None`
    /// when the cursor does not start an expression; the cursor is left
    /// on the terminating token. In skip mode the returned value is a
    /// placeholder.
    pub(crate) fn expression_parse(&mut self, c: &mut Cursor) -> Result<Option<Value>> {
        let mut stack = ExprStack::new();
        let mut prefix_state = true;
        let mut done = false;
        let mut bracket_precedence = 0;
        let mut precedence = 0;
        let mut ignore = DEEP_PRECEDENCE;
        let mut ternary_depth = 0;
        while !done {
            let saved = c.clone();
            let token = self.get_token(c)?.token;
            let entry = precedence_of(&token);
            let is_operator = entry.is_some()
                && (token != Token::CloseBracket || bracket_precedence != 0)
                && (token != Token::Colon || ternary_depth > 0);
            if is_operator {
                let entry = entry.expect("operator classification implies a table entry");
                if prefix_state {
                    if entry.prefix == 0 {
                        return Err(c.fail(ErrorKind::Syntax, "operator not expected here"));
                    }
                    precedence = bracket_precedence + entry.prefix;
                    if token == Token::OpenBracket {
                        // a new bracket level, or a cast
                        let next = self.peek_token(c)?.token;
                        let sizeof_operand = matches!(
                            stack.top(),
                            Some(Entry::Operator {
                                op: Token::Sizeof,
                                ..
                            })
                        );
                        if next.starts_type() && !sizeof_operand {
                            let (cast_type, _, _) = self.type_parse(c)?;
                            if self.get_token(c)?.token != Token::CloseBracket {
                                return Err(c.fail(ErrorKind::Syntax, "brackets not closed"));
                            }
                            let cast_prec = precedence_of(&Token::Cast)
                                .expect("cast is in the precedence table")
                                .prefix;
                            precedence = bracket_precedence + cast_prec;
                            self.stack_collapse(c, &mut stack, precedence + 1, &mut ignore)?;
                            let type_t = self.types.type_t;
                            let tv = self.alloc_value(c, type_t, false, false)?;
                            self.store_type_payload(c, &tv, cast_type)?;
                            stack.push_value(tv);
                            stack.push_operator(Token::Cast, Order::Infix, precedence);
                        } else {
                            bracket_precedence += BRACKET_PRECEDENCE;
                        }
                    } else {
                        self.stack_collapse(c, &mut stack, precedence, &mut ignore)?;
                        stack.push_operator(token, Order::Prefix, precedence);
                    }
                } else {
                    if entry.postfix != 0 {
                        match token {
                            Token::CloseBracket | Token::RightSquare => {
                                if bracket_precedence == 0 {
                                    // a bracket after the end of the expression
                                    *c = saved;
                                    done = true;
                                } else {
                                    self.stack_collapse(
                                        c,
                                        &mut stack,
                                        bracket_precedence,
                                        &mut ignore,
                                    )?;
                                    bracket_precedence -= BRACKET_PRECEDENCE;
                                }
                            }
                            _ => {
                                precedence = bracket_precedence + entry.postfix;
                                self.stack_collapse(c, &mut stack, precedence, &mut ignore)?;
                                stack.push_operator(token, Order::Postfix, precedence);
                            }
                        }
                    } else if entry.infix != 0 {
                        precedence = bracket_precedence + entry.infix;
                        // right-to-left levels only collapse strictly tighter
                        // operators so equal precedence reduces in reverse
                        if is_left_to_right(entry.infix) {
                            self.stack_collapse(c, &mut stack, precedence, &mut ignore)?;
                        } else {
                            self.stack_collapse(c, &mut stack, precedence + 1, &mut ignore)?;
                        }
                        if token == Token::Dot || token == Token::Arrow {
                            self.struct_element(c, &mut stack, token)?;
                        } else {
                            if token == Token::LogicalOr || token == Token::LogicalAnd {
                                // a decided LHS means the RHS doesn't run
                                if let Some(Entry::Value(lhs)) = stack.top() {
                                    if self.types.is_numeric_coercible(lhs.typ) {
                                        let lhs = *lhs;
                                        let n = self.coerce_integer(c, &lhs)?;
                                        let decided = (token == Token::LogicalOr && n != 0)
                                            || (token == Token::LogicalAnd && n == 0);
                                        if decided && ignore > precedence {
                                            ignore = precedence;
                                        }
                                    }
                                }
                            }
                            stack.push_operator(token, Order::Infix, precedence);
                            prefix_state = true;
                            match token {
                                Token::Question => ternary_depth += 1,
                                Token::Colon => ternary_depth -= 1,
                                _ => {}
                            }
                        }
                    } else {
                        return Err(c.fail(ErrorKind::Syntax, "operator not expected here"));
                    }
                    // '[' is an infix index operator that also opens a
                    // bracket level, closed by ']' above
                    if token == Token::LeftSquare {
                        bracket_precedence += BRACKET_PRECEDENCE;
                    }
                }
            } else if let Token::Ident(name) = token {
                if !prefix_state {
                    return Err(c.fail(ErrorKind::Syntax, "identifier not expected here"));
                }
                if self.peek_token(c)?.token == Token::OpenBracket {
                    let run_it = c.mode == RunMode::Run && precedence < ignore;
                    self.parse_function_call(c, &mut stack, name, run_it)?;
                } else if c.mode == RunMode::Run && precedence < ignore {
                    let slot = self.variable_get(c, name)?;
                    match self.types.node(slot.value.typ).base {
                        BaseKind::Macro => {
                            // a parameterless macro expands as a small
                            // subroutine evaluated in place
                            let def = self.macro_def(c, &slot.value)?;
                            if !def.params.is_empty() {
                                return Err(
                                    c.fail(ErrorKind::Syntax, "macro arguments missing")
                                );
                            }
                            let mut body = def.body.clone();
                            body.mode = RunMode::Run;
                            let result = self.expression_parse(&mut body)?.ok_or_else(|| {
                                body.fail(ErrorKind::Syntax, "expression expected")
                            })?;
                            if self.peek_token(&mut body)?.token != Token::EndOfFunction {
                                return Err(
                                    body.fail(ErrorKind::Syntax, "expression expected")
                                );
                            }
                            stack.push_value(result);
                        }
                        BaseKind::Void => {
                            return Err(c.fail(
                                ErrorKind::Semantic,
                                "a void value isn't much use here",
                            ));
                        }
                        _ => stack.push_value(slot.value.alias()),
                    }
                } else {
                    self.push_int(c, &mut stack, 0)?;
                }
                if precedence <= ignore {
                    ignore = DEEP_PRECEDENCE;
                }
                prefix_state = false;
            } else if token.is_value() {
                if !prefix_state {
                    return Err(c.fail(ErrorKind::Syntax, "value not expected here"));
                }
                prefix_state = false;
                self.push_literal(c, &mut stack, token)?;
            } else if token.starts_type() {
                // a bare type, as used by sizeof(int)
                if !prefix_state {
                    return Err(c.fail(ErrorKind::Syntax, "type not expected here"));
                }
                prefix_state = false;
                *c = saved;
                let (typ, _, _) = self.type_parse(c)?;
                let type_t = self.types.type_t;
                let tv = self.alloc_value(c, type_t, false, false)?;
                self.store_type_payload(c, &tv, typ)?;
                stack.push_value(tv);
            } else {
                // not an expression token
                *c = saved;
                done = true;
            }
        }
        if bracket_precedence > 0 {
            return Err(c.fail(ErrorKind::Syntax, "brackets not closed"));
        }
        self.stack_collapse(c, &mut stack, 0, &mut ignore)?;
        if stack.is_empty() {
            return Ok(None);
        }
        if c.mode == RunMode::Run {
            if stack.len() != 1 {
                return Err(c.fail(ErrorKind::Syntax, "invalid expression"));
            }
            match stack.pop() {
                Some(Entry::Value(v)) => Ok(Some(v)),
                _ => Err(c.fail(ErrorKind::Syntax, "invalid expression")),
            }
        } else {
            Ok(Some(Value::default()))
        }
    }

    /// Parses an expression and coerces the result to an integer. Skip
    /// mode parses without evaluating and yields zero.
    pub(crate) fn expression_parse_int(&mut self, c: &mut Cursor) -> Result<i64> {
        let value = self
            .expression_parse(c)?
            .ok_or_else(|| c.fail(ErrorKind::Syntax, "expression expected"))?;
        if c.mode != RunMode::Run {
            return Ok(0);
        }
        if !self.types.is_numeric_coercible(value.typ) {
            return Err(c.fail(ErrorKind::Semantic, "integer value expected"));
        }
        self.coerce_integer(c, &value)
    }

    fn push_literal(&mut self, c: &Cursor, stack: &mut ExprStack, token: Token) -> Result<()> {
        match token {
            Token::IntLit(n) => {
                let typ = if (i32::MIN as i64..=i32::MAX as i64).contains(&n) {
                    self.types.int_t
                } else {
                    self.types.long_t
                };
                let v = self.alloc_value(c, typ, false, false)?;
                let base = self.types.node(typ).base;
                Scalar::store_int(&mut self.arena, base, v.addr, n)
                    .map_err(|e| self.mem_fail(c, e))?;
                stack.push_value(v);
                Ok(())
            }
            Token::CharLit(ch) => {
                let char_t = self.types.char_t;
                let v = self.alloc_value(c, char_t, false, false)?;
                Scalar::store_int(&mut self.arena, BaseKind::Char, v.addr, ch as i64)
                    .map_err(|e| self.mem_fail(c, e))?;
                stack.push_value(v);
                Ok(())
            }
            Token::FpLit(n) => self.push_fp(c, stack, n),
            Token::StrLit(text) => {
                let lit = self.string_literal_value(c, text)?;
                self.push_value_copy(c, stack, &lit)
            }
            _ => unreachable!("is_value covers exactly the literal tokens"),
        }
    }

    /// Reduces the stack from the top until every remaining operator binds
    /// looser than `precedence`. Operators at or below the ignore
    /// watermark push dummy results instead of running; crossing back
    /// above the watermark clears it.
    pub(crate) fn stack_collapse(
        &mut self,
        c: &Cursor,
        stack: &mut ExprStack,
        precedence: i32,
        ignore: &mut i32,
    ) -> Result<()> {
        let mut found = precedence;
        while stack.len() >= 2 && found >= precedence {
            let op_index = match stack.top_operator_index() {
                Some(i) => i,
                None => break,
            };
            let (op, order, prec) = match *stack.get(op_index) {
                Entry::Operator {
                    op,
                    order,
                    precedence,
                } => (op, order, precedence),
                Entry::Value(_) => break,
            };
            found = prec;
            if found >= precedence {
                match order {
                    Order::Prefix => {
                        if op_index + 1 == stack.len() {
                            // operand missing
                            found = -1;
                        } else {
                            let top = match stack.pop() {
                                Some(Entry::Value(v)) => v,
                                _ => unreachable!("operator index implies a value on top"),
                            };
                            stack.pop();
                            if c.mode == RunMode::Run && found < *ignore {
                                self.prefix_operator(c, stack, op, top)?;
                            } else {
                                self.push_int(c, stack, 0)?;
                            }
                        }
                    }
                    Order::Postfix => {
                        let operand_ok = op_index + 1 == stack.len()
                            && op_index > 0
                            && matches!(stack.get(op_index - 1), Entry::Value(_));
                        if !operand_ok {
                            found = -1;
                        } else {
                            stack.pop();
                            let top = match stack.pop() {
                                Some(Entry::Value(v)) => v,
                                _ => unreachable!("checked the operand above"),
                            };
                            if c.mode == RunMode::Run && found < *ignore {
                                self.postfix_operator(c, stack, op, top)?;
                            } else {
                                self.push_int(c, stack, 0)?;
                            }
                        }
                    }
                    Order::Infix => {
                        let shape_ok = op_index + 2 == stack.len()
                            && op_index > 0
                            && matches!(stack.get(op_index - 1), Entry::Value(_));
                        if !shape_ok {
                            found = -1;
                        } else {
                            let top = match stack.pop() {
                                Some(Entry::Value(v)) => v,
                                _ => unreachable!("checked the shape above"),
                            };
                            stack.pop();
                            let bottom = match stack.pop() {
                                Some(Entry::Value(v)) => v,
                                _ => unreachable!("checked the shape above"),
                            };
                            if c.mode == RunMode::Run && found <= *ignore {
                                self.infix_operator(c, stack, op, bottom, top)?;
                            } else {
                                self.push_int(c, stack, 0)?;
                            }
                        }
                    }
                }
                if found <= *ignore {
                    *ignore = DEEP_PRECEDENCE;
                }
            }
        }
        Ok(())
    }

    /// `name(args...)`. The return slot is allocated in the caller's
    /// frame so it survives the call's teardown; everything else the call
    /// allocates lives in a fresh frame popped on return.
    pub(crate) fn parse_function_call(
        &mut self,
        c: &mut Cursor,
        stack: &mut ExprStack,
        name: StrId,
        run_it: bool,
    ) -> Result<()> {
        self.expect_token(c, Token::OpenBracket)?;
        let old_mode = c.mode;
        let mut callee = None;
        let mut ret = Value::default();
        let mut param_slots: Vec<Value> = Vec::new();
        if run_it {
            let slot = self.variable_get(c, name)?;
            match self.types.node(slot.value.typ).base {
                BaseKind::Macro => {
                    let def = self.macro_def(c, &slot.value)?;
                    return self.parse_macro_call(c, stack, name, def);
                }
                BaseKind::Function => {}
                _ => {
                    return Err(c.fail(
                        ErrorKind::Semantic,
                        format!(
                            "{} is not a function - can't call",
                            self.types.describe(slot.value.typ, &self.interner)
                        ),
                    ))
                }
            }
            let def = self.function_def(c, &slot.value)?;
            ret = self.push_value_by_type(c, stack, def.return_type)?;
            self.arena.push_frame();
            callee = Some(def);
        } else {
            self.push_int(c, stack, 0)?;
            c.mode = RunMode::Skip;
        }
        let param_count = callee.as_ref().map(|d| d.params.len()).unwrap_or(0);
        let mut arg_count = 0;
        loop {
            if run_it && arg_count < param_count {
                let def = callee.as_ref().expect("run_it implies a definition");
                let typ = def.params[arg_count].1;
                let slot = self.alloc_value(c, typ, false, false)?;
                param_slots.push(slot);
            }
            let terminator = match self.expression_parse(c)? {
                Some(arg) => {
                    if run_it {
                        if arg_count < param_count {
                            let slot = param_slots[arg_count];
                            self.expression_assign(
                                c,
                                &slot,
                                &arg,
                                true,
                                false,
                                Some((name, arg_count + 1)),
                            )?;
                        } else if !callee
                            .as_ref()
                            .expect("run_it implies a definition")
                            .varargs
                        {
                            return Err(c.fail(
                                ErrorKind::Syntax,
                                format!(
                                    "too many arguments to {}()",
                                    self.interner.resolve(name)
                                ),
                            ));
                        }
                    }
                    arg_count += 1;
                    let tok = self.get_token(c)?.token;
                    if tok != Token::Comma && tok != Token::CloseBracket {
                        return Err(c.fail(ErrorKind::Syntax, "comma expected"));
                    }
                    tok
                }
                None => {
                    let tok = self.get_token(c)?.token;
                    if tok != Token::CloseBracket {
                        return Err(c.fail(ErrorKind::Syntax, "bad argument"));
                    }
                    tok
                }
            };
            if terminator == Token::CloseBracket {
                break;
            }
        }
        if let Some(def) = callee {
            if arg_count < def.params.len() {
                return Err(c.fail(
                    ErrorKind::Syntax,
                    format!("too few arguments to {}()", self.interner.resolve(name)),
                ));
            }
            if let Some(native) = def.native {
                native(self, &ret, &param_slots)?;
            } else if let Some(body) = &def.body {
                let mut locals = SymbolMap::new();
                for (i, (pname, _)) in def.params.iter().enumerate() {
                    let mut bound = param_slots[i];
                    bound.is_lvalue = true;
                    locals.define(*pname, Slot { value: bound, decl: None });
                }
                self.call_frames.push(CallFrame { name, locals });
                let runner = match &self.executor {
                    Some(r) => std::rc::Rc::clone(r),
                    None => {
                        return Err(c.fail(
                            ErrorKind::Semantic,
                            format!(
                                "can't call '{}': no statement runner installed",
                                self.interner.resolve(name)
                            ),
                        ))
                    }
                };
                let mut body = body.clone();
                body.mode = RunMode::Run;
                let result = runner.run_body(self, &mut body, &ret);
                self.call_frames.pop();
                result?;
            } else {
                return Err(c.fail(
                    ErrorKind::Semantic,
                    format!("'{}' is undefined", self.interner.resolve(name)),
                ));
            }
            self.arena.pop_frame().map_err(|e| self.mem_fail(c, e))?;
        }
        c.mode = old_mode;
        Ok(())
    }

    /// A parameterized `#define` call. Arguments bind untyped; the body
    /// evaluates as one expression whose result lands in a float-width
    /// return slot.
    fn parse_macro_call(
        &mut self,
        c: &mut Cursor,
        stack: &mut ExprStack,
        name: StrId,
        def: MacroDef,
    ) -> Result<()> {
        let fp_t = self.types.fp_t;
        let ret = self.push_value_by_type(c, stack, fp_t)?;
        self.arena.push_frame();
        let mut args: Vec<Value> = Vec::new();
        loop {
            let terminator = match self.expression_parse(c)? {
                Some(arg) => {
                    if args.len() >= def.params.len() {
                        return Err(c.fail(
                            ErrorKind::Syntax,
                            format!("too many arguments to {}()", self.interner.resolve(name)),
                        ));
                    }
                    args.push(arg);
                    let tok = self.get_token(c)?.token;
                    if tok != Token::Comma && tok != Token::CloseBracket {
                        return Err(c.fail(ErrorKind::Syntax, "comma expected"));
                    }
                    tok
                }
                None => {
                    let tok = self.get_token(c)?.token;
                    if tok != Token::CloseBracket {
                        return Err(c.fail(ErrorKind::Syntax, "bad argument"));
                    }
                    tok
                }
            };
            if terminator == Token::CloseBracket {
                break;
            }
        }
        if args.len() < def.params.len() {
            return Err(c.fail(
                ErrorKind::Syntax,
                format!("too few arguments to {}()", self.interner.resolve(name)),
            ));
        }
        let mut locals = SymbolMap::new();
        for (pname, arg) in def.params.iter().zip(&args) {
            let mut bound = *arg;
            bound.is_lvalue = true;
            locals.define(*pname, Slot { value: bound, decl: None });
        }
        self.call_frames.push(CallFrame { name, locals });
        let mut body = def.body.clone();
        body.mode = RunMode::Run;
        let evaluated = (|| -> Result<Value> {
            let result = self
                .expression_parse(&mut body)?
                .ok_or_else(|| body.fail(ErrorKind::Syntax, "expression expected"))?;
            if self.peek_token(&mut body)?.token != Token::EndOfFunction {
                return Err(body.fail(ErrorKind::Syntax, "expression expected"));
            }
            Ok(result)
        })();
        let assigned = match evaluated {
            Ok(result) => self.expression_assign(c, &ret, &result, true, false, None),
            Err(e) => Err(e),
        };
        self.call_frames.pop();
        assigned?;
        self.arena.pop_frame().map_err(|e| self.mem_fail(c, e))
    }
}
