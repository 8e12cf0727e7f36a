//! Function and macro definitions, and native registration.
//!
//! Native library functions are registered as (textual prototype, callback)
//! pairs; the prototype is run through the ordinary scanner and type
//! parser so natives and interpreted functions share one signature model.
//! Interpreted function bodies are executed by the out-of-scope statement
//! layer through the [`StatementRunner`] seam.

use std::rc::Rc;

use crate::error::{ErrorKind, Result};
use crate::interp::Interpreter;
use crate::lexer::cursor::Cursor;
use crate::lexer::token::Token;
use crate::memory::scalar::Scalar;
use crate::memory::value::Value;
use crate::symbols::StrId;
use crate::types::{BaseKind, TypeId};

/// A native callback: receives the interpreter, the pre-allocated return
/// slot, and the bound argument values in order.
pub type NativeFn = fn(&mut Interpreter, &Value, &[Value]) -> Result<()>;

/// Executes interpreted function bodies. Implemented by the statement
/// layer; absent by default, in which case calling a non-native function
/// is an error.
pub trait StatementRunner {
    fn run_body(&self, interp: &mut Interpreter, body: &mut Cursor, ret: &Value) -> Result<()>;
}

/// A callable's declared signature plus how to run it.
#[derive(Clone)]
pub struct FuncDef {
    pub return_type: TypeId,
    pub params: Vec<(StrId, TypeId)>,
    pub varargs: bool,
    pub native: Option<NativeFn>,
    pub body: Option<Cursor>,
}

/// A `#define` macro: parameter names and the captured body tokens.
#[derive(Clone)]
pub struct MacroDef {
    pub params: Vec<StrId>,
    pub body: Cursor,
}

impl Interpreter {
    /// Registers a native function under its prototype, e.g.
    /// `"int abs(int x)"`. Prototype parse failure is fatal at
    /// registration time.
    pub fn register_native(&mut self, prototype: &str, native: NativeFn) -> Result<()> {
        let buffer = crate::lexer::scan::tokenize(prototype, "(native)", &mut self.interner)?;
        let mut c = Cursor::new(Rc::new(buffer));
        let (return_type, name, _) = self.type_parse(&mut c)?;
        let name = name.ok_or_else(|| {
            c.fail(ErrorKind::Syntax, "function name expected in prototype")
        })?;
        self.expect_token(&mut c, Token::OpenBracket)?;
        let (params, varargs) = self.parse_parameter_list(&mut c)?;
        let def = FuncDef {
            return_type,
            params,
            varargs,
            native: Some(native),
            body: None,
        };
        self.define_function(&mut c, name, def)
    }

    /// Binds a callable into the global scope. Used both by native
    /// registration and by the statement layer for interpreted functions.
    pub fn define_function(&mut self, c: &mut Cursor, name: StrId, def: FuncDef) -> Result<()> {
        let func_id = self.functions.len() as u64;
        self.functions.push(def);
        let value = self.alloc_value(c, self.types.function_t, false, true)?;
        Scalar::store_int(
            &mut self.arena,
            BaseKind::Function,
            value.addr,
            func_id as i64,
        )
        .map_err(|e| self.mem_fail(c, e))?;
        if !self.globals.define(
            name,
            crate::symbols::Slot { value, decl: None },
        ) {
            return Err(c.fail(
                ErrorKind::Semantic,
                format!("'{}' is already defined", self.interner.resolve(name)),
            ));
        }
        Ok(())
    }

    /// Parses `type name, type name, ..., ...)` after the opening bracket.
    /// Parameter names are optional in prototypes; unnamed parameters get
    /// generated names.
    pub(crate) fn parse_parameter_list(
        &mut self,
        c: &mut Cursor,
    ) -> Result<(Vec<(StrId, TypeId)>, bool)> {
        let mut params = Vec::new();
        let mut varargs = false;
        if self.peek_token(c)?.token == Token::CloseBracket {
            self.get_token(c)?;
            return Ok((params, varargs));
        }
        loop {
            if self.peek_token(c)?.token == Token::Ellipsis {
                self.get_token(c)?;
                varargs = true;
                break;
            }
            let (typ, name, _) = self.type_parse(c)?;
            if self.types.node(typ).base == BaseKind::Void && name.is_none() {
                // f(void) style empty parameter list
                break;
            }
            let name = match name {
                Some(n) => n,
                None => {
                    let generated = format!("__param{}", params.len());
                    self.interner.intern(&generated)
                }
            };
            params.push((name, typ));
            match self.get_token(c)?.token {
                Token::Comma => continue,
                Token::CloseBracket => return Ok((params, varargs)),
                other => {
                    return Err(c.fail(
                        ErrorKind::Syntax,
                        format!("expected ',' or ')', found {}", other),
                    ))
                }
            }
        }
        self.expect_token(c, Token::CloseBracket)?;
        Ok((params, varargs))
    }

    pub(crate) fn function_def(&self, c: &Cursor, value: &Value) -> Result<FuncDef> {
        let id = Scalar::load(&self.arena, BaseKind::Function, value.addr)
            .map_err(|e| self.mem_fail(c, e))?
            .as_int() as usize;
        self.functions
            .get(id)
            .cloned()
            .ok_or_else(|| c.fail(ErrorKind::Semantic, "unknown function"))
    }

    pub(crate) fn macro_def(&self, c: &Cursor, value: &Value) -> Result<MacroDef> {
        let id = Scalar::load(&self.arena, BaseKind::Macro, value.addr)
            .map_err(|e| self.mem_fail(c, e))?
            .as_int() as usize;
        self.macros
            .get(id)
            .cloned()
            .ok_or_else(|| c.fail(ErrorKind::Semantic, "unknown macro"))
    }

    /// Binds a macro definition into the global scope.
    pub(crate) fn define_macro(&mut self, c: &mut Cursor, name: StrId, def: MacroDef) -> Result<()> {
        let macro_id = self.macros.len() as u64;
        self.macros.push(def);
        let value = self.alloc_value(c, self.types.macro_t, false, true)?;
        Scalar::store_int(&mut self.arena, BaseKind::Macro, value.addr, macro_id as i64)
            .map_err(|e| self.mem_fail(c, e))?;
        if !self
            .globals
            .define(name, crate::symbols::Slot { value, decl: None })
        {
            return Err(c.fail(
                ErrorKind::Semantic,
                format!("'{}' is already defined", self.interner.resolve(name)),
            ));
        }
        Ok(())
    }
}
