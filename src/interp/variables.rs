//! Variable storage and lookup.
//!
//! Globals and statics live on the arena heap; locals and expression
//! temporaries live on the arena stack inside the current frame. A
//! `static` local is redirected into the global scope under the mangled
//! name `/file/function/name` and aliased locally, so it survives calls
//! while staying locally nameable.

use crate::error::{ErrorKind, Result};
use crate::interp::Interpreter;
use crate::lexer::cursor::Cursor;
use crate::memory::scalar::Scalar;
use crate::memory::value::{Storage, Value};
use crate::symbols::{DeclSite, Slot, StrId};
use crate::types::{BaseKind, TypeId};

impl Interpreter {
    /// Allocates zeroed payload storage for a value of the given type.
    /// Stack allocations come from the current frame and die with it.
    pub(crate) fn alloc_value(
        &mut self,
        c: &Cursor,
        typ: TypeId,
        is_lvalue: bool,
        on_heap: bool,
    ) -> Result<Value> {
        let size = self
            .types
            .type_size(typ, self.types.node(typ).array_len, false);
        let (addr, storage) = if on_heap {
            let addr = self
                .arena
                .alloc_heap(size)
                .map_err(|e| self.mem_fail(c, e))?;
            (addr, Storage::Heap)
        } else {
            let region = self
                .arena
                .alloc_stack(size)
                .ok_or_else(|| c.fail(ErrorKind::Resource, "out of stack memory"))?;
            (region.addr, Storage::Stack)
        };
        Ok(Value::new(typ, addr, is_lvalue, storage))
    }

    /// Compact byte size of a value's payload, honoring its array length.
    pub(crate) fn value_size(&self, v: &Value) -> usize {
        self.types
            .type_size(v.typ, self.types.node(v.typ).array_len, true)
    }

    /// Copies a value's payload bytes into `dest_addr`.
    pub(crate) fn copy_payload(&mut self, c: &Cursor, dest_addr: u64, src: &Value) -> Result<()> {
        let size = self.value_size(src);
        self.arena
            .copy(src.addr, dest_addr, size)
            .map_err(|e| self.mem_fail(c, e))
    }

    /// Active-frame-first name resolution.
    pub(crate) fn lookup(&self, name: StrId) -> Option<&Slot> {
        if let Some(frame) = self.call_frames.last() {
            if let Some(slot) = frame.locals.get(name) {
                return Some(slot);
            }
        }
        self.globals.get(name)
    }

    pub(crate) fn variable_get(&self, c: &Cursor, name: StrId) -> Result<Slot> {
        self.lookup(name).copied().ok_or_else(|| {
            c.fail(
                ErrorKind::Semantic,
                format!("'{}' is undefined", self.interner.resolve(name)),
            )
        })
    }

    /// Defines a variable in the innermost scope, allocating its storage.
    pub(crate) fn variable_define(
        &mut self,
        c: &Cursor,
        name: StrId,
        typ: TypeId,
        writable: bool,
        decl: Option<DeclSite>,
    ) -> Result<Value> {
        let on_heap = self.call_frames.is_empty();
        let value = self.alloc_value(c, typ, writable, on_heap)?;
        let scope = match self.call_frames.last_mut() {
            Some(frame) => &mut frame.locals,
            None => &mut self.globals,
        };
        if !scope.define(name, Slot { value, decl }) {
            return Err(c.fail(
                ErrorKind::Semantic,
                format!("'{}' is already defined", self.interner.resolve(name)),
            ));
        }
        Ok(value)
    }

    /// Defines a local alias without fresh storage, e.g. the local name of
    /// a static.
    fn define_alias(&mut self, c: &Cursor, name: StrId, value: Value) -> Result<()> {
        let scope = match self.call_frames.last_mut() {
            Some(frame) => &mut frame.locals,
            None => return Ok(()),
        };
        if !scope.define(name, Slot { value, decl: None }) {
            return Err(c.fail(
                ErrorKind::Semantic,
                format!("'{}' is already defined", self.interner.resolve(name)),
            ));
        }
        Ok(())
    }

    /// Declaration-time define that tolerates scanning the same
    /// declaration twice: re-declaring at the identical source position
    /// returns the existing binding untouched.
    pub(crate) fn variable_define_but_ignore_identical(
        &mut self,
        c: &Cursor,
        name: StrId,
        typ: TypeId,
        is_static: bool,
        decl: DeclSite,
    ) -> Result<Value> {
        if is_static && !self.call_frames.is_empty() {
            let mangled = {
                let file = self.interner.resolve(decl.file);
                let func = self
                    .current_function()
                    .map(|f| self.interner.resolve(f))
                    .unwrap_or("");
                let plain = self.interner.resolve(name);
                format!("/{}/{}/{}", file, func, plain)
            };
            let mangled = self.interner.intern(&mangled);
            if let Some(existing) = self.globals.get(mangled) {
                if existing.decl == Some(decl) {
                    let value = existing.value;
                    self.define_alias(c, name, value)?;
                    return Ok(value);
                }
                return Err(c.fail(
                    ErrorKind::Semantic,
                    format!("'{}' is already defined", self.interner.resolve(name)),
                ));
            }
            let value = self.alloc_value(c, typ, true, true)?;
            self.globals.define(
                mangled,
                Slot {
                    value,
                    decl: Some(decl),
                },
            );
            self.define_alias(c, name, value)?;
            return Ok(value);
        }
        let scope = match self.call_frames.last() {
            Some(frame) => &frame.locals,
            None => &self.globals,
        };
        if let Some(existing) = scope.get(name) {
            if existing.decl == Some(decl) {
                return Ok(existing.value);
            }
        }
        self.variable_define(c, name, typ, true, Some(decl))
    }

    /// The pointer value for a string literal, materializing its backing
    /// char array in the heap on first use. Identical literals share one
    /// array.
    pub(crate) fn string_literal_value(&mut self, c: &Cursor, text: StrId) -> Result<Value> {
        if let Some(value) = self.string_literals.get(&text) {
            return Ok(*value);
        }
        let bytes = self.interner.resolve(text).as_bytes().to_vec();
        let array_addr = self
            .arena
            .alloc_heap(bytes.len() + 1)
            .map_err(|e| self.mem_fail(c, e))?;
        self.arena
            .write_bytes(array_addr, &bytes)
            .map_err(|e| self.mem_fail(c, e))?;
        let payload = self
            .arena
            .alloc_heap(crate::types::POINTER_SIZE)
            .map_err(|e| self.mem_fail(c, e))?;
        Scalar::store_pointer(&mut self.arena, payload, array_addr)
            .map_err(|e| self.mem_fail(c, e))?;
        let value = Value::new(self.types.char_ptr_t, payload, false, Storage::Heap);
        self.string_literals.insert(text, value);
        Ok(value)
    }

    /// Follows a pointer value to the storage it addresses. The result
    /// aliases that storage and is writable.
    pub(crate) fn dereference(&self, c: &Cursor, ptr: &Value) -> Result<Value> {
        let node = self.types.node(ptr.typ);
        if node.base != BaseKind::Pointer {
            return Err(c.fail(ErrorKind::Semantic, "pointer expected"));
        }
        let target = match Scalar::load(&self.arena, BaseKind::Pointer, ptr.addr)
            .map_err(|e| self.mem_fail(c, e))?
        {
            Scalar::Pointer(addr) => addr,
            _ => unreachable!("pointer kind always loads a pointer scalar"),
        };
        if target == 0 {
            return Err(c.fail(ErrorKind::Semantic, "NULL pointer dereference"));
        }
        let pointee = node.from.expect("pointer types always have a pointee");
        Ok(Value::new(pointee, target, true, Storage::Borrowed))
    }
}
