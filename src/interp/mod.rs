//! The interpreter instance.
//!
//! [`Interpreter`] owns every table the core needs: the arena, the type
//! graph, the interner, the global scope, call frames, and the function
//! and macro definition lists. Instances are independent; a host may run
//! several in one process.

pub mod natives;
pub mod preproc;
pub mod run;
pub mod variables;

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{ErrorKind, EvalError, Result};
use crate::lexer::cursor::Cursor;
use crate::memory::arena::{Addr, Arena, ArenaError};
use crate::memory::value::Value;
use crate::symbols::{Interner, StrId, SymbolMap};
use crate::types::TypeRegistry;

pub use natives::{FuncDef, MacroDef, NativeFn, StatementRunner};

/// Default arena capacity for hosts that don't care: 256 KiB shared
/// between stack and heap.
pub const DEFAULT_ARENA_BYTES: usize = 256 * 1024;

/// One function or macro activation: a name for diagnostics and static
/// mangling, plus the local scope.
#[derive(Debug)]
pub struct CallFrame {
    pub name: StrId,
    pub locals: SymbolMap,
}

pub struct Interpreter {
    pub(crate) interner: Interner,
    pub(crate) types: TypeRegistry,
    pub(crate) arena: Arena,
    pub(crate) globals: SymbolMap,
    pub(crate) call_frames: Vec<CallFrame>,
    pub(crate) functions: Vec<FuncDef>,
    pub(crate) macros: Vec<MacroDef>,
    /// Interned string literal -> its materialized pointer value.
    pub(crate) string_literals: FxHashMap<StrId, Value>,
    pub(crate) executor: Option<Rc<dyn StatementRunner>>,
    temp_name_count: u32,
}

impl Interpreter {
    pub fn new(arena_bytes: usize) -> Self {
        Interpreter {
            interner: Interner::new(),
            types: TypeRegistry::new(),
            arena: Arena::new(arena_bytes),
            globals: SymbolMap::new(),
            call_frames: Vec::new(),
            functions: Vec::new(),
            macros: Vec::new(),
            string_literals: FxHashMap::default(),
            executor: None,
            temp_name_count: 0,
        }
    }

    /// Installs the out-of-scope statement executor used to run bodies of
    /// interpreted (non-native) functions.
    pub fn set_statement_runner(&mut self, runner: Rc<dyn StatementRunner>) {
        self.executor = Some(runner);
    }

    pub fn interner_mut(&mut self) -> &mut Interner {
        &mut self.interner
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Generated name for anonymous struct/union/enum types.
    pub(crate) fn make_temp_name(&mut self, kind: char) -> StrId {
        let name = format!("^{}{:04}", kind, self.temp_name_count);
        self.temp_name_count += 1;
        self.interner.intern(&name)
    }

    /// Attaches the cursor's position to an arena failure.
    pub(crate) fn mem_fail(&self, c: &Cursor, err: ArenaError) -> EvalError {
        let kind = ErrorKind::Resource;
        match err {
            ArenaError::OutOfMemory => c.fail(kind, "out of memory"),
            ArenaError::ImbalancedPop => c.fail(kind, "stack is corrupt"),
            ArenaError::NoFrame => c.fail(kind, "no stack frame"),
            ArenaError::BadAddress(addr) => {
                c.fail(kind, format!("invalid address 0x{:x}", addr))
            }
        }
    }

    pub(crate) fn current_function(&self) -> Option<StrId> {
        self.call_frames.last().map(|f| f.name)
    }

    /// Address of a value's payload, for diagnostics and tests.
    pub fn value_addr(&self, v: &Value) -> Addr {
        v.addr
    }

    /// Reads a value's scalar payload. Host-facing, for native callbacks
    /// reading their arguments.
    pub fn read_scalar(&self, v: &Value) -> Result<crate::memory::scalar::Scalar> {
        let base = self.types.node(v.typ).base;
        crate::memory::scalar::Scalar::load(&self.arena, base, v.addr)
            .map_err(|_| EvalError::bare(ErrorKind::Semantic, "value has no scalar payload"))
    }

    /// Writes an integer into a value's payload, truncating to the slot's
    /// width. Host-facing, for native callbacks filling their return slot.
    pub fn write_int(&mut self, v: &Value, n: i64) -> Result<()> {
        let base = self.types.node(v.typ).base;
        crate::memory::scalar::Scalar::store_int(&mut self.arena, base, v.addr, n)
            .map_err(|_| EvalError::bare(ErrorKind::Semantic, "value has no scalar payload"))
    }

    /// Writes a float into a value's payload.
    pub fn write_fp(&mut self, v: &Value, n: f64) -> Result<()> {
        if self.types.node(v.typ).base != crate::types::BaseKind::Fp {
            return Err(EvalError::bare(ErrorKind::Semantic, "slot is not a float"));
        }
        crate::memory::scalar::Scalar::store_fp(&mut self.arena, v.addr, n)
            .map_err(|_| EvalError::bare(ErrorKind::Semantic, "value has no scalar payload"))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new(DEFAULT_ARENA_BYTES)
    }
}
