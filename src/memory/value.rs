//! Value descriptors.
//!
//! A [`Value`] never owns its bytes; it names a typed span of arena
//! storage. Values allocated on the evaluation stack die with the frame
//! they were pushed in, so a descriptor must not be kept across a frame
//! pop.

use crate::memory::arena::Addr;
use crate::types::TypeId;

/// Where a value's payload lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Storage {
    /// Transient evaluation storage, freed with the enclosing frame.
    #[default]
    Stack,
    /// Long-lived storage: globals, statics, string literals.
    Heap,
    /// An alias into storage owned by another value, e.g. the result of a
    /// dereference or member access.
    Borrowed,
}

/// A typed reference to arena storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Value {
    pub typ: TypeId,
    pub addr: Addr,
    /// Whether assignment through this value is legal. Constants and
    /// intermediate results are not lvalues.
    pub is_lvalue: bool,
    pub storage: Storage,
}

impl Value {
    pub fn new(typ: TypeId, addr: Addr, is_lvalue: bool, storage: Storage) -> Self {
        Value {
            typ,
            addr,
            is_lvalue,
            storage,
        }
    }

    /// An alias of this value's storage that keeps the lvalue flag.
    pub fn alias(&self) -> Value {
        Value {
            storage: Storage::Borrowed,
            ..*self
        }
    }
}
