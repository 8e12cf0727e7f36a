//! String interning and symbol scopes.
//!
//! Every identifier and string literal is interned once per interpreter
//! instance; a [`StrId`] is a cheap copyable handle and id equality is
//! string equality. Symbol scopes map interned names to bound values and
//! remember the declaration site so idempotent re-scans of the same
//! declaration are tolerated.

use rustc_hash::FxHashMap;

use crate::error::Position;
use crate::memory::value::Value;

/// Handle to an interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrId(u32);

/// Instance-owned intern table.
#[derive(Debug, Default)]
pub struct Interner {
    map: FxHashMap<Box<str>, StrId>,
    strings: Vec<Box<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Interner::default()
    }

    pub fn intern(&mut self, text: &str) -> StrId {
        if let Some(&id) = self.map.get(text) {
            return id;
        }
        let id = StrId(self.strings.len() as u32);
        let boxed: Box<str> = text.into();
        self.strings.push(boxed.clone());
        self.map.insert(boxed, id);
        id
    }

    pub fn resolve(&self, id: StrId) -> &str {
        &self.strings[id.0 as usize]
    }
}

/// Where a binding was declared, for the re-declaration tolerance rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclSite {
    pub file: StrId,
    pub pos: Position,
}

/// One bound name: the value plus its declaration site, when known.
#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub value: Value,
    pub decl: Option<DeclSite>,
}

/// A single scope's name bindings: the global scope, one per call frame,
/// and one per struct/union member table client.
#[derive(Debug, Default)]
pub struct SymbolMap {
    map: FxHashMap<StrId, Slot>,
}

impl SymbolMap {
    pub fn new() -> Self {
        SymbolMap::default()
    }

    /// Inserts a binding. Returns `false` if the name was already bound
    /// (the existing binding is left untouched).
    pub fn define(&mut self, name: StrId, slot: Slot) -> bool {
        use std::collections::hash_map::Entry;
        match self.map.entry(name) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                v.insert(slot);
                true
            }
        }
    }

    pub fn get(&self, name: StrId) -> Option<&Slot> {
        self.map.get(&name)
    }

    pub fn contains(&self, name: StrId) -> bool {
        self.map.contains_key(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn interning_is_idempotent() {
        let mut interner = Interner::new();
        let a = interner.intern("count");
        let b = interner.intern("count");
        let c = interner.intern("Count");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(a), "count");
    }

    #[test]
    fn define_rejects_duplicates() {
        let mut interner = Interner::new();
        let name = interner.intern("x");
        let mut scope = SymbolMap::new();
        let slot = Slot {
            value: Value::default(),
            decl: None,
        };
        assert!(scope.define(name, slot));
        assert!(!scope.define(name, slot));
    }
}
