//! The interned type graph.
//!
//! Every type is a node owned by the [`TypeRegistry`] and addressed by a
//! [`TypeId`]. Derived types (pointer-to, array-of, named struct/union/
//! enum) are deduplicated through a structural-key map, so requesting the
//! same derivation twice returns the same id and type identity stays a
//! plain id comparison.
//!
//! Sizes use a fixed machine model: char 1, short 2, int 4, long 8,
//! double 8, pointer 8. `type_size` reports a full machine word for
//! integer types unless asked for the compact (declared) size; compact
//! sizes drive struct layout and byte-copy assignment.

pub mod parse;

use rustc_hash::FxHashMap;

use crate::symbols::{Interner, StrId};

pub const WORD_SIZE: usize = 8;
pub const POINTER_SIZE: usize = 8;

/// Handle to a node in the type graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeId(u32);

impl TypeId {
    /// Raw handle value, for storing a type in a value payload (`sizeof`
    /// operands, casts, typedefs).
    pub fn to_raw(self) -> u32 {
        self.0
    }

    pub fn from_raw(raw: u32) -> TypeId {
        TypeId(raw)
    }
}

/// Fundamental kind of a type node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseKind {
    Void,
    Int,
    Short,
    Char,
    Long,
    UnsignedInt,
    UnsignedShort,
    UnsignedLong,
    Fp,
    Function,
    Macro,
    Pointer,
    Array,
    Struct,
    Union,
    Enum,
    /// A type used as a value, e.g. the operand of `sizeof` or a cast.
    Type,
}

/// One member of a struct or union.
#[derive(Debug, Clone, Copy)]
pub struct Member {
    pub typ: TypeId,
    pub offset: usize,
}

/// Member table for struct/union nodes: lookup map plus declaration order.
#[derive(Debug, Default)]
pub struct MemberTable {
    order: Vec<StrId>,
    map: FxHashMap<StrId, Member>,
}

impl MemberTable {
    pub fn get(&self, name: StrId) -> Option<&Member> {
        self.map.get(&name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StrId, &Member)> {
        self.order.iter().map(move |n| (*n, &self.map[n]))
    }
}

/// A single node in the type graph.
#[derive(Debug)]
pub struct TypeNode {
    pub base: BaseKind,
    /// Parent in the derivation chain: pointee for pointers, element type
    /// for arrays.
    pub from: Option<TypeId>,
    pub array_len: usize,
    pub size: usize,
    pub align: usize,
    pub ident: Option<StrId>,
    pub members: Option<MemberTable>,
    /// A sealed struct/union has had its body parsed; re-declaring a body
    /// for it is an error.
    pub sealed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DerivedKey {
    parent: Option<TypeId>,
    base: BaseKind,
    array_len: usize,
    ident: Option<StrId>,
}

/// Instance-owned registry of every type node.
#[derive(Debug)]
pub struct TypeRegistry {
    nodes: Vec<TypeNode>,
    derived: FxHashMap<DerivedKey, TypeId>,
    pub void_t: TypeId,
    pub int_t: TypeId,
    pub short_t: TypeId,
    pub char_t: TypeId,
    pub long_t: TypeId,
    pub unsigned_int_t: TypeId,
    pub unsigned_short_t: TypeId,
    pub unsigned_long_t: TypeId,
    pub fp_t: TypeId,
    pub function_t: TypeId,
    pub macro_t: TypeId,
    pub type_t: TypeId,
    pub char_ptr_t: TypeId,
    pub void_ptr_t: TypeId,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut reg = TypeRegistry {
            nodes: Vec::new(),
            derived: FxHashMap::default(),
            void_t: TypeId(0),
            int_t: TypeId(0),
            short_t: TypeId(0),
            char_t: TypeId(0),
            long_t: TypeId(0),
            unsigned_int_t: TypeId(0),
            unsigned_short_t: TypeId(0),
            unsigned_long_t: TypeId(0),
            fp_t: TypeId(0),
            function_t: TypeId(0),
            macro_t: TypeId(0),
            type_t: TypeId(0),
            char_ptr_t: TypeId(0),
            void_ptr_t: TypeId(0),
        };
        reg.void_t = reg.add_base(BaseKind::Void, 0, 1);
        reg.int_t = reg.add_base(BaseKind::Int, 4, 4);
        reg.short_t = reg.add_base(BaseKind::Short, 2, 2);
        reg.char_t = reg.add_base(BaseKind::Char, 1, 1);
        reg.long_t = reg.add_base(BaseKind::Long, 8, 8);
        reg.unsigned_int_t = reg.add_base(BaseKind::UnsignedInt, 4, 4);
        reg.unsigned_short_t = reg.add_base(BaseKind::UnsignedShort, 2, 2);
        reg.unsigned_long_t = reg.add_base(BaseKind::UnsignedLong, 8, 8);
        reg.fp_t = reg.add_base(BaseKind::Fp, 8, 8);
        reg.function_t = reg.add_base(BaseKind::Function, WORD_SIZE, WORD_SIZE);
        reg.macro_t = reg.add_base(BaseKind::Macro, WORD_SIZE, WORD_SIZE);
        reg.type_t = reg.add_base(BaseKind::Type, WORD_SIZE, WORD_SIZE);
        reg.char_ptr_t = reg.derive(reg.char_t, BaseKind::Pointer, 0, None);
        reg.void_ptr_t = reg.derive(reg.void_t, BaseKind::Pointer, 0, None);
        reg
    }

    fn add_base(&mut self, base: BaseKind, size: usize, align: usize) -> TypeId {
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(TypeNode {
            base,
            from: None,
            array_len: 0,
            size,
            align,
            ident: None,
            members: None,
            sealed: true,
        });
        id
    }

    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.0 as usize]
    }

    /// Returns the derived type for (parent, kind, length, name), creating
    /// it on first request. Subsequent requests return the same id.
    pub fn derive(
        &mut self,
        parent: TypeId,
        base: BaseKind,
        array_len: usize,
        ident: Option<StrId>,
    ) -> TypeId {
        let key = DerivedKey {
            parent: Some(parent),
            base,
            array_len,
            ident,
        };
        if let Some(&id) = self.derived.get(&key) {
            return id;
        }
        let (size, align) = match base {
            BaseKind::Pointer => (POINTER_SIZE, POINTER_SIZE),
            BaseKind::Array => {
                let parent_node = self.node(parent);
                (parent_node.size * array_len, parent_node.align)
            }
            BaseKind::Enum => (4, 4),
            // struct/union sizes grow as members are added
            _ => (0, 1),
        };
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(TypeNode {
            base,
            from: Some(parent),
            array_len,
            size,
            align,
            ident,
            members: matches!(base, BaseKind::Struct | BaseKind::Union)
                .then(MemberTable::default),
            sealed: !matches!(base, BaseKind::Struct | BaseKind::Union),
        });
        self.derived.insert(key, id);
        id
    }

    pub fn pointer_to(&mut self, pointee: TypeId) -> TypeId {
        self.derive(pointee, BaseKind::Pointer, 0, None)
    }

    pub fn array_of(&mut self, element: TypeId, len: usize) -> TypeId {
        self.derive(element, BaseKind::Array, len, None)
    }

    /// Appends a member to an unsealed struct or union, returning its
    /// byte offset. Struct members are aligned to their own alignment and
    /// appended; union members all sit at offset 0 and the union grows to
    /// the widest member.
    pub fn add_member(
        &mut self,
        composite: TypeId,
        name: StrId,
        member_type: TypeId,
    ) -> Result<usize, String> {
        let member_size = self.type_size(member_type, self.node(member_type).array_len, true);
        let member_align = self.node(member_type).align;
        let is_union = self.node(composite).base == BaseKind::Union;
        let node = &mut self.nodes[composite.0 as usize];
        let members = node
            .members
            .as_mut()
            .ok_or_else(|| "member added to a non-composite type".to_string())?;
        if members.map.contains_key(&name) {
            return Err("duplicate member name".to_string());
        }
        let offset = if is_union {
            node.size = node.size.max(member_size);
            0
        } else {
            if node.size % member_align != 0 {
                node.size += member_align - node.size % member_align;
            }
            let at = node.size;
            node.size += member_size;
            at
        };
        node.align = node.align.max(member_align);
        members.order.push(name);
        members.map.insert(
            name,
            Member {
                typ: member_type,
                offset,
            },
        );
        Ok(offset)
    }

    /// Pads a struct/union up to its own alignment and marks its body as
    /// defined.
    pub fn seal_composite(&mut self, composite: TypeId) {
        let node = &mut self.nodes[composite.0 as usize];
        if node.align > 0 && node.size % node.align != 0 {
            node.size += node.align - node.size % node.align;
        }
        node.sealed = true;
    }

    /// Byte size of a type. Comfortable (non-compact) mode widens integer
    /// types to a machine word so stack slots share one footprint; compact
    /// mode reports the declared size.
    pub fn type_size(&self, id: TypeId, array_len: usize, compact: bool) -> usize {
        let node = self.node(id);
        if self.is_integer_numeric(id) && !compact {
            WORD_SIZE
        } else if node.base == BaseKind::Array {
            let element = node.from.map(|f| self.node(f).size).unwrap_or(0);
            element * array_len
        } else {
            node.size
        }
    }

    pub fn is_integer_numeric(&self, id: TypeId) -> bool {
        matches!(
            self.node(id).base,
            BaseKind::Int
                | BaseKind::Short
                | BaseKind::Char
                | BaseKind::Long
                | BaseKind::UnsignedInt
                | BaseKind::UnsignedShort
                | BaseKind::UnsignedLong
                | BaseKind::Enum
        )
    }

    pub fn is_numeric_coercible(&self, id: TypeId) -> bool {
        self.is_integer_numeric(id) || self.node(id).base == BaseKind::Fp
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        self.node(id).base == BaseKind::Pointer
    }

    /// Human-readable type name for diagnostics.
    pub fn describe(&self, id: TypeId, interner: &Interner) -> String {
        let node = self.node(id);
        match node.base {
            BaseKind::Void => "void".into(),
            BaseKind::Int => "int".into(),
            BaseKind::Short => "short".into(),
            BaseKind::Char => "char".into(),
            BaseKind::Long => "long".into(),
            BaseKind::UnsignedInt => "unsigned int".into(),
            BaseKind::UnsignedShort => "unsigned short".into(),
            BaseKind::UnsignedLong => "unsigned long".into(),
            BaseKind::Fp => "double".into(),
            BaseKind::Function => "function".into(),
            BaseKind::Macro => "macro".into(),
            BaseKind::Type => "type".into(),
            BaseKind::Pointer => match node.from {
                Some(p) => format!("pointer to {}", self.describe(p, interner)),
                None => "pointer".into(),
            },
            BaseKind::Array => match node.from {
                Some(p) => format!("{}[{}]", self.describe(p, interner), node.array_len),
                None => "array".into(),
            },
            BaseKind::Struct | BaseKind::Union | BaseKind::Enum => {
                let keyword = match node.base {
                    BaseKind::Struct => "struct",
                    BaseKind::Union => "union",
                    _ => "enum",
                };
                match node.ident {
                    Some(n) => format!("{} {}", keyword, interner.resolve(n)),
                    None => keyword.into(),
                }
            }
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        TypeRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn derived_types_are_interned() {
        let mut reg = TypeRegistry::new();
        let a = reg.pointer_to(reg.int_t);
        let b = reg.pointer_to(reg.int_t);
        assert_eq!(a, b);
        let c = reg.pointer_to(reg.char_t);
        assert_ne!(a, c);
    }

    #[test]
    fn pointer_size_independent_of_pointee() {
        let mut reg = TypeRegistry::new();
        let mut interner = Interner::new();
        let name = interner.intern("big");
        let s = reg.derive(reg.void_t, BaseKind::Struct, 0, Some(name));
        let x = interner.intern("x");
        reg.add_member(s, x, reg.long_t).unwrap();
        reg.seal_composite(s);
        let p1 = reg.pointer_to(s);
        let p2 = reg.pointer_to(reg.char_t);
        assert_eq!(reg.node(p1).size, POINTER_SIZE);
        assert_eq!(reg.node(p1).size, reg.node(p2).size);
    }

    #[test]
    fn array_size_scales_by_element() {
        let mut reg = TypeRegistry::new();
        let arr = reg.array_of(reg.int_t, 3);
        assert_eq!(reg.type_size(arr, 3, true), 12);
    }

    #[test]
    fn struct_layout_pads_between_and_after_members() {
        let mut reg = TypeRegistry::new();
        let mut interner = Interner::new();
        let name = interner.intern("rec");
        let s = reg.derive(reg.void_t, BaseKind::Struct, 0, Some(name));
        let a = interner.intern("a");
        let b = interner.intern("b");
        let c = interner.intern("c");
        assert_eq!(reg.add_member(s, a, reg.int_t).unwrap(), 0);
        assert_eq!(reg.add_member(s, b, reg.char_t).unwrap(), 4);
        assert_eq!(reg.add_member(s, c, reg.int_t).unwrap(), 8);
        reg.seal_composite(s);
        assert_eq!(reg.node(s).size, 12);
        assert_eq!(reg.node(s).align, 4);
    }

    #[test]
    fn union_members_share_offset_zero() {
        let mut reg = TypeRegistry::new();
        let mut interner = Interner::new();
        let name = interner.intern("mix");
        let u = reg.derive(reg.void_t, BaseKind::Union, 0, Some(name));
        let i = interner.intern("i");
        let l = interner.intern("l");
        let ch = interner.intern("c");
        assert_eq!(reg.add_member(u, i, reg.int_t).unwrap(), 0);
        assert_eq!(reg.add_member(u, l, reg.long_t).unwrap(), 0);
        assert_eq!(reg.add_member(u, ch, reg.char_t).unwrap(), 0);
        reg.seal_composite(u);
        assert_eq!(reg.node(u).size, 8);
    }

    #[test]
    fn comfortable_size_widens_integers_only() {
        let reg = TypeRegistry::new();
        assert_eq!(reg.type_size(reg.int_t, 0, false), WORD_SIZE);
        assert_eq!(reg.type_size(reg.int_t, 0, true), 4);
        assert_eq!(reg.type_size(reg.char_t, 0, true), 1);
        assert_eq!(reg.type_size(reg.fp_t, 0, false), 8);
    }
}
