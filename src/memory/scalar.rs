//! Scalar load/store and numeric coercion.
//!
//! Payloads in the arena are raw little-endian bytes; a [`Scalar`] is the
//! typed view read out of (or written into) a payload according to the
//! value's base kind. Widening accessors mirror the language's implicit
//! coercions: any integer widens to a signed or unsigned word, anything
//! numeric widens to float.

use crate::memory::arena::{Addr, Arena, ArenaError};
use crate::types::BaseKind;

/// A scalar read from arena storage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Char(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    UnsignedShort(u16),
    UnsignedInt(u32),
    UnsignedLong(u64),
    Fp(f64),
    Pointer(Addr),
}

impl Scalar {
    /// Widens to a signed word. Pointers coerce to their address;
    /// characters are unsigned.
    pub fn as_int(&self) -> i64 {
        match *self {
            Scalar::Char(v) => v as i64,
            Scalar::Short(v) => v as i64,
            Scalar::Int(v) => v as i64,
            Scalar::Long(v) => v,
            Scalar::UnsignedShort(v) => v as i64,
            Scalar::UnsignedInt(v) => v as i64,
            Scalar::UnsignedLong(v) => v as i64,
            Scalar::Fp(v) => v as i64,
            Scalar::Pointer(v) => v as i64,
        }
    }

    pub fn as_unsigned(&self) -> u64 {
        match *self {
            Scalar::Char(v) => v as u64,
            Scalar::Short(v) => v as u64,
            Scalar::Int(v) => v as u64,
            Scalar::Long(v) => v as u64,
            Scalar::UnsignedShort(v) => v as u64,
            Scalar::UnsignedInt(v) => v as u64,
            Scalar::UnsignedLong(v) => v,
            Scalar::Fp(v) => v as u64,
            Scalar::Pointer(v) => v,
        }
    }

    pub fn as_fp(&self) -> f64 {
        match *self {
            Scalar::Fp(v) => v,
            other => other.as_int() as f64,
        }
    }

    /// Reads a scalar of the given base kind from the arena.
    pub fn load(arena: &Arena, kind: BaseKind, addr: Addr) -> Result<Scalar, ArenaError> {
        fn read<const N: usize>(arena: &Arena, addr: Addr) -> Result<[u8; N], ArenaError> {
            let mut buf = [0u8; N];
            buf.copy_from_slice(arena.bytes(addr, N)?);
            Ok(buf)
        }
        Ok(match kind {
            BaseKind::Char => Scalar::Char(read::<1>(arena, addr)?[0]),
            BaseKind::Short => Scalar::Short(i16::from_le_bytes(read(arena, addr)?)),
            BaseKind::Int | BaseKind::Enum => Scalar::Int(i32::from_le_bytes(read(arena, addr)?)),
            // definition indices live in word-sized slots
            BaseKind::Long | BaseKind::Function | BaseKind::Macro => {
                Scalar::Long(i64::from_le_bytes(read(arena, addr)?))
            }
            BaseKind::UnsignedShort => {
                Scalar::UnsignedShort(u16::from_le_bytes(read(arena, addr)?))
            }
            BaseKind::UnsignedInt => Scalar::UnsignedInt(u32::from_le_bytes(read(arena, addr)?)),
            BaseKind::UnsignedLong => Scalar::UnsignedLong(u64::from_le_bytes(read(arena, addr)?)),
            BaseKind::Fp => Scalar::Fp(f64::from_le_bytes(read(arena, addr)?)),
            BaseKind::Pointer => Scalar::Pointer(u64::from_le_bytes(read(arena, addr)?)),
            _ => return Err(ArenaError::BadAddress(addr)),
        })
    }

    /// Stores an integer into a slot of the given base kind, truncating to
    /// the destination width.
    pub fn store_int(
        arena: &mut Arena,
        kind: BaseKind,
        addr: Addr,
        value: i64,
    ) -> Result<(), ArenaError> {
        match kind {
            BaseKind::Char => arena.write_bytes(addr, &[value as u8]),
            BaseKind::Short => arena.write_bytes(addr, &(value as i16).to_le_bytes()),
            BaseKind::Int | BaseKind::Enum => arena.write_bytes(addr, &(value as i32).to_le_bytes()),
            BaseKind::Long | BaseKind::Function | BaseKind::Macro => {
                arena.write_bytes(addr, &value.to_le_bytes())
            }
            BaseKind::UnsignedShort => arena.write_bytes(addr, &(value as u16).to_le_bytes()),
            BaseKind::UnsignedInt => arena.write_bytes(addr, &(value as u32).to_le_bytes()),
            BaseKind::UnsignedLong | BaseKind::Pointer => {
                arena.write_bytes(addr, &(value as u64).to_le_bytes())
            }
            BaseKind::Fp => arena.write_bytes(addr, &(value as f64).to_le_bytes()),
            _ => Err(ArenaError::BadAddress(addr)),
        }
    }

    pub fn store_fp(arena: &mut Arena, addr: Addr, value: f64) -> Result<(), ArenaError> {
        arena.write_bytes(addr, &value.to_le_bytes())
    }

    pub fn store_pointer(arena: &mut Arena, addr: Addr, target: Addr) -> Result<(), ArenaError> {
        arena.write_bytes(addr, &target.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn store_truncates_to_destination_width() {
        let mut arena = Arena::new(256);
        let slot = arena.alloc_stack(8).unwrap();
        Scalar::store_int(&mut arena, BaseKind::Char, slot.addr, 0x1_41).unwrap();
        assert_eq!(
            Scalar::load(&arena, BaseKind::Char, slot.addr).unwrap(),
            Scalar::Char(0x41)
        );
    }

    #[test]
    fn definition_indices_round_trip_as_words() {
        let mut arena = Arena::new(256);
        let slot = arena.alloc_stack(8).unwrap();
        Scalar::store_int(&mut arena, BaseKind::Function, slot.addr, 3).unwrap();
        assert_eq!(
            Scalar::load(&arena, BaseKind::Function, slot.addr).unwrap(),
            Scalar::Long(3)
        );
        Scalar::store_int(&mut arena, BaseKind::Macro, slot.addr, 7).unwrap();
        assert_eq!(
            Scalar::load(&arena, BaseKind::Macro, slot.addr).unwrap(),
            Scalar::Long(7)
        );
    }

    #[test]
    fn char_widens_unsigned() {
        assert_eq!(Scalar::Char(0xff).as_int(), 255);
    }

    #[test]
    fn fp_round_trips() {
        let mut arena = Arena::new(256);
        let slot = arena.alloc_stack(8).unwrap();
        Scalar::store_fp(&mut arena, slot.addr, -2.5).unwrap();
        let v = Scalar::load(&arena, BaseKind::Fp, slot.addr).unwrap();
        assert_eq!(v, Scalar::Fp(-2.5));
        assert_eq!(v.as_int(), -2);
    }
}
