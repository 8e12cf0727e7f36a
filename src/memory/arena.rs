//! The shared stack/heap arena.
//!
//! One owned buffer serves both roles: the evaluation stack grows up from
//! the bottom and the long-lived heap grows down from the top. Stack
//! allocations are released in strict LIFO order, individually or in bulk
//! through frame checkpoints; heap allocations live for the instance's
//! lifetime. All addresses are byte offsets into the buffer, validated on
//! every access, and offset 0 is reserved so it can serve as the null
//! address.

use tracing::trace;

/// Byte offset into the arena. Offset 0 is never a valid allocation.
pub type Addr = u64;

/// Arena allocation granularity.
pub const MEM_ALIGN: usize = 8;

/// A stack allocation handle. Popping requires the handle back, so the
/// exact-match LIFO check is structural rather than caller arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackRegion {
    pub addr: Addr,
    pub size: usize,
}

/// Errors internal to the arena. The interpreter attaches positions and
/// converts these at its boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    #[error("out of memory")]
    OutOfMemory,
    #[error("stack pop does not match the most recent allocation")]
    ImbalancedPop,
    #[error("no stack frame to pop")]
    NoFrame,
    #[error("address 0x{0:x} is out of bounds")]
    BadAddress(Addr),
}

fn align_up(size: usize) -> usize {
    (size + MEM_ALIGN - 1) & !(MEM_ALIGN - 1)
}

#[derive(Debug)]
pub struct Arena {
    memory: Vec<u8>,
    stack_top: usize,
    heap_bottom: usize,
    frames: Vec<usize>,
}

impl Arena {
    pub fn new(capacity: usize) -> Self {
        let capacity = align_up(capacity.max(MEM_ALIGN * 4));
        Arena {
            memory: vec![0; capacity],
            // reserve offset 0 as the null address
            stack_top: MEM_ALIGN,
            heap_bottom: capacity,
            frames: Vec::new(),
        }
    }

    pub fn stack_top(&self) -> Addr {
        self.stack_top as Addr
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    /// Allocates zeroed space at the top of the stack. Returns `None` when
    /// the stack would collide with the heap; callers report that as stack
    /// overflow rather than aborting.
    pub fn alloc_stack(&mut self, size: usize) -> Option<StackRegion> {
        let aligned = align_up(size);
        let new_top = self.stack_top.checked_add(aligned)?;
        if new_top > self.heap_bottom {
            return None;
        }
        let addr = self.stack_top as Addr;
        self.memory[self.stack_top..new_top].fill(0);
        self.stack_top = new_top;
        Some(StackRegion { addr, size: aligned })
    }

    /// Releases the most recent stack allocation. The region must be the
    /// one on top; anything else signals corruption.
    pub fn pop_stack(&mut self, region: StackRegion) -> Result<(), ArenaError> {
        let aligned = align_up(region.size);
        if region.addr as usize + aligned != self.stack_top {
            return Err(ArenaError::ImbalancedPop);
        }
        self.stack_top = region.addr as usize;
        Ok(())
    }

    /// Records the current stack top; a later `pop_frame` releases
    /// everything allocated since.
    pub fn push_frame(&mut self) {
        trace!(top = self.stack_top, "push stack frame");
        self.frames.push(self.stack_top);
    }

    /// Bulk-frees back to the matching `push_frame` checkpoint.
    pub fn pop_frame(&mut self) -> Result<(), ArenaError> {
        let checkpoint = self.frames.pop().ok_or(ArenaError::NoFrame)?;
        trace!(top = self.stack_top, back_to = checkpoint, "pop stack frame");
        self.stack_top = checkpoint;
        Ok(())
    }

    /// Allocates zeroed long-lived space from the top of the arena. Heap
    /// space is never released before the arena is dropped.
    pub fn alloc_heap(&mut self, size: usize) -> Result<Addr, ArenaError> {
        let aligned = align_up(size);
        let new_bottom = self
            .heap_bottom
            .checked_sub(aligned)
            .ok_or(ArenaError::OutOfMemory)?;
        if new_bottom < self.stack_top {
            return Err(ArenaError::OutOfMemory);
        }
        self.heap_bottom = new_bottom;
        self.memory[new_bottom..new_bottom + aligned].fill(0);
        Ok(new_bottom as Addr)
    }

    fn check(&self, addr: Addr, len: usize) -> Result<usize, ArenaError> {
        let start = addr as usize;
        let end = start.checked_add(len).ok_or(ArenaError::BadAddress(addr))?;
        if start == 0 && len > 0 || end > self.memory.len() {
            return Err(ArenaError::BadAddress(addr));
        }
        Ok(start)
    }

    pub fn bytes(&self, addr: Addr, len: usize) -> Result<&[u8], ArenaError> {
        let start = self.check(addr, len)?;
        Ok(&self.memory[start..start + len])
    }

    pub fn bytes_mut(&mut self, addr: Addr, len: usize) -> Result<&mut [u8], ArenaError> {
        let start = self.check(addr, len)?;
        Ok(&mut self.memory[start..start + len])
    }

    pub fn write_bytes(&mut self, addr: Addr, data: &[u8]) -> Result<(), ArenaError> {
        self.bytes_mut(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// Copies `len` bytes from `src` to `dest` within the arena. The
    /// regions may overlap.
    pub fn copy(&mut self, src: Addr, dest: Addr, len: usize) -> Result<(), ArenaError> {
        let s = self.check(src, len)?;
        let d = self.check(dest, len)?;
        self.memory.copy_within(s..s + len, d);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn allocations_are_aligned_and_zeroed() {
        let mut arena = Arena::new(1024);
        let a = arena.alloc_stack(5).unwrap();
        assert_eq!(a.size, MEM_ALIGN);
        assert_eq!(arena.bytes(a.addr, 5).unwrap(), &[0u8; 5]);
        let b = arena.alloc_stack(3).unwrap();
        assert_eq!(b.addr, a.addr + MEM_ALIGN as Addr);
    }

    #[test]
    fn pop_requires_exact_lifo_order() {
        let mut arena = Arena::new(1024);
        let a = arena.alloc_stack(8).unwrap();
        let b = arena.alloc_stack(8).unwrap();
        assert_eq!(arena.pop_stack(a), Err(ArenaError::ImbalancedPop));
        arena.pop_stack(b).unwrap();
        arena.pop_stack(a).unwrap();
    }

    #[test]
    fn frames_restore_the_stack_top() {
        let mut arena = Arena::new(1024);
        let before = arena.stack_top();
        assert_eq!(arena.frame_depth(), 0);
        arena.push_frame();
        assert_eq!(arena.frame_depth(), 1);
        for _ in 0..4 {
            arena.alloc_stack(16).unwrap();
        }
        assert_ne!(arena.stack_top(), before);
        arena.pop_frame().unwrap();
        assert_eq!(arena.frame_depth(), 0);
        assert_eq!(arena.stack_top(), before);
    }

    #[test]
    fn popping_below_a_frame_is_rejected() {
        let mut arena = Arena::new(1024);
        let outer = arena.alloc_stack(8).unwrap();
        arena.push_frame();
        let _inner = arena.alloc_stack(8).unwrap();
        assert_eq!(arena.pop_stack(outer), Err(ArenaError::ImbalancedPop));
        arena.pop_frame().unwrap();
    }

    #[test]
    fn stack_overflow_returns_none() {
        let mut arena = Arena::new(64);
        assert!(arena.alloc_stack(4096).is_none());
    }

    #[test]
    fn heap_collision_is_an_error() {
        let mut arena = Arena::new(64);
        assert!(arena.alloc_heap(16).is_ok());
        assert_eq!(arena.alloc_heap(4096), Err(ArenaError::OutOfMemory));
    }

    #[test]
    fn null_address_is_never_readable() {
        let arena = Arena::new(64);
        assert!(arena.bytes(0, 1).is_err());
    }
}
