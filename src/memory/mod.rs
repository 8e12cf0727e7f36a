//! Memory model: the shared stack/heap arena, scalar codec, and value
//! descriptors.

pub mod arena;
pub mod scalar;
pub mod value;

pub use arena::{Addr, Arena, ArenaError, StackRegion, MEM_ALIGN};
pub use scalar::Scalar;
pub use value::{Storage, Value};
