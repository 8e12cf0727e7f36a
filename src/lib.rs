//! # Introduction
//!
//! Civet is an embeddable evaluation core for a small C-like procedural
//! language: pointers, fixed-width integers, doubles, arrays, structs,
//! unions, enums, function calls, and a textual macro preprocessor.
//! Source is scanned once into an execution-ready token stream and
//! evaluated directly, with no intermediate tree or bytecode.
//!
//! ## Evaluation pipeline
//!
//! ```text
//! Source → Lexer → Token buffer → Preprocessed cursor → Expression engine
//! ```
//!
//! 1. [`lexer`] — scans the source into a flat, position-annotated token
//!    buffer; [`lexer::cursor::Cursor`] walks it with rewind-by-clone and
//!    `#if` filtering state.
//! 2. [`types`] — the interned type graph: derived types are deduplicated
//!    so type identity is a handle comparison.
//! 3. [`memory`] — one arena per interpreter, stack growing up and heap
//!    growing down, with frame checkpoints for bulk release; values are
//!    typed descriptors over arena bytes.
//! 4. [`symbols`] — string interner plus the global and per-call symbol
//!    scopes.
//! 5. [`eval`] — the operator-precedence expression engine.
//! 6. [`interp`] — the [`interp::Interpreter`] instance tying it all
//!    together: variable definition, native registration, macros, and the
//!    top-level `run` driver.
//!
//! Statement execution (function bodies, control flow) is intentionally
//! out of scope; hosts plug it in through [`interp::StatementRunner`].

pub mod error;
pub mod eval;
pub mod interp;
pub mod lexer;
pub mod memory;
pub mod symbols;
pub mod types;

pub use error::{ErrorKind, EvalError, Position, Result};
pub use interp::{FuncDef, Interpreter, MacroDef, NativeFn, StatementRunner, DEFAULT_ARENA_BYTES};
pub use lexer::cursor::{Cursor, RunMode};
pub use lexer::scan::tokenize;
pub use memory::scalar::Scalar;
pub use memory::value::{Storage, Value};
pub use types::{BaseKind, TypeId, TypeRegistry};
