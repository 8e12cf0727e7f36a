//! Expression evaluation.
//!
//! The evaluator is a single-pass operator-precedence parser over the
//! preprocessed token stream. Values and operators interleave on a flat
//! stack; collapsing the stack runs the operators in precedence order.

pub mod ops;
pub mod parse;
pub mod precedence;
pub mod stack;

pub use precedence::{BRACKET_PRECEDENCE, DEEP_PRECEDENCE};
