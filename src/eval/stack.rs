//! The expression stack.
//!
//! A flat vector of tagged entries, either a value or an operator with its
//! resolved precedence and evaluation order. The collapse loop in the
//! parser reduces runs of entries from the top; the stack itself only
//! provides the mechanics.

use crate::lexer::token::Token;
use crate::memory::value::Value;

/// How an operator combines with its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Prefix,
    Postfix,
    Infix,
}

#[derive(Debug, Clone, Copy)]
pub enum Entry {
    Value(Value),
    Operator {
        op: Token,
        order: Order,
        precedence: i32,
    },
}

#[derive(Debug, Default)]
pub struct ExprStack {
    entries: Vec<Entry>,
}

impl ExprStack {
    pub fn new() -> Self {
        ExprStack::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_value(&mut self, value: Value) {
        self.entries.push(Entry::Value(value));
    }

    pub fn push_operator(&mut self, op: Token, order: Order, precedence: i32) {
        self.entries.push(Entry::Operator {
            op,
            order,
            precedence,
        });
    }

    pub fn top(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn get(&self, index: usize) -> &Entry {
        &self.entries[index]
    }

    pub fn pop(&mut self) -> Option<Entry> {
        self.entries.pop()
    }

    /// Pops the top entry, which must be a value.
    pub fn pop_value(&mut self) -> Option<Value> {
        match self.entries.pop() {
            Some(Entry::Value(v)) => Some(v),
            Some(other) => {
                self.entries.push(other);
                None
            }
            None => None,
        }
    }

    /// The operator the next collapse step would run: the top entry if it
    /// is an operator, otherwise the entry just below the top value.
    pub fn top_operator_index(&self) -> Option<usize> {
        match self.entries.last()? {
            Entry::Operator { .. } => Some(self.entries.len() - 1),
            Entry::Value(_) => {
                if self.entries.len() >= 2 {
                    Some(self.entries.len() - 2)
                } else {
                    None
                }
            }
        }
    }
}
