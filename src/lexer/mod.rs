//! Token source: scanner, token definitions, and the parse cursor.

pub mod cursor;
pub mod scan;
pub mod token;

pub use cursor::{Cursor, RunMode};
pub use scan::tokenize;
pub use token::{Spanned, Token, TokenBuffer};
