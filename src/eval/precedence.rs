//! The operator-precedence table.
//!
//! Each operator carries independent prefix, postfix, and infix precedence
//! numbers; zero means the operator cannot appear in that position.
//! Assignment (2) and the unary level (14) bind right-to-left, everything
//! else left-to-right. Brackets add a large boost so bracketed
//! sub-expressions always resolve before combining with the outside.

use crate::lexer::token::Token;

/// Precedence added for each open bracket depth.
pub const BRACKET_PRECEDENCE: i32 = 20;

/// A watermark no real operator reaches; "not ignoring anything".
pub const DEEP_PRECEDENCE: i32 = BRACKET_PRECEDENCE * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpPrecedence {
    pub prefix: i32,
    pub postfix: i32,
    pub infix: i32,
}

const fn op(prefix: i32, postfix: i32, infix: i32) -> OpPrecedence {
    OpPrecedence {
        prefix,
        postfix,
        infix,
    }
}

/// Precedence entry for a token, or `None` if it is not an operator.
pub fn precedence_of(token: &Token) -> Option<OpPrecedence> {
    Some(match token {
        Token::Assign
        | Token::AddAssign
        | Token::SubAssign
        | Token::MulAssign
        | Token::DivAssign
        | Token::ModAssign
        | Token::ShlAssign
        | Token::ShrAssign
        | Token::AndAssign
        | Token::OrAssign
        | Token::XorAssign => op(0, 0, 2),
        Token::Question | Token::Colon => op(0, 0, 3),
        Token::LogicalOr => op(0, 0, 4),
        Token::LogicalAnd => op(0, 0, 5),
        Token::BitOr => op(0, 0, 6),
        Token::BitXor => op(0, 0, 7),
        Token::Ampersand => op(14, 0, 8),
        Token::Equal | Token::NotEqual => op(0, 0, 9),
        Token::LessThan | Token::GreaterThan | Token::LessEqual | Token::GreaterEqual => {
            op(0, 0, 10)
        }
        Token::ShiftLeft | Token::ShiftRight => op(0, 0, 11),
        Token::Plus | Token::Minus => op(14, 0, 12),
        Token::Star => op(14, 0, 13),
        Token::Slash | Token::Percent => op(0, 0, 13),
        Token::Increment | Token::Decrement => op(14, 15, 0),
        Token::Not | Token::Tilde | Token::Sizeof | Token::Cast => op(14, 0, 0),
        Token::LeftSquare => op(0, 0, 15),
        Token::RightSquare => op(0, 15, 0),
        Token::Dot | Token::Arrow => op(0, 0, 15),
        Token::OpenBracket => op(15, 0, 0),
        Token::CloseBracket => op(0, 15, 0),
        _ => return None,
    })
}

/// Equal-precedence chains evaluate left-first except at the assignment
/// and unary levels, which chain right-first.
pub fn is_left_to_right(precedence: i32) -> bool {
    precedence != 2 && precedence != 14
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let add = precedence_of(&Token::Plus).unwrap();
        let mul = precedence_of(&Token::Star).unwrap();
        assert!(mul.infix > add.infix);
    }

    #[test]
    fn assignment_and_unary_are_right_to_left() {
        assert!(!is_left_to_right(precedence_of(&Token::Assign).unwrap().infix));
        assert!(!is_left_to_right(precedence_of(&Token::Minus).unwrap().prefix));
        assert!(is_left_to_right(precedence_of(&Token::Plus).unwrap().infix));
    }

    #[test]
    fn separators_are_not_operators() {
        assert!(precedence_of(&Token::Comma).is_none());
        assert!(precedence_of(&Token::Semicolon).is_none());
        assert!(precedence_of(&Token::Eof).is_none());
    }
}
