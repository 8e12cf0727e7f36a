//! Token definitions.
//!
//! Tokens are immutable records: a tag, an inline payload for
//! value-bearing tags, and (in the buffer) the source position they were
//! scanned at. The stream is flat; walking it twice re-derives the same
//! tokens.

use std::fmt;

use crate::error::Position;
use crate::symbols::StrId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    // literals and identifiers
    IntLit(i64),
    CharLit(u8),
    FpLit(f64),
    StrLit(StrId),
    Ident(StrId),

    // assignment family
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ShlAssign,
    ShrAssign,
    AndAssign,
    OrAssign,
    XorAssign,

    // ternary
    Question,
    Colon,

    // logical, bitwise, comparison
    LogicalOr,
    LogicalAnd,
    BitOr,
    BitXor,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
    ShiftLeft,
    ShiftRight,

    // arithmetic and unary
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Increment,
    Decrement,
    Not,
    Tilde,
    Sizeof,
    /// Synthesized by the evaluator for `(type) expr`; never scanned.
    Cast,

    // postfix and member access
    LeftSquare,
    RightSquare,
    Dot,
    Arrow,
    OpenBracket,
    CloseBracket,
    /// An `(` directly after a macro name in `#define`, introducing the
    /// parameter list.
    OpenMacroBracket,

    // separators
    Comma,
    Semicolon,
    LeftBrace,
    RightBrace,
    Ellipsis,

    // type and storage keywords
    IntKw,
    ShortKw,
    CharKw,
    LongKw,
    FloatKw,
    DoubleKw,
    VoidKw,
    SignedKw,
    UnsignedKw,
    StructKw,
    UnionKw,
    EnumKw,
    StaticKw,
    AutoKw,
    RegisterKw,
    ExternKw,
    TypedefKw,

    // statement keywords, scanned here for the statement layer
    If,
    Else,
    While,
    Do,
    For,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Goto,
    New,
    Delete,

    // preprocessor
    HashDefine,
    HashInclude,
    HashIf,
    HashIfdef,
    HashIfndef,
    HashElse,
    HashEndif,

    // sentinels
    EndOfLine,
    EndOfFunction,
    Eof,
}

impl Token {
    /// Literals that push a value directly.
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            Token::IntLit(_) | Token::CharLit(_) | Token::FpLit(_) | Token::StrLit(_)
        )
    }

    /// Keywords that can begin a type in a declaration or cast.
    pub fn starts_type(&self) -> bool {
        matches!(
            self,
            Token::IntKw
                | Token::ShortKw
                | Token::CharKw
                | Token::LongKw
                | Token::FloatKw
                | Token::DoubleKw
                | Token::VoidKw
                | Token::SignedKw
                | Token::UnsignedKw
                | Token::StructKw
                | Token::UnionKw
                | Token::EnumKw
                | Token::StaticKw
                | Token::AutoKw
                | Token::RegisterKw
                | Token::ExternKw
        )
    }

    /// Short descriptive name for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Token::IntLit(_) => "integer constant",
            Token::CharLit(_) => "character constant",
            Token::FpLit(_) => "floating point constant",
            Token::StrLit(_) => "string constant",
            Token::Ident(_) => "identifier",
            Token::Assign => "'='",
            Token::AddAssign => "'+='",
            Token::SubAssign => "'-='",
            Token::MulAssign => "'*='",
            Token::DivAssign => "'/='",
            Token::ModAssign => "'%='",
            Token::ShlAssign => "'<<='",
            Token::ShrAssign => "'>>='",
            Token::AndAssign => "'&='",
            Token::OrAssign => "'|='",
            Token::XorAssign => "'^='",
            Token::Question => "'?'",
            Token::Colon => "':'",
            Token::LogicalOr => "'||'",
            Token::LogicalAnd => "'&&'",
            Token::BitOr => "'|'",
            Token::BitXor => "'^'",
            Token::Ampersand => "'&'",
            Token::Equal => "'=='",
            Token::NotEqual => "'!='",
            Token::LessThan => "'<'",
            Token::GreaterThan => "'>'",
            Token::LessEqual => "'<='",
            Token::GreaterEqual => "'>='",
            Token::ShiftLeft => "'<<'",
            Token::ShiftRight => "'>>'",
            Token::Plus => "'+'",
            Token::Minus => "'-'",
            Token::Star => "'*'",
            Token::Slash => "'/'",
            Token::Percent => "'%'",
            Token::Increment => "'++'",
            Token::Decrement => "'--'",
            Token::Not => "'!'",
            Token::Tilde => "'~'",
            Token::Sizeof => "'sizeof'",
            Token::Cast => "cast",
            Token::LeftSquare => "'['",
            Token::RightSquare => "']'",
            Token::Dot => "'.'",
            Token::Arrow => "'->'",
            Token::OpenBracket => "'('",
            Token::CloseBracket => "')'",
            Token::OpenMacroBracket => "macro '('",
            Token::Comma => "','",
            Token::Semicolon => "';'",
            Token::LeftBrace => "'{'",
            Token::RightBrace => "'}'",
            Token::Ellipsis => "'...'",
            Token::IntKw => "'int'",
            Token::ShortKw => "'short'",
            Token::CharKw => "'char'",
            Token::LongKw => "'long'",
            Token::FloatKw => "'float'",
            Token::DoubleKw => "'double'",
            Token::VoidKw => "'void'",
            Token::SignedKw => "'signed'",
            Token::UnsignedKw => "'unsigned'",
            Token::StructKw => "'struct'",
            Token::UnionKw => "'union'",
            Token::EnumKw => "'enum'",
            Token::StaticKw => "'static'",
            Token::AutoKw => "'auto'",
            Token::RegisterKw => "'register'",
            Token::ExternKw => "'extern'",
            Token::TypedefKw => "'typedef'",
            Token::If => "'if'",
            Token::Else => "'else'",
            Token::While => "'while'",
            Token::Do => "'do'",
            Token::For => "'for'",
            Token::Switch => "'switch'",
            Token::Case => "'case'",
            Token::Default => "'default'",
            Token::Break => "'break'",
            Token::Continue => "'continue'",
            Token::Return => "'return'",
            Token::Goto => "'goto'",
            Token::New => "'new'",
            Token::Delete => "'delete'",
            Token::HashDefine => "'#define'",
            Token::HashInclude => "'#include'",
            Token::HashIf => "'#if'",
            Token::HashIfdef => "'#ifdef'",
            Token::HashIfndef => "'#ifndef'",
            Token::HashElse => "'#else'",
            Token::HashEndif => "'#endif'",
            Token::EndOfLine => "end of line",
            Token::EndOfFunction => "end of function",
            Token::Eof => "end of input",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A token plus the position it was scanned at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: Position,
}

/// The flat record buffer produced by one scan of a source text.
#[derive(Debug)]
pub struct TokenBuffer {
    pub file: String,
    tokens: Vec<Spanned>,
}

impl TokenBuffer {
    pub fn new(file: impl Into<String>, tokens: Vec<Spanned>) -> Self {
        TokenBuffer {
            file: file.into(),
            tokens,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token at `index`; reads past the end return the end-of-input
    /// sentinel at the last real position.
    pub fn get(&self, index: usize) -> Spanned {
        match self.tokens.get(index) {
            Some(s) => *s,
            None => Spanned {
                token: Token::Eof,
                pos: self.tokens.last().map(|s| s.pos).unwrap_or_default(),
            },
        }
    }
}
