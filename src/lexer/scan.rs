//! The scanner: raw text to a token buffer.
//!
//! One pass over the source bytes producing the flat [`TokenBuffer`].
//! Newlines are kept as explicit end-of-line tokens so `#define` bodies
//! can be delimited later; preprocessor directives are scanned as ordinary
//! tokens here and interpreted by the cursor.

use crate::error::{ErrorKind, EvalError, Position, Result};
use crate::lexer::token::{Spanned, Token, TokenBuffer};
use crate::symbols::Interner;

/// Scanner state for telling a macro parameter list's `(` apart from an
/// ordinary bracket: it must directly follow the name in `#define name(`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    /// Just scanned `#define`; the next word is the macro name.
    Define,
    /// Just scanned the macro name, with no whitespace since.
    DefineIdent,
}

struct Lexer<'src> {
    src: &'src [u8],
    file: &'src str,
    pos: usize,
    line: u32,
    column: u32,
    mode: Mode,
}

/// Scans `source` into a token buffer, interning identifiers and string
/// literals as it goes.
pub fn tokenize(source: &str, file: &str, interner: &mut Interner) -> Result<TokenBuffer> {
    let mut lexer = Lexer {
        src: source.as_bytes(),
        file,
        pos: 0,
        line: 1,
        column: 1,
        mode: Mode::Normal,
    };
    let mut tokens = Vec::new();
    while let Some(spanned) = lexer.next_token(interner)? {
        tokens.push(spanned);
    }
    tokens.push(Spanned {
        token: Token::Eof,
        pos: lexer.here(),
    });
    Ok(TokenBuffer::new(file, tokens))
}

impl<'src> Lexer<'src> {
    fn here(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn fail(&self, message: impl Into<String>) -> EvalError {
        EvalError::new(ErrorKind::Lexical, message, self.file, self.here())
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.src.get(self.pos + ahead).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(byte)
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn next_token(&mut self, interner: &mut Interner) -> Result<Option<Spanned>> {
        loop {
            let pos = self.here();
            let byte = match self.peek() {
                Some(b) => b,
                None => return Ok(None),
            };
            match byte {
                b' ' | b'\t' | b'\r' => {
                    if self.mode == Mode::DefineIdent {
                        self.mode = Mode::Normal;
                    }
                    self.advance();
                }
                b'\n' => {
                    self.advance();
                    self.mode = Mode::Normal;
                    return Ok(Some(Spanned {
                        token: Token::EndOfLine,
                        pos,
                    }));
                }
                b'/' if self.peek_at(1) == Some(b'/') => {
                    while !matches!(self.peek(), None | Some(b'\n')) {
                        self.advance();
                    }
                }
                b'/' if self.peek_at(1) == Some(b'*') => {
                    self.advance();
                    self.advance();
                    loop {
                        match self.advance() {
                            None => return Err(self.fail("unterminated comment")),
                            Some(b'*') if self.peek() == Some(b'/') => {
                                self.advance();
                                break;
                            }
                            _ => {}
                        }
                    }
                }
                _ => {
                    let token = self.scan_token(interner)?;
                    return Ok(Some(Spanned { token, pos }));
                }
            }
        }
    }

    fn scan_token(&mut self, interner: &mut Interner) -> Result<Token> {
        let byte = self.peek().expect("caller checked for input");
        if byte.is_ascii_digit() {
            return self.scan_number();
        }
        if byte.is_ascii_alphabetic() || byte == b'_' || byte == b'#' {
            return self.scan_word(interner);
        }
        self.advance();
        let token = match byte {
            b'"' => self.scan_string(interner)?,
            b'\'' => self.scan_char()?,
            b'(' => {
                if self.mode == Mode::DefineIdent {
                    self.mode = Mode::Normal;
                    return Ok(Token::OpenMacroBracket);
                }
                Token::OpenBracket
            }
            b')' => Token::CloseBracket,
            b'[' => Token::LeftSquare,
            b']' => Token::RightSquare,
            b'{' => Token::LeftBrace,
            b'}' => Token::RightBrace,
            b',' => Token::Comma,
            b';' => Token::Semicolon,
            b'?' => Token::Question,
            b':' => Token::Colon,
            b'~' => Token::Tilde,
            b'=' => {
                if self.eat(b'=') {
                    Token::Equal
                } else {
                    Token::Assign
                }
            }
            b'+' => {
                if self.eat(b'=') {
                    Token::AddAssign
                } else if self.eat(b'+') {
                    Token::Increment
                } else {
                    Token::Plus
                }
            }
            b'-' => {
                if self.eat(b'=') {
                    Token::SubAssign
                } else if self.eat(b'-') {
                    Token::Decrement
                } else if self.eat(b'>') {
                    Token::Arrow
                } else {
                    Token::Minus
                }
            }
            b'*' => {
                if self.eat(b'=') {
                    Token::MulAssign
                } else {
                    Token::Star
                }
            }
            b'/' => {
                if self.eat(b'=') {
                    Token::DivAssign
                } else {
                    Token::Slash
                }
            }
            b'%' => {
                if self.eat(b'=') {
                    Token::ModAssign
                } else {
                    Token::Percent
                }
            }
            b'<' => {
                if self.eat(b'=') {
                    Token::LessEqual
                } else if self.eat(b'<') {
                    if self.eat(b'=') {
                        Token::ShlAssign
                    } else {
                        Token::ShiftLeft
                    }
                } else {
                    Token::LessThan
                }
            }
            b'>' => {
                if self.eat(b'=') {
                    Token::GreaterEqual
                } else if self.eat(b'>') {
                    if self.eat(b'=') {
                        Token::ShrAssign
                    } else {
                        Token::ShiftRight
                    }
                } else {
                    Token::GreaterThan
                }
            }
            b'&' => {
                if self.eat(b'&') {
                    Token::LogicalAnd
                } else if self.eat(b'=') {
                    Token::AndAssign
                } else {
                    Token::Ampersand
                }
            }
            b'|' => {
                if self.eat(b'|') {
                    Token::LogicalOr
                } else if self.eat(b'=') {
                    Token::OrAssign
                } else {
                    Token::BitOr
                }
            }
            b'^' => {
                if self.eat(b'=') {
                    Token::XorAssign
                } else {
                    Token::BitXor
                }
            }
            b'!' => {
                if self.eat(b'=') {
                    Token::NotEqual
                } else {
                    Token::Not
                }
            }
            b'.' => {
                if self.peek() == Some(b'.') && self.peek_at(1) == Some(b'.') {
                    self.advance();
                    self.advance();
                    Token::Ellipsis
                } else {
                    Token::Dot
                }
            }
            other => {
                return Err(self.fail(format!("illegal character '{}'", other as char)));
            }
        };
        self.mode = Mode::Normal;
        Ok(token)
    }

    fn digit_value(byte: u8, base: i64) -> Option<i64> {
        let v = match byte {
            b'0'..=b'9' => (byte - b'0') as i64,
            b'a'..=b'f' => (byte - b'a') as i64 + 10,
            b'A'..=b'F' => (byte - b'A') as i64 + 10,
            _ => return None,
        };
        (v < base).then_some(v)
    }

    /// Integer and float literals. A leading `0` selects octal unless
    /// followed by `x`/`b` (hex/binary) or `.` (plain decimal float). The
    /// fraction and exponent are read in the literal's base.
    fn scan_number(&mut self) -> Result<Token> {
        let mut base: i64 = 10;
        if self.peek() == Some(b'0') {
            self.advance();
            match self.peek() {
                Some(b'x') | Some(b'X') => {
                    base = 16;
                    self.advance();
                }
                Some(b'b') | Some(b'B') => {
                    base = 2;
                    self.advance();
                }
                Some(b'.') => {}
                Some(_) => base = 8,
                None => {}
            }
        }
        let mut result: i64 = 0;
        while let Some(v) = self.peek().and_then(|b| Self::digit_value(b, base)) {
            result = result.wrapping_mul(base).wrapping_add(v);
            self.advance();
        }
        if self.eat(b'l') || self.eat(b'L') {
            return Ok(Self::integer_token(result));
        }
        if self.peek() != Some(b'.') {
            return Ok(Self::integer_token(result));
        }
        self.advance();
        let mut fp = result as f64;
        let mut div = 1.0 / base as f64;
        while let Some(v) = self.peek().and_then(|b| Self::digit_value(b, base)) {
            fp += v as f64 * div;
            div /= base as f64;
            self.advance();
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            self.advance();
            let sign = if self.eat(b'-') { -1.0 } else { 1.0 };
            let mut exponent: i64 = 0;
            while let Some(v) = self.peek().and_then(|b| Self::digit_value(b, base)) {
                exponent = exponent * base + v;
                self.advance();
            }
            fp *= (base as f64).powf(exponent as f64 * sign);
        }
        Ok(Token::FpLit(fp))
    }

    /// Integers in byte range scan as character constants; wider values as
    /// integer constants.
    fn integer_token(value: i64) -> Token {
        if (0..=255).contains(&value) {
            Token::CharLit(value as u8)
        } else {
            Token::IntLit(value)
        }
    }

    fn scan_word(&mut self, interner: &mut Interner) -> Result<Token> {
        let start = self.pos;
        if self.peek() == Some(b'#') {
            self.advance();
        }
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.advance();
        }
        let word = std::str::from_utf8(&self.src[start..self.pos])
            .map_err(|_| self.fail("identifier is not valid text"))?;
        let token = match word {
            "#define" => {
                self.mode = Mode::Define;
                return Ok(Token::HashDefine);
            }
            "#include" => Token::HashInclude,
            "#if" => Token::HashIf,
            "#ifdef" => Token::HashIfdef,
            "#ifndef" => Token::HashIfndef,
            "#else" => Token::HashElse,
            "#endif" => Token::HashEndif,
            "int" => Token::IntKw,
            "short" => Token::ShortKw,
            "char" => Token::CharKw,
            "long" => Token::LongKw,
            "float" => Token::FloatKw,
            "double" => Token::DoubleKw,
            "void" => Token::VoidKw,
            "signed" => Token::SignedKw,
            "unsigned" => Token::UnsignedKw,
            "struct" => Token::StructKw,
            "union" => Token::UnionKw,
            "enum" => Token::EnumKw,
            "static" => Token::StaticKw,
            "auto" => Token::AutoKw,
            "register" => Token::RegisterKw,
            "extern" => Token::ExternKw,
            "typedef" => Token::TypedefKw,
            "sizeof" => Token::Sizeof,
            "if" => Token::If,
            "else" => Token::Else,
            "while" => Token::While,
            "do" => Token::Do,
            "for" => Token::For,
            "switch" => Token::Switch,
            "case" => Token::Case,
            "default" => Token::Default,
            "break" => Token::Break,
            "continue" => Token::Continue,
            "return" => Token::Return,
            "goto" => Token::Goto,
            "new" => Token::New,
            "delete" => Token::Delete,
            _ if word.starts_with('#') => {
                return Err(self.fail(format!("unknown directive '{}'", word)));
            }
            _ => Token::Ident(interner.intern(word)),
        };
        self.mode = if self.mode == Mode::Define && matches!(token, Token::Ident(_)) {
            Mode::DefineIdent
        } else {
            Mode::Normal
        };
        Ok(token)
    }

    /// One character after a backslash, including octal and hex forms.
    fn scan_escape(&mut self) -> Result<u8> {
        let byte = self
            .advance()
            .ok_or_else(|| self.fail("unterminated escape sequence"))?;
        Ok(match byte {
            b'n' => b'\n',
            b't' => b'\t',
            b'r' => b'\r',
            b'a' => 0x07,
            b'b' => 0x08,
            b'f' => 0x0c,
            b'v' => 0x0b,
            b'\\' => b'\\',
            b'\'' => b'\'',
            b'"' => b'"',
            b'0'..=b'7' => {
                let mut value = (byte - b'0') as u32;
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + (d - b'0') as u32;
                            self.advance();
                        }
                        _ => break,
                    }
                }
                value as u8
            }
            b'x' => {
                let mut value: u32 = 0;
                while let Some(v) = self.peek().and_then(|b| Self::digit_value(b, 16)) {
                    value = value * 16 + v as u32;
                    self.advance();
                }
                value as u8
            }
            other => other,
        })
    }

    fn scan_char(&mut self) -> Result<Token> {
        let byte = match self.advance() {
            None | Some(b'\n') => return Err(self.fail("unterminated character constant")),
            Some(b'\\') => self.scan_escape()?,
            Some(b) => b,
        };
        if !self.eat(b'\'') {
            return Err(self.fail("expected closing '''"));
        }
        self.mode = Mode::Normal;
        Ok(Token::CharLit(byte))
    }

    fn scan_string(&mut self, interner: &mut Interner) -> Result<Token> {
        let mut bytes = Vec::new();
        loop {
            match self.advance() {
                None | Some(b'\n') => return Err(self.fail("unterminated string constant")),
                Some(b'"') => break,
                // a backslash-newline continues the literal on the next line
                Some(b'\\') if self.peek() == Some(b'\n') => {
                    self.advance();
                }
                Some(b'\\') => bytes.push(self.scan_escape()?),
                Some(b) => bytes.push(b),
            }
        }
        self.mode = Mode::Normal;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        Ok(Token::StrLit(interner.intern(&text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan(src: &str) -> Vec<Token> {
        let mut interner = Interner::new();
        let buf = tokenize(src, "test.c", &mut interner).unwrap();
        (0..buf.len()).map(|i| buf.get(i).token).collect()
    }

    #[test]
    fn small_integers_are_character_constants() {
        assert_eq!(scan("42"), vec![Token::CharLit(42), Token::Eof]);
        assert_eq!(scan("300"), vec![Token::IntLit(300), Token::Eof]);
    }

    #[test]
    fn numeric_bases() {
        assert_eq!(scan("0x1F")[0], Token::CharLit(31));
        assert_eq!(scan("0b101")[0], Token::CharLit(5));
        assert_eq!(scan("017")[0], Token::CharLit(15));
        assert_eq!(scan("0x100")[0], Token::IntLit(256));
    }

    #[test]
    fn float_literals() {
        assert_eq!(scan("2.5")[0], Token::FpLit(2.5));
        assert_eq!(scan("0.5")[0], Token::FpLit(0.5));
        assert_eq!(scan("1.0e2")[0], Token::FpLit(100.0));
        assert_eq!(scan("1.0e-2")[0], Token::FpLit(0.01));
    }

    #[test]
    fn operator_maximal_munch() {
        let tokens = scan("a <<= b >> c ->d");
        assert_eq!(tokens[1], Token::ShlAssign);
        assert_eq!(tokens[3], Token::ShiftRight);
        assert_eq!(tokens[5], Token::Arrow);
    }

    #[test]
    fn character_escapes() {
        assert_eq!(scan(r"'\n'")[0], Token::CharLit(b'\n'));
        assert_eq!(scan(r"'\t'")[0], Token::CharLit(b'\t'));
        assert_eq!(scan(r"'\x41'")[0], Token::CharLit(b'A'));
        assert_eq!(scan(r"'\101'")[0], Token::CharLit(b'A'));
        assert_eq!(scan(r"'\v'")[0], Token::CharLit(0x0b));
    }

    #[test]
    fn string_literals_are_interned_once() {
        let mut interner = Interner::new();
        let buf = tokenize("\"hi\" \"hi\"", "test.c", &mut interner).unwrap();
        assert_eq!(buf.get(0).token, buf.get(1).token);
    }

    #[test]
    fn macro_bracket_requires_adjacency() {
        let with_params = scan("#define SQ(x) x\n");
        assert!(with_params.contains(&Token::OpenMacroBracket));
        let object_like = scan("#define SQ (x)\n");
        assert!(!object_like.contains(&Token::OpenMacroBracket));
        assert!(object_like.contains(&Token::OpenBracket));
    }

    #[test]
    fn newlines_are_kept_and_positions_advance() {
        let mut interner = Interner::new();
        let buf = tokenize("1\n 2", "test.c", &mut interner).unwrap();
        assert_eq!(buf.get(1).token, Token::EndOfLine);
        assert_eq!(buf.get(2).pos.line, 2);
        assert_eq!(buf.get(2).pos.column, 2);
    }

    #[test]
    fn unterminated_string_is_a_lexical_error() {
        let mut interner = Interner::new();
        let err = tokenize("\"oops", "test.c", &mut interner).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Lexical);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            scan("1 /* two */ + 3 // tail"),
            vec![
                Token::CharLit(1),
                Token::Plus,
                Token::CharLit(3),
                Token::Eof
            ]
        );
    }
}
