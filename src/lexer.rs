//! S-expression lexer
//!
//! Operator tokens carry the opcode values their instructions use, so the
//! compiler lowers them without a mapping table. Line comments start with
//! `;` and run to the end of the line.

use crate::ast::BinOp;
use crate::error::ParseError;

/// A token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What was lexed.
    pub kind: TokenKind,
    /// 1-based source line.
    pub line: usize,
    /// 1-based source column.
    pub col: usize,
}

/// Token kinds of the surface syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftCurly,
    /// `}`
    RightCurly,
    /// `:` in object literals.
    Colon,
    /// `+ - * / = < >`
    Op(BinOp),
    /// Anything between `"` and `"`.
    Str(String),
    /// Whole number.
    Int(i64),
    /// Floating point number.
    Double(f64),
    /// `true`
    True,
    /// `false`
    False,
    /// `@` followed by a dotted path.
    Builtin(String),
    /// `'` followed by an identifier; a quoted symbol.
    Quoted(String),
    /// Any identifier.
    Ident(String),
    /// End of input.
    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::LeftBracket => write!(f, "["),
            TokenKind::RightBracket => write!(f, "]"),
            TokenKind::LeftCurly => write!(f, "{{"),
            TokenKind::RightCurly => write!(f, "}}"),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Op(op) => write!(f, "{}", op.glyph()),
            TokenKind::Str(s) => write!(f, "\"{s}\""),
            TokenKind::Int(i) => write!(f, "{i}"),
            TokenKind::Double(d) => write!(f, "{d}"),
            TokenKind::True => write!(f, "true"),
            TokenKind::False => write!(f, "false"),
            TokenKind::Builtin(p) => write!(f, "@{p}"),
            TokenKind::Quoted(s) => write!(f, "'{s}"),
            TokenKind::Ident(s) => write!(f, "{s}"),
            TokenKind::Eof => write!(f, "<eof>"),
        }
    }
}

/// Streaming tokenizer over a source string.
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

// the original's test programs use digits in identifiers (`add25`), so the
// tail is wider than the head
fn is_ident_tail(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

impl<'a> Lexer<'a> {
    /// Lexer over `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    fn skip_trivia(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' | b',' => {
                    self.bump();
                }
                b';' => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !is_ident_tail(b) {
                break;
            }
            self.bump();
        }
        // idents are ASCII by construction
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn number(&mut self, line: usize, col: usize) -> Result<Token, ParseError> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.bump();
        }
        let mut double = false;
        if self.peek() == Some(b'.')
            && matches!(self.input.get(self.pos + 1), Some(b) if b.is_ascii_digit())
        {
            double = true;
            self.bump();
            while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
                self.bump();
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).expect("digits are UTF-8");
        let kind = if double {
            TokenKind::Double(text.parse().expect("lexed double"))
        } else {
            match text.parse() {
                Ok(i) => TokenKind::Int(i),
                // past i64: fall back to the double representation
                Err(_) => TokenKind::Double(text.parse().expect("lexed number")),
            }
        };
        Ok(Token { kind, line, col })
    }

    /// The next token, or [`TokenKind::Eof`] once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia();
        let (line, col) = (self.line, self.col);
        let Some(b) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                line,
                col,
            });
        };

        let simple = |kind| Token { kind, line, col };
        match b {
            b'(' => {
                self.bump();
                Ok(simple(TokenKind::LeftParen))
            }
            b')' => {
                self.bump();
                Ok(simple(TokenKind::RightParen))
            }
            b'[' => {
                self.bump();
                Ok(simple(TokenKind::LeftBracket))
            }
            b']' => {
                self.bump();
                Ok(simple(TokenKind::RightBracket))
            }
            b'{' => {
                self.bump();
                Ok(simple(TokenKind::LeftCurly))
            }
            b'}' => {
                self.bump();
                Ok(simple(TokenKind::RightCurly))
            }
            b':' => {
                self.bump();
                Ok(simple(TokenKind::Colon))
            }
            b'+' => {
                self.bump();
                Ok(simple(TokenKind::Op(BinOp::Add)))
            }
            b'-' => {
                self.bump();
                Ok(simple(TokenKind::Op(BinOp::Sub)))
            }
            b'*' => {
                self.bump();
                Ok(simple(TokenKind::Op(BinOp::Mul)))
            }
            b'/' => {
                self.bump();
                Ok(simple(TokenKind::Op(BinOp::Div)))
            }
            b'=' => {
                self.bump();
                Ok(simple(TokenKind::Op(BinOp::Eq)))
            }
            b'<' => {
                self.bump();
                Ok(simple(TokenKind::Op(BinOp::Lt)))
            }
            b'>' => {
                self.bump();
                Ok(simple(TokenKind::Op(BinOp::Gt)))
            }
            b'"' => {
                self.bump();
                let start = self.pos;
                // TODO: escape sequences in string literals
                loop {
                    match self.peek() {
                        Some(b'"') => break,
                        Some(_) => {
                            self.bump();
                        }
                        None => return Err(ParseError::UnterminatedString { line, col }),
                    }
                }
                let s = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
                self.bump();
                Ok(simple(TokenKind::Str(s)))
            }
            b'\'' => {
                self.bump();
                match self.peek() {
                    Some(b) if is_ident_start(b) => Ok(simple(TokenKind::Quoted(self.ident()))),
                    _ => Err(ParseError::UnexpectedChar {
                        ch: '\'',
                        line,
                        col,
                    }),
                }
            }
            b'@' => {
                self.bump();
                let mut path = String::new();
                loop {
                    match self.peek() {
                        Some(b) if is_ident_start(b) => path.push_str(&self.ident()),
                        _ => {
                            return Err(ParseError::UnexpectedChar {
                                ch: '@',
                                line,
                                col,
                            })
                        }
                    }
                    if self.peek() == Some(b'.') {
                        self.bump();
                        path.push('.');
                        continue;
                    }
                    break;
                }
                Ok(simple(TokenKind::Builtin(path)))
            }
            b if b.is_ascii_digit() => self.number(line, col),
            b if is_ident_start(b) => {
                let word = self.ident();
                let kind = match word.as_str() {
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    _ => TokenKind::Ident(word),
                };
                Ok(simple(kind))
            }
            other => Err(ParseError::UnexpectedChar {
                ch: other as char,
                line,
                col,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let t = lexer.next_token().expect("lexes");
            let done = t.kind == TokenKind::Eof;
            out.push(t.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn lexes_call_form() {
        assert_eq!(
            kinds("(+ 2 2.5)"),
            vec![
                TokenKind::LeftParen,
                TokenKind::Op(BinOp::Add),
                TokenKind::Int(2),
                TokenKind::Double(2.5),
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_builtin_paths() {
        assert_eq!(
            kinds("(@std.fmt.println \"hi\")"),
            vec![
                TokenKind::LeftParen,
                TokenKind::Builtin("std.fmt.println".into()),
                TokenKind::Str("hi".into()),
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_quoted_symbols_and_comments() {
        assert_eq!(
            kinds("'quoted ; a comment\ntrue"),
            vec![
                TokenKind::Quoted("quoted".into()),
                TokenKind::True,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn idents_allow_digits_and_dashes() {
        assert_eq!(
            kinds("add25 kebab-case"),
            vec![
                TokenKind::Ident("add25".into()),
                TokenKind::Ident("kebab-case".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_errors_with_position() {
        let mut lexer = Lexer::new("\"oops");
        assert!(matches!(
            lexer.next_token(),
            Err(ParseError::UnterminatedString { line: 1, col: 1 })
        ));
    }
}
