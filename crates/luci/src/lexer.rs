//! Byte-stream lexer.
//!
//! Positions are 1-based; `line` advances at `\n`, which also resets
//! `column`. The lexer is restartable by constructing a new one over the
//! same input.

use std::sync::Arc;

use crate::token::{Token, TokenKind};

pub struct Lexer {
    input: Vec<u8>,
    file: Option<Arc<str>>,
    /// Index of the current character.
    position: usize,
    /// Index of the next character to read.
    read_position: usize,
    line: usize,
    column: usize,
    ch: u8,
}

impl Lexer {
    #[must_use]
    pub fn new(input: &str, file_name: &str) -> Self {
        let mut lexer = Self {
            input: input.as_bytes().to_vec(),
            file: if file_name.is_empty() {
                None
            } else {
                Some(Arc::from(file_name))
            },
            position: 0,
            read_position: 0,
            line: 1,
            column: 0,
            ch: 0,
        };
        lexer.read_char();
        lexer
    }

    fn read_char(&mut self) {
        self.ch = if self.read_position >= self.input.len() {
            0
        } else {
            self.input[self.read_position]
        };
        self.position = self.read_position;
        self.read_position += 1;
        self.column += 1;
    }

    fn peek_char(&self) -> u8 {
        if self.read_position >= self.input.len() {
            0
        } else {
            self.input[self.read_position]
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.ch, b' ' | b'\t' | b'\n' | b'\r') {
            if self.ch == b'\n' {
                self.line += 1;
                self.column = 0;
            }
            self.read_char();
        }
    }

    fn token(&self, kind: TokenKind, literal: impl Into<String>) -> Token {
        Token::new(kind, literal, self.line, self.column, self.file.clone())
    }

    fn slice(&self, from: usize, to: usize) -> String {
        String::from_utf8_lossy(&self.input[from..to]).into_owned()
    }

    /// Consumes a two-character operator, returning its literal.
    fn read_compound(&mut self) -> String {
        let first = self.ch;
        self.read_char();
        String::from_utf8_lossy(&[first, self.ch]).into_owned()
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while self.ch.is_ascii_alphanumeric() || self.ch == b'_' {
            self.read_char();
        }
        self.slice(start, self.position)
    }

    /// Reads an integer or double literal. A double with an exponent marker
    /// but no exponent digits is an illegal token carrying the consumed text.
    fn read_number_token(&mut self) -> Token {
        let start = self.position;
        while self.ch.is_ascii_digit() {
            self.read_char();
        }
        if self.ch != b'.' {
            let literal = self.slice(start, self.position);
            return self.token(TokenKind::Int, literal);
        }

        self.read_char();
        while self.ch.is_ascii_digit() {
            self.read_char();
        }
        if self.ch == b'e' {
            self.read_char();
            if self.ch == b'-' || self.ch == b'+' {
                self.read_char();
            }
            if !self.ch.is_ascii_digit() {
                let literal = self.slice(start, self.position);
                return self.token(TokenKind::Illegal, literal);
            }
            while self.ch.is_ascii_digit() {
                self.read_char();
            }
        }
        let literal = self.slice(start, self.position);
        self.token(TokenKind::Double, literal)
    }

    /// Reads a double-quoted string. The current character is the opening
    /// quote; an unterminated string becomes an illegal token.
    fn read_string_token(&mut self) -> Token {
        let start = self.position;
        while self.peek_char() != b'"' && self.peek_char() != 0 {
            if self.peek_char() == b'\n' {
                self.line += 1;
                self.column = 0;
            }
            self.read_char();
        }
        if self.peek_char() == 0 {
            self.read_char();
            let literal = unescape(&self.slice(start, self.position));
            return self.token(TokenKind::Illegal, literal);
        }
        self.read_char();
        self.read_char();
        let literal = unescape(&self.slice(start, self.position));
        self.token(TokenKind::Str, literal)
    }

    /// Reads `//` or `/!` up to (and including) the end of line.
    fn read_line_token(&mut self, kind: TokenKind) -> Token {
        let start = self.position;
        while self.peek_char() != b'\n' && self.peek_char() != 0 {
            self.read_char();
        }
        if self.peek_char() == b'\n' {
            self.read_char();
        }
        let literal = self.slice(start, self.position);
        let token = self.token(kind, literal);
        self.line += 1;
        self.column = 0;
        token
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let single = |lexer: &Self, kind: TokenKind| lexer.token(kind, (lexer.ch as char).to_string());

        let token = match self.ch {
            0 => self.token(TokenKind::Eof, ""),
            b'=' => {
                if self.peek_char() == b'=' {
                    let literal = self.read_compound();
                    self.token(TokenKind::Eq, literal)
                } else {
                    single(self, TokenKind::Assign)
                }
            }
            b';' => single(self, TokenKind::Semicolon),
            b'(' => single(self, TokenKind::Lparen),
            b')' => single(self, TokenKind::Rparen),
            b'[' => single(self, TokenKind::Lbracket),
            b']' => single(self, TokenKind::Rbracket),
            b'{' => single(self, TokenKind::Lbrace),
            b'}' => single(self, TokenKind::Rbrace),
            b',' => single(self, TokenKind::Comma),
            b'.' => single(self, TokenKind::Dot),
            b'%' => single(self, TokenKind::Percent),
            b'!' => {
                if self.peek_char() == b'=' {
                    let literal = self.read_compound();
                    self.token(TokenKind::NotEq, literal)
                } else {
                    single(self, TokenKind::Bang)
                }
            }
            b'+' => {
                if self.peek_char() == b'=' {
                    let literal = self.read_compound();
                    self.token(TokenKind::PlusAssign, literal)
                } else {
                    single(self, TokenKind::Plus)
                }
            }
            b'-' => match self.peek_char() {
                b'=' => {
                    let literal = self.read_compound();
                    self.token(TokenKind::MinusAssign, literal)
                }
                b'>' => {
                    let literal = self.read_compound();
                    self.token(TokenKind::Arrow, literal)
                }
                _ => single(self, TokenKind::Minus),
            },
            b'/' => match self.peek_char() {
                b'=' => {
                    let literal = self.read_compound();
                    self.token(TokenKind::SlashAssign, literal)
                }
                b'/' => return self.read_line_token(TokenKind::Comment),
                b'!' => return self.read_line_token(TokenKind::Doc),
                _ => single(self, TokenKind::Slash),
            },
            b'*' => match self.peek_char() {
                b'*' => {
                    let literal = self.read_compound();
                    self.token(TokenKind::DoubleAsterisk, literal)
                }
                b'=' => {
                    let literal = self.read_compound();
                    self.token(TokenKind::AsteriskAssign, literal)
                }
                _ => single(self, TokenKind::Asterisk),
            },
            b'|' => {
                if self.peek_char() == b'|' {
                    let literal = self.read_compound();
                    self.token(TokenKind::DoublePipe, literal)
                } else {
                    single(self, TokenKind::Illegal)
                }
            }
            b'&' => {
                if self.peek_char() == b'&' {
                    let literal = self.read_compound();
                    self.token(TokenKind::DoubleAmpersand, literal)
                } else {
                    single(self, TokenKind::Illegal)
                }
            }
            b':' => {
                if self.peek_char() == b':' {
                    let literal = self.read_compound();
                    self.token(TokenKind::DoubleColon, literal)
                } else {
                    single(self, TokenKind::Colon)
                }
            }
            b'<' => {
                if self.peek_char() == b'=' {
                    let literal = self.read_compound();
                    self.token(TokenKind::LtEq, literal)
                } else {
                    single(self, TokenKind::Lt)
                }
            }
            b'>' => {
                if self.peek_char() == b'=' {
                    let literal = self.read_compound();
                    self.token(TokenKind::GtEq, literal)
                } else {
                    single(self, TokenKind::Gt)
                }
            }
            b'"' => return self.read_string_token(),
            ch if ch.is_ascii_alphabetic() || ch == b'_' => {
                let column = self.column;
                let line = self.line;
                let literal = self.read_identifier();
                let kind = TokenKind::lookup_ident(&literal);
                return Token::new(kind, literal, line, column, self.file.clone());
            }
            ch if ch.is_ascii_digit() => return self.read_number_token(),
            _ => single(self, TokenKind::Illegal),
        };

        self.read_char();
        token
    }
}

/// Resolves `\n`, `\t`, `\r` and `\0ddd` (three octal digits) escapes.
/// Unknown escapes and a trailing backslash pass through unchanged.
fn unescape(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' || i + 1 >= bytes.len() {
            output.push(bytes[i]);
            i += 1;
            continue;
        }
        match bytes[i + 1] {
            b'n' => {
                output.push(b'\n');
                i += 2;
            }
            b't' => {
                output.push(b'\t');
                i += 2;
            }
            b'r' => {
                output.push(b'\r');
                i += 2;
            }
            b'0' if i + 3 < bytes.len() => {
                let digits = [bytes[i + 1], bytes[i + 2], bytes[i + 3]];
                if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                    let value = (u32::from(digits[0] - b'0') * 64)
                        + (u32::from(digits[1] - b'0') * 8)
                        + u32::from(digits[2] - b'0');
                    if value <= 255 {
                        output.push(value as u8);
                    }
                    i += 4;
                } else {
                    output.push(bytes[i]);
                    i += 1;
                }
            }
            _ => {
                output.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&output).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_literals(input: &str) -> Vec<(TokenKind, String)> {
        let mut lexer = Lexer::new(input, "");
        let mut out = vec![];
        loop {
            let token = lexer.next_token();
            let done = token.kind == TokenKind::Eof;
            out.push((token.kind, token.literal));
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn punctuation() {
        let expected = [
            (TokenKind::Assign, "="),
            (TokenKind::Plus, "+"),
            (TokenKind::Lparen, "("),
            (TokenKind::Rparen, ")"),
            (TokenKind::Lbrace, "{"),
            (TokenKind::Rbrace, "}"),
            (TokenKind::Comma, ","),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Eof, ""),
        ];
        let got = kinds_and_literals("=+(){},;");
        for (got, (kind, literal)) in got.iter().zip(expected.iter()) {
            assert_eq!(got.0, *kind);
            assert_eq!(got.1, *literal);
        }
    }

    #[test]
    fn compound_operators() {
        let got = kinds_and_literals("== != <= >= ** += -= /= *= && || :: -> //x");
        let kinds: Vec<TokenKind> = got.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::DoubleAsterisk,
                TokenKind::PlusAssign,
                TokenKind::MinusAssign,
                TokenKind::SlashAssign,
                TokenKind::AsteriskAssign,
                TokenKind::DoubleAmpersand,
                TokenKind::DoublePipe,
                TokenKind::DoubleColon,
                TokenKind::Arrow,
                TokenKind::Comment,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn doubles_and_exponents() {
        let got = kinds_and_literals("3.0;3.0e1;3.0e-1;3.0e+3;3.0e-");
        let kinds: Vec<(TokenKind, &str)> = got.iter().map(|(k, l)| (*k, l.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (TokenKind::Double, "3.0"),
                (TokenKind::Semicolon, ";"),
                (TokenKind::Double, "3.0e1"),
                (TokenKind::Semicolon, ";"),
                (TokenKind::Double, "3.0e-1"),
                (TokenKind::Semicolon, ";"),
                (TokenKind::Double, "3.0e+3"),
                (TokenKind::Semicolon, ";"),
                (TokenKind::Illegal, "3.0e-"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn keywords() {
        let got = kinds_and_literals("fn let const if else while for in break continue try except type scope import op any all");
        let kinds: Vec<TokenKind> = got.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Function,
                TokenKind::Let,
                TokenKind::Const,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::For,
                TokenKind::In,
                TokenKind::Break,
                TokenKind::Continue,
                TokenKind::Try,
                TokenKind::Except,
                TokenKind::Type,
                TokenKind::Scope,
                TokenKind::Import,
                TokenKind::Operator,
                TokenKind::Any,
                TokenKind::All,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        let got = kinds_and_literals("\"a\\tb\\nc\"");
        assert_eq!(got[0], (TokenKind::Str, "\"a\tb\nc\"".to_string()));

        let got = kinds_and_literals("\"\\0101\"");
        assert_eq!(got[0], (TokenKind::Str, "\"A\"".to_string()));
    }

    #[test]
    fn unterminated_string_is_illegal() {
        let got = kinds_and_literals("\"abc");
        assert_eq!(got[0].0, TokenKind::Illegal);
    }

    #[test]
    fn positions_are_one_based() {
        let mut lexer = Lexer::new("let x = 1;\nlet y = 2;", "");
        let first = lexer.next_token();
        assert_eq!((first.line, first.column), (1, 1));
        for _ in 0..4 {
            lexer.next_token();
        }
        let second_let = lexer.next_token();
        assert_eq!(second_let.kind, TokenKind::Let);
        assert_eq!(second_let.line, 2);
    }

    #[test]
    fn doc_and_comment_tokens() {
        let got = kinds_and_literals("/! docs here\n// plain comment\nlet");
        assert_eq!(got[0].0, TokenKind::Doc);
        assert!(got[0].1.starts_with("/! docs here"));
        assert_eq!(got[1].0, TokenKind::Comment);
        assert_eq!(got[2].0, TokenKind::Let);
    }
}
