use std::sync::Arc;

use strum::Display;

/// Token kinds produced by the lexer.
///
/// Compound operators (`==`, `+=`, `::`, ...) are lexed greedy-longest-match,
/// so `==` never arrives as two `Assign` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TokenKind {
    Illegal,
    Eof,

    Ident,
    Int,
    Double,
    Str,

    Assign,
    Plus,
    Minus,
    Slash,
    Asterisk,
    DoubleAsterisk,
    Percent,

    PlusAssign,
    MinusAssign,
    SlashAssign,
    AsteriskAssign,

    Eq,
    NotEq,

    Lt,
    Gt,
    LtEq,
    GtEq,

    DoubleAmpersand,
    DoublePipe,

    Bang,

    Comma,
    Semicolon,
    Colon,
    DoubleColon,

    Lparen,
    Rparen,
    Lbrace,
    Rbrace,
    Lbracket,
    Rbracket,

    Function,
    Let,
    If,
    Else,
    Return,
    True,
    False,
    Null,
    While,
    Break,
    Continue,
    Const,
    Any,
    All,
    Operator,
    Arrow,
    Dot,
    Type,
    Scope,
    Comment,
    Doc,
    For,
    In,
    Import,
    Try,
    Except,
}

impl TokenKind {
    /// Maps an identifier to its keyword kind, or `Ident` when it is not
    /// reserved.
    #[must_use]
    pub fn lookup_ident(ident: &str) -> Self {
        match ident {
            "type" => Self::Type,
            "fn" => Self::Function,
            "let" => Self::Let,
            "import" => Self::Import,
            "scope" => Self::Scope,
            "if" => Self::If,
            "else" => Self::Else,
            "return" => Self::Return,
            "true" => Self::True,
            "false" => Self::False,
            "null" => Self::Null,
            "while" => Self::While,
            "break" => Self::Break,
            "continue" => Self::Continue,
            "const" => Self::Const,
            "any" => Self::Any,
            "all" => Self::All,
            "op" => Self::Operator,
            "in" => Self::In,
            "for" => Self::For,
            "try" => Self::Try,
            "except" => Self::Except,
            _ => Self::Ident,
        }
    }
}

/// A lexed token: kind, original literal text and its 1-based source
/// position. The file name handle is shared by every token of a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: usize,
    pub column: usize,
    pub file: Option<Arc<str>>,
}

impl Token {
    #[must_use]
    pub fn new(
        kind: TokenKind,
        literal: impl Into<String>,
        line: usize,
        column: usize,
        file: Option<Arc<str>>,
    ) -> Self {
        Self {
            kind,
            literal: literal.into(),
            line,
            column,
            file,
        }
    }

    /// Placeholder token for synthesized nodes (builtin signatures and the
    /// like) that have no source position.
    #[must_use]
    pub fn synthetic(kind: TokenKind, literal: impl Into<String>) -> Self {
        Self::new(kind, literal, 0, 0, None)
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::synthetic(TokenKind::Illegal, "")
    }
}
