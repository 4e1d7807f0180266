use std::fmt;

use serde::{Deserialize, Serialize};

/// Kinds of tokens produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    Number,
    StringLiteral,
    True,
    False,
    Null,

    Identifier,

    // Keywords
    Let,
    Const,
    Func,
    Function,
    Return,
    If,
    Else,
    For,
    In,
    While,
    Break,
    Continue,
    New,
    Scope,
    OnEvent,
    Try,
    Catch,
    Import,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equals,
    EqualsEquals,
    BangEquals,
    Greater,
    Less,
    GreaterEquals,
    LessEquals,
    And,
    Or,
    Bang,

    // Delimiters
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Comma,
    Dot,
    Semicolon,
    Colon,

    Eof,
}

impl TokenKind {
    /// Look up the keyword kind for an identifier, if it is reserved
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "func" => TokenKind::Func,
            "function" => TokenKind::Function,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "new" => TokenKind::New,
            "Scope" => TokenKind::Scope,
            "OnEvent" => TokenKind::OnEvent,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "import" => TokenKind::Import,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether a token of this kind can end an operand.
    ///
    /// A `-` directly after such a token is a binary minus; anywhere else a
    /// `-` followed by a digit starts a negative number literal.
    pub fn ends_operand(self) -> bool {
        matches!(
            self,
            TokenKind::Number
                | TokenKind::StringLiteral
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Identifier
                | TokenKind::CloseParen
                | TokenKind::CloseBracket
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Eof => write!(f, "EOF"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// A single lexed token with its source position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Source text (string literals hold their unescaped contents)
    pub text: String,
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind, line: usize, column: usize) -> Self {
        Self {
            text: text.into(),
            kind,
            line,
            column,
        }
    }
}
