//! Lexer for Quill source text
//!
//! Turns source into a flat token stream terminated by [`TokenKind::Eof`].
//! Whitespace and `//` / `/* */` comments are skipped. Every token records the
//! line and column it started on.

mod token;

pub use token::{Token, TokenKind};

use thiserror::Error;
use tracing::debug;

/// A tokenization failure with the position it was detected at
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} at line {line}, column {column}")]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Tokenize a complete source string
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let tokens = Lexer::new(source).tokenize()?;
    debug!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}

/// Character-level scanner state
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    /// Consume the lexer and produce every token in the source
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(c) = self.current() {
            if c == '/' && self.peek(1) == Some('/') {
                self.skip_line_comment();
                continue;
            }
            if c == '/' && self.peek(1) == Some('*') {
                self.skip_block_comment()?;
                continue;
            }

            match c {
                '(' => self.single(TokenKind::OpenParen),
                ')' => self.single(TokenKind::CloseParen),
                '{' => self.single(TokenKind::OpenBrace),
                '}' => self.single(TokenKind::CloseBrace),
                '[' => self.single(TokenKind::OpenBracket),
                ']' => self.single(TokenKind::CloseBracket),
                ',' => self.single(TokenKind::Comma),
                '.' => self.single(TokenKind::Dot),
                ';' => self.single(TokenKind::Semicolon),
                ':' => self.single(TokenKind::Colon),
                '+' => self.single(TokenKind::Plus),
                '*' => self.single(TokenKind::Star),
                '/' => self.single(TokenKind::Slash),
                '%' => self.single(TokenKind::Percent),
                '=' => self.one_or_two('=', TokenKind::Equals, TokenKind::EqualsEquals),
                '!' => self.one_or_two('=', TokenKind::Bang, TokenKind::BangEquals),
                '>' => self.one_or_two('=', TokenKind::Greater, TokenKind::GreaterEquals),
                '<' => self.one_or_two('=', TokenKind::Less, TokenKind::LessEquals),
                '&' => self.doubled('&', TokenKind::And)?,
                '|' => self.doubled('|', TokenKind::Or)?,
                '-' => {
                    let starts_number = self.peek(1).is_some_and(|n| n.is_ascii_digit())
                        && !self.previous_ends_operand();
                    if starts_number {
                        self.number()?;
                    } else {
                        self.single(TokenKind::Minus);
                    }
                }
                '"' | '\'' => self.string()?,
                c if c.is_ascii_digit() => self.number()?,
                c if c.is_alphabetic() || c == '_' => self.identifier(),
                ' ' | '\t' | '\r' | '\n' => self.advance(),
                other => {
                    return Err(self.error(format!("Unrecognised character in source: {other}")))
                }
            }
        }

        self.tokens
            .push(Token::new("EndOfFile", TokenKind::Eof, self.line, self.column));
        Ok(self.tokens)
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            line: self.line,
            column: self.column,
        }
    }

    fn previous_ends_operand(&self) -> bool {
        self.tokens
            .last()
            .is_some_and(|token| token.kind.ends_operand())
    }

    fn push(&mut self, text: String, kind: TokenKind, line: usize, column: usize) {
        self.tokens.push(Token::new(text, kind, line, column));
    }

    fn single(&mut self, kind: TokenKind) {
        let (line, column) = (self.line, self.column);
        let text = self.current().map(String::from).unwrap_or_default();
        self.advance();
        self.push(text, kind, line, column);
    }

    fn one_or_two(&mut self, second: char, one: TokenKind, two: TokenKind) {
        if self.peek(1) == Some(second) {
            let (line, column) = (self.line, self.column);
            let mut text = String::new();
            for _ in 0..2 {
                if let Some(c) = self.current() {
                    text.push(c);
                }
                self.advance();
            }
            self.push(text, two, line, column);
        } else {
            self.single(one);
        }
    }

    fn doubled(&mut self, c: char, kind: TokenKind) -> Result<(), LexError> {
        if self.peek(1) != Some(c) {
            return Err(self.error(format!("Unrecognised character in source: {c}")));
        }
        let (line, column) = (self.line, self.column);
        self.advance();
        self.advance();
        self.push(format!("{c}{c}"), kind, line, column);
        Ok(())
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current() {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        self.advance();
        self.advance();
        loop {
            match (self.current(), self.peek(1)) {
                (Some('*'), Some('/')) => {
                    self.advance();
                    self.advance();
                    return Ok(());
                }
                (Some(_), _) => self.advance(),
                (None, _) => {
                    return Err(LexError {
                        message: "Unterminated multi-line comment".to_string(),
                        line,
                        column,
                    })
                }
            }
        }
    }

    fn string(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        let quote = self.current().unwrap_or('"');
        self.advance();

        let mut value = String::new();
        loop {
            match self.current() {
                None => {
                    return Err(self.error(
                        "Unterminated string literal: reached end of file before closing quote",
                    ))
                }
                Some('\n') | Some('\r') => {
                    return Err(self.error(
                        "Unterminated string literal: newline found before closing quote",
                    ))
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    if let Some(escaped) = self.current() {
                        value.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            other => other,
                        });
                        self.advance();
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        self.push(value, TokenKind::StringLiteral, line, column);
        Ok(())
    }

    fn number(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        if self.current() == Some('-') {
            text.push('-');
            self.advance();
        }

        let mut seen_dot = false;
        while let Some(c) = self.current() {
            if c == '.' {
                if seen_dot {
                    break;
                }
                seen_dot = true;
            } else if !c.is_ascii_digit() {
                break;
            }
            text.push(c);
            self.advance();
        }

        if text.parse::<f64>().is_err() {
            return Err(LexError {
                message: format!("Invalid number literal: {text}"),
                line,
                column,
            });
        }
        self.push(text, TokenKind::Number, line, column);
        Ok(())
    }

    fn identifier(&mut self) {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        while let Some(c) = self.current() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            text.push(c);
            self.advance();
        }
        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier);
        self.push(text, kind, line, column);
    }
}

#[cfg(test)]
mod tests;
