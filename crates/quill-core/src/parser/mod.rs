//! Recursive-descent parser for Quill
//!
//! Precedence, lowest to highest: assignment, `||`, `&&`, equality,
//! comparison, additive, multiplicative, unary (`!`, `-`), postfix
//! (`.prop`, `[index]`, `(args)`), primary. Statement dispatch is keyword
//! driven and a trailing `;` is always optional.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{BinaryOp, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp},
    lexer::{tokenize, Token, TokenKind},
    QuillError,
};

/// A syntax error with the line it was detected on
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
}

type ParseResult<T> = std::result::Result<T, ParseError>;

/// Deepest combined nesting of expressions, blocks and `else if` chains
pub const MAX_NESTING: usize = 100;

/// Lex and parse a complete script
pub fn parse_source(source: &str) -> crate::Result<Program> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse().map_err(QuillError::from)
}

/// Parser over a token stream with one token of lookahead
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let line = tokens.last().map(|t| t.line).unwrap_or(1);
            tokens.push(Token::new("EndOfFile", TokenKind::Eof, line, 1));
        }
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// Parse statements until end of input
    pub fn parse(mut self) -> ParseResult<Program> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::Eof) {
            statements.push(self.statement()?);
        }
        debug!(count = statements.len(), "parsed program");
        Ok(Program { statements })
    }

    fn current(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.position.min(last)]
    }

    fn peek(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + offset).min(last)]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn check_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current().kind)
    }

    fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn consume(&mut self, expected: TokenKind) -> ParseResult<Token> {
        let token = self.current();
        if token.kind != expected {
            return Err(ParseError {
                message: format!(
                    "Expected {}, but found {} on line {}",
                    expected, token.kind, token.line
                ),
                line: token.line,
            });
        }
        Ok(self.bump())
    }

    fn skip_semicolon(&mut self) {
        if self.check(TokenKind::Semicolon) {
            self.bump();
        }
    }

    /// Run a recursive production one level deeper, failing past `MAX_NESTING`
    fn nested<T>(&mut self, production: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            let line = self.current().line;
            return Err(ParseError {
                message: format!("Expression nested too deeply (limit {MAX_NESTING}) on line {line}"),
                line,
            });
        }
        self.depth += 1;
        let result = production(self);
        self.depth -= 1;
        result
    }

    fn unexpected(&self) -> ParseError {
        let token = self.current();
        ParseError {
            message: format!("Unexpected token: {} at line {}", token.kind, token.line),
            line: token.line,
        }
    }

    // === Statements ===

    fn statement(&mut self) -> ParseResult<Stmt> {
        match self.current().kind {
            TokenKind::Let | TokenKind::Const => self.variable_declaration(),
            TokenKind::Func | TokenKind::Function => self.function_declaration(),
            TokenKind::Return => self.return_statement(),
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Break | TokenKind::Continue => {
                let token = self.bump();
                self.skip_semicolon();
                let kind = if token.kind == TokenKind::Break {
                    StmtKind::Break
                } else {
                    StmtKind::Continue
                };
                Ok(Stmt::new(kind, token.line, token.column))
            }
            TokenKind::Try => self.try_statement(),
            TokenKind::OnEvent => self.event_handler(),
            TokenKind::Identifier if self.at_on_handler() => self.event_handler(),
            _ => {
                let expr = self.expression()?;
                self.skip_semicolon();
                let (line, column) = (expr.line, expr.column);
                Ok(Stmt::new(StmtKind::Expression(expr), line, column))
            }
        }
    }

    /// `on(name) {` is an event handler; any other use of `on` is a call
    fn at_on_handler(&self) -> bool {
        self.current().text == "on"
            && self.peek(1).kind == TokenKind::OpenParen
            && self.peek(2).kind == TokenKind::Identifier
            && self.peek(3).kind == TokenKind::CloseParen
            && self.peek(4).kind == TokenKind::OpenBrace
    }

    fn variable_declaration(&mut self) -> ParseResult<Stmt> {
        let keyword = self.bump();
        let name = self.consume(TokenKind::Identifier)?;
        self.consume(TokenKind::Equals)?;
        let value = self.expression()?;
        self.skip_semicolon();
        Ok(Stmt::new(
            StmtKind::VariableDeclaration {
                name: name.text,
                value,
                is_const: keyword.kind == TokenKind::Const,
            },
            keyword.line,
            keyword.column,
        ))
    }

    fn function_declaration(&mut self) -> ParseResult<Stmt> {
        let keyword = self.bump();
        let name = self.consume(TokenKind::Identifier)?;
        self.consume(TokenKind::OpenParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::CloseParen) {
            loop {
                if self.check(TokenKind::Comma) {
                    self.bump();
                }
                params.push(self.consume(TokenKind::Identifier)?.text);
                if !self.check(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::CloseParen)?;
        let body = self.block()?;
        Ok(Stmt::new(
            StmtKind::FunctionDeclaration {
                name: name.text,
                params,
                body: Arc::from(body),
            },
            keyword.line,
            keyword.column,
        ))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.consume(TokenKind::Return)?;
        let value = if self.check_any(&[TokenKind::Semicolon, TokenKind::CloseBrace, TokenKind::Eof])
        {
            None
        } else {
            Some(self.expression()?)
        };
        self.skip_semicolon();
        Ok(Stmt::new(StmtKind::Return(value), keyword.line, keyword.column))
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.consume(TokenKind::If)?;
        let condition = self.expression()?;
        let then_body = self.block()?;
        let else_body = if self.check(TokenKind::Else) {
            self.bump();
            if self.check(TokenKind::If) {
                Some(vec![self.nested(Self::if_statement)?])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_body,
                else_body,
            },
            keyword.line,
            keyword.column,
        ))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.consume(TokenKind::While)?;
        let condition = self.expression()?;
        let body = self.block()?;
        Ok(Stmt::new(
            StmtKind::While { condition, body },
            keyword.line,
            keyword.column,
        ))
    }

    fn for_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.consume(TokenKind::For)?;
        let variable = self.consume(TokenKind::Identifier)?.text;
        self.consume(TokenKind::In)?;
        let iterable = self.expression()?;
        let body = self.block()?;
        Ok(Stmt::new(
            StmtKind::For {
                variable,
                iterable,
                body,
            },
            keyword.line,
            keyword.column,
        ))
    }

    fn try_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.consume(TokenKind::Try)?;
        let try_body = self.block()?;
        self.consume(TokenKind::Catch)?;
        let error_var = if self.check(TokenKind::OpenParen) {
            self.bump();
            let name = self.consume(TokenKind::Identifier)?.text;
            self.consume(TokenKind::CloseParen)?;
            name
        } else {
            self.consume(TokenKind::Identifier)?.text
        };
        let catch_body = self.block()?;
        Ok(Stmt::new(
            StmtKind::Try {
                try_body,
                error_var,
                catch_body,
            },
            keyword.line,
            keyword.column,
        ))
    }

    fn event_handler(&mut self) -> ParseResult<Stmt> {
        let keyword = self.bump();
        self.consume(TokenKind::OpenParen)?;
        let event_name = self.consume(TokenKind::Identifier)?.text;
        self.consume(TokenKind::CloseParen)?;
        let body = self.block()?;
        Ok(Stmt::new(
            StmtKind::EventHandler {
                event_name,
                body: Arc::from(body),
            },
            keyword.line,
            keyword.column,
        ))
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.nested(Self::block_body)
    }

    fn block_body(&mut self) -> ParseResult<Vec<Stmt>> {
        self.consume(TokenKind::OpenBrace)?;
        let mut statements = Vec::new();
        while !self.check(TokenKind::CloseBrace) && !self.check(TokenKind::Eof) {
            statements.push(self.statement()?);
        }
        self.consume(TokenKind::CloseBrace)?;
        Ok(statements)
    }

    // === Expressions ===

    pub fn expression(&mut self) -> ParseResult<Expr> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let target = self.logical_or()?;
        if self.check(TokenKind::Equals) {
            let equals = self.bump();
            let value = self.expression()?;
            return Ok(Expr::new(
                ExprKind::Assignment {
                    target: Box::new(target),
                    value: Box::new(value),
                },
                equals.line,
                equals.column,
            ));
        }
        Ok(target)
    }

    /// Parse one left-associative binary precedence level
    fn binary_level(
        &mut self,
        operators: &[(TokenKind, BinaryOp)],
        next: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let mut left = next(self)?;
        while let Some(&(_, op)) = operators
            .iter()
            .find(|(kind, _)| *kind == self.current().kind)
        {
            let token = self.bump();
            let right = next(self)?;
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                token.line,
                token.column,
            );
        }
        Ok(left)
    }

    fn logical_or(&mut self) -> ParseResult<Expr> {
        self.binary_level(&[(TokenKind::Or, BinaryOp::Or)], Self::logical_and)
    }

    fn logical_and(&mut self) -> ParseResult<Expr> {
        self.binary_level(&[(TokenKind::And, BinaryOp::And)], Self::equality)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.binary_level(
            &[
                (TokenKind::EqualsEquals, BinaryOp::Equal),
                (TokenKind::BangEquals, BinaryOp::NotEqual),
            ],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.binary_level(
            &[
                (TokenKind::Greater, BinaryOp::Greater),
                (TokenKind::GreaterEquals, BinaryOp::GreaterEqual),
                (TokenKind::Less, BinaryOp::Less),
                (TokenKind::LessEquals, BinaryOp::LessEqual),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> ParseResult<Expr> {
        self.binary_level(
            &[
                (TokenKind::Plus, BinaryOp::Add),
                (TokenKind::Minus, BinaryOp::Subtract),
            ],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> ParseResult<Expr> {
        self.binary_level(
            &[
                (TokenKind::Star, BinaryOp::Multiply),
                (TokenKind::Slash, BinaryOp::Divide),
                (TokenKind::Percent, BinaryOp::Modulo),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = match self.current().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Negate,
            _ => return self.postfix(),
        };
        let token = self.bump();
        let operand = self.nested(Self::unary)?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            token.line,
            token.column,
        ))
    }

    fn postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            match self.current().kind {
                TokenKind::Dot => {
                    let dot = self.bump();
                    let property = self.consume(TokenKind::Identifier)?.text;
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            property,
                        },
                        dot.line,
                        dot.column,
                    );
                }
                TokenKind::OpenBracket => {
                    let bracket = self.bump();
                    let index = self.expression()?;
                    self.consume(TokenKind::CloseBracket)?;
                    expr = Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        bracket.line,
                        bracket.column,
                    );
                }
                TokenKind::OpenParen => {
                    let paren = self.bump();
                    let args = self.comma_list(TokenKind::CloseParen)?;
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        paren.line,
                        paren.column,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Comma-separated expressions up to and including `close`.
    /// A stray comma before an element is tolerated.
    fn comma_list(&mut self, close: TokenKind) -> ParseResult<Vec<Expr>> {
        let mut items = Vec::new();
        if !self.check(close) {
            loop {
                if self.check(TokenKind::Comma) {
                    self.bump();
                }
                items.push(self.expression()?);
                if !self.check(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(close)?;
        Ok(items)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.current().clone();
        let kind = match token.kind {
            TokenKind::Number => {
                self.bump();
                let value = token.text.parse::<f64>().map_err(|_| ParseError {
                    message: format!("Invalid number literal '{}' on line {}", token.text, token.line),
                    line: token.line,
                })?;
                ExprKind::Number(value)
            }
            TokenKind::StringLiteral => {
                self.bump();
                ExprKind::String(token.text.clone())
            }
            TokenKind::True => {
                self.bump();
                ExprKind::Boolean(true)
            }
            TokenKind::False => {
                self.bump();
                ExprKind::Boolean(false)
            }
            TokenKind::Null => {
                self.bump();
                ExprKind::Null
            }
            TokenKind::Identifier => {
                self.bump();
                ExprKind::Identifier(token.text.clone())
            }
            TokenKind::OpenParen => {
                self.bump();
                let expr = self.expression()?;
                self.consume(TokenKind::CloseParen)?;
                return Ok(expr);
            }
            TokenKind::OpenBracket => {
                self.bump();
                ExprKind::List(self.comma_list(TokenKind::CloseBracket)?)
            }
            TokenKind::OpenBrace => {
                self.bump();
                ExprKind::Map(self.map_entries()?)
            }
            TokenKind::New => {
                self.bump();
                self.consume(TokenKind::Scope)?;
                self.consume(TokenKind::OpenParen)?;
                ExprKind::ScopeCreation(self.comma_list(TokenKind::CloseParen)?)
            }
            _ => return Err(self.unexpected()),
        };
        Ok(Expr::new(kind, token.line, token.column))
    }

    fn map_entries(&mut self) -> ParseResult<Vec<(String, Expr)>> {
        let mut entries = Vec::new();
        if !self.check(TokenKind::CloseBrace) {
            loop {
                if self.check(TokenKind::Comma) {
                    self.bump();
                }
                let key = match self.current().kind {
                    TokenKind::Identifier | TokenKind::StringLiteral => self.bump().text,
                    found => {
                        let line = self.current().line;
                        return Err(ParseError {
                            message: format!(
                                "Expected identifier or string as map key, but found {found} on line {line}"
                            ),
                            line,
                        });
                    }
                };
                self.consume(TokenKind::Colon)?;
                let value = self.expression()?;
                entries.push((key, value));
                if !self.check(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::CloseBrace)?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests;
