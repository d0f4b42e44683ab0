use std::collections::HashMap;

use thiserror::Error;

use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::lexer::{Lexer, Span, Token, TokenKind};
use crate::symbol::Symbol;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Unknown symbol '{name}' at position {span:?}")]
    UnknownSymbol { name: String, span: Span },
    #[error("Unknown function '{name}' at position {span:?}")]
    UnknownFunction { name: String, span: Span },
    #[error("Function '{name}' takes {expected} argument(s), found {found}")]
    WrongArity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Expression nested deeper than {limit} levels at position {span:?}")]
    TooDeep { limit: usize, span: Span },
}

/// Nesting limit for parentheses, unary signs, exponents and call arguments
pub const MAX_DEPTH: usize = 128;

/// Names visible to the parser.
///
/// Inserting a symbol whose name is already present shadows the earlier one.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    symbols: HashMap<String, Symbol>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol.name().to_string(), symbol);
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl FromIterator<Symbol> for Scope {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        let mut scope = Scope::new();
        for symbol in iter {
            scope.insert(symbol);
        }
        scope
    }
}

/// Recursive descent parser for infix expressions.
///
/// Grammar, lowest precedence first:
///
/// ```text
/// expr      := term (("+" | "-") term)*
/// term      := unary (("*" | "/") unary)*
/// unary     := ("-" | "+") unary | power
/// power     := primary ("^" unary)?
/// primary   := number | ident | ident "(" args ")" | "(" expr ")"
/// ```
pub struct Parser<'s> {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    scope: &'s Scope,
}

impl<'s> Parser<'s> {
    pub fn new(tokens: Vec<Token>, scope: &'s Scope) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            scope,
        }
    }

    pub fn parse(source: &str, scope: &Scope) -> Result<Expr, ParseError> {
        let tokens = Lexer::tokenize(source);
        let mut parser = Parser::new(tokens, scope);
        let expr = parser.parse_expr()?;
        parser.expect(TokenKind::Eof)?;
        Ok(expr)
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, self.end_span(), ""));
        self.pos += 1;
        token
    }

    fn end_span(&self) -> Span {
        let end = self.tokens.last().map(|t| t.span.end).unwrap_or(0);
        Span::new(end, end)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let (found, span) = match self.current() {
            Some(t) => (format!("{:?}", t.kind), t.span),
            None => ("Eof".to_string(), self.end_span()),
        };
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found,
            span,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("{:?}", kind)))
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expr::binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::binary(left, op, right);
        }

        Ok(left)
    }

    // Every nested construct re-enters here, so this bounds the recursion.
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.depth >= MAX_DEPTH {
            let span = self.current().map(|t| t.span).unwrap_or_else(|| self.end_span());
            return Err(ParseError::TooDeep {
                limit: MAX_DEPTH,
                span,
            });
        }
        self.depth += 1;
        let result = self.parse_signed();
        self.depth -= 1;
        result
    }

    fn parse_signed(&mut self) -> Result<Expr, ParseError> {
        match self.peek_kind() {
            TokenKind::Minus => {
                self.advance();
                Ok(Expr::unary(UnaryOp::Neg, self.parse_unary()?))
            }
            TokenKind::Plus => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_primary()?;
        if self.peek_kind() == TokenKind::Caret {
            self.advance();
            // Right-associative: the exponent may itself contain `^`
            let exponent = self.parse_unary()?;
            return Ok(Expr::binary(base, BinaryOp::Pow, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek_kind() {
            TokenKind::Number => {
                let token = self.advance();
                let value: f64 = token
                    .text
                    .parse()
                    .map_err(|_| ParseError::InvalidNumber(token.text.clone()))?;
                Ok(Expr::Constant(value))
            }
            TokenKind::Ident => {
                let token = self.advance();
                if self.peek_kind() == TokenKind::LParen {
                    self.parse_call(token)
                } else {
                    self.resolve_ident(token)
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected("number, identifier, or (")),
        }
    }

    fn resolve_ident(&self, token: Token) -> Result<Expr, ParseError> {
        if let Some(symbol) = self.scope.get(&token.text) {
            return Ok(Expr::symbol(symbol));
        }
        match token.text.as_str() {
            "pi" => Ok(Expr::Constant(std::f64::consts::PI)),
            "e" => Ok(Expr::Constant(std::f64::consts::E)),
            _ => Err(ParseError::UnknownSymbol {
                name: token.text.clone(),
                span: token.span,
            }),
        }
    }

    fn parse_call(&mut self, name: Token) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.peek_kind() != TokenKind::RParen {
            loop {
                args.push(self.parse_expr()?);
                if self.peek_kind() == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let found = args.len();
        let wrong_arity = |expected: usize| ParseError::WrongArity {
            name: name.text.clone(),
            expected,
            found,
        };

        if let Some(op) = UnaryOp::from_function_name(&name.text) {
            return match (found, args.pop()) {
                (1, Some(arg)) => Ok(Expr::unary(op, arg)),
                _ => Err(wrong_arity(1)),
            };
        }

        match name.text.as_str() {
            "pow" => match (found, args.pop(), args.pop()) {
                (2, Some(exponent), Some(base)) => Ok(Expr::binary(base, BinaryOp::Pow, exponent)),
                _ => Err(wrong_arity(2)),
            },
            _ => Err(ParseError::UnknownFunction {
                name: name.text.clone(),
                span: name.span,
            }),
        }
    }
}
