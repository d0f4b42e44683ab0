use std::str::Chars;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Ident,
    Number,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Comma,

    // Delimiters
    LParen,
    RParen,

    // Special
    Eof,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: Chars<'a>,
    pos: usize,
    current: Option<char>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let current = chars.next();
        Self {
            source,
            chars,
            pos: 0,
            current,
        }
    }

    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current;
        self.current = self.chars.next();
        if let Some(c) = c {
            self.pos += c.len_utf8();
        }
        c
    }

    fn peek(&self) -> Option<char> {
        self.current
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_digits(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;

        // Integer part
        self.skip_digits();

        // Decimal part
        if self.peek() == Some('.') {
            self.advance();
            self.skip_digits();
        }

        // Exponent, only when followed by digits (optionally signed)
        if matches!(self.peek(), Some('e' | 'E')) {
            let mut chars = self.chars.clone();
            let next = chars.next();
            let after_sign = chars.next();
            let has_exponent = match next {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => after_sign.is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if has_exponent {
                self.advance(); // e
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                self.skip_digits();
            }
        }

        Token::new(
            TokenKind::Number,
            Span::new(start, self.pos),
            &self.source[start..self.pos],
        )
    }

    fn read_ident(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        Token::new(
            TokenKind::Ident,
            Span::new(start, self.pos),
            &self.source[start..self.pos],
        )
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let start = self.pos;
        self.advance();
        Token::new(kind, Span::new(start, self.pos), &self.source[start..self.pos])
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.pos;

        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, Span::new(start, start), "");
        };

        match c {
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' => {
                // `**` is accepted as a power operator
                if self.peek_next() == Some('*') {
                    self.advance();
                    self.advance();
                    return Token::new(TokenKind::Caret, Span::new(start, self.pos), "**");
                }
                self.single(TokenKind::Star)
            }
            '/' => self.single(TokenKind::Slash),
            '^' => self.single(TokenKind::Caret),
            ',' => self.single(TokenKind::Comma),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '.' if self.peek_next().is_some_and(|n| n.is_ascii_digit()) => self.read_number(),
            c if c.is_ascii_digit() => self.read_number(),
            c if c.is_alphabetic() || c == '_' => self.read_ident(),
            _ => self.single(TokenKind::Error),
        }
    }
}
