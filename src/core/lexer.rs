use std::iter::Peekable;

use log::trace;
use owned_chars::OwnedChars;

use super::{Token, TokenKind};

/// Turns source text into tokens, one at a time.
///
/// `Lexer` is an iterator: the parser pulls the next token only when it
/// needs it. The stream always ends with exactly one `Eof` token, unless
/// scanning hits something it cannot make sense of, in which case it ends
/// with a single `Illegal` token whose literal describes the problem.
/// Nothing is produced after either.
pub struct Lexer {
    // Scratch pad for the token being scanned
    scratch: String,
    chars: Peekable<OwnedChars>,
    finished: bool,
}

impl Lexer {
    /// Creates a new `Lexer` that owns `source`.
    #[must_use]
    pub fn new(source: String) -> Self {
        Lexer {
            scratch: String::with_capacity(64),
            chars: OwnedChars::from_string(source).peekable(),
            finished: false,
        }
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();
        self.scratch.clear();

        let c = match self.advance() {
            Some(c) => c,
            None => {
                self.finished = true;
                return Token::eof();
            }
        };

        match c {
            '*' => self.add_token(TokenKind::Star),
            ',' => self.add_token(TokenKind::Comma),
            '>' => self.add_token(TokenKind::Greater),
            '{' => self.add_token(TokenKind::LeftBrace),
            '(' => self.add_token(TokenKind::LeftParen),
            '<' => self.add_token(TokenKind::Less),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            '}' => self.add_token(TokenKind::RightBrace),
            ')' => self.add_token(TokenKind::RightParen),
            ';' => self.add_token(TokenKind::Semicolon),
            '/' => self.add_token(TokenKind::Slash),
            '=' => self.compound_equal_operator(TokenKind::EqualEqual, TokenKind::Equal),
            '!' => self.compound_equal_operator(TokenKind::BangEqual, TokenKind::Bang),
            '"' => self.string(),
            c if c.is_alphabetic() => self.identifier(),
            c if c.is_ascii_digit() => self.number(),
            c => self.illegal(format!("illegal character '{}'", c)),
        }
    }

    fn compound_equal_operator(&mut self, yes: TokenKind, no: TokenKind) -> Token {
        if let Some('=') = self.peek() {
            self.advance();
            self.add_token(yes)
        } else {
            self.add_token(no)
        }
    }

    fn identifier(&mut self) -> Token {
        while self.peek().map_or(false, char::is_alphabetic) {
            self.advance();
        }

        self.add_token(TokenKind::keyword(&self.scratch))
    }

    fn number(&mut self) -> Token {
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        self.add_token(TokenKind::Int)
    }

    /// Scans the body of a string literal. The opening quote has already been
    /// consumed; the literal keeps neither quote.
    fn string(&mut self) -> Token {
        self.scratch.clear();

        loop {
            match self.chars.next() {
                Some('"') => return self.add_token(TokenKind::String),
                Some(c) => self.scratch.push(c),
                None => {
                    let message = format!("unterminated string \"{}", self.scratch);
                    return self.illegal(message);
                }
            }
        }
    }

    fn illegal(&mut self, message: String) -> Token {
        self.finished = true;
        Token::new(TokenKind::Illegal, message)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.chars.next();
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next().map(|c| {
            self.scratch.push(c);
            c
        })
    }

    fn add_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, String::from(&self.scratch))
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let token = self.scan_token();
        trace!("{}", token);
        Some(token)
    }
}

/// Scans all of `source` up front.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source.to_owned()).collect()
}
