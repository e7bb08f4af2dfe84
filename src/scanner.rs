//! Lexer: source text in, [`Token`]s out.
//!
//! [`Scanner`] is a fused iterator over `Result<Token>`.  A lexical error is
//! yielded in place of the offending character and scanning resumes right
//! after it, so a single pass reports every bad character.  The stream always
//! ends with exactly one `EOF` token carrying the final line number.
//!
//! ```rust
//! use treelox::scanner::scan_tokens;
//!
//! let (tokens, errors) = scan_tokens("print 1.5; // done");
//! assert!(errors.is_empty());
//! assert_eq!(tokens.len(), 4);
//! ```

use std::iter::FusedIterator;

use log::{debug, info};
use memchr::memchr;
use phf::phf_map;

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"for"    => TokenType::FOR,
    b"fun"    => TokenType::FUN,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    /// First byte of the lexeme being scanned.
    start: usize,
    /// Next byte to look at.
    pos: usize,
    line: usize,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            bytes: source.as_bytes(),
            start: 0,
            pos: 0,
            line: 1,
            done: false,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Byte `offset` places ahead of `pos`, or `0` past the end.
    fn look(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn bump(&mut self) -> u8 {
        let byte = self.look(0);
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
        }
        byte
    }

    fn eat(&mut self, expected: u8) -> bool {
        let hit = !self.at_end() && self.look(0) == expected;
        if hit {
            self.pos += 1;
        }
        hit
    }

    /// `long` when the next byte is `=`, otherwise `short`.
    fn with_equal(&mut self, long: TokenType, short: TokenType) -> TokenType {
        if self.eat(b'=') {
            long
        } else {
            short
        }
    }

    /// Scan one lexeme starting at `self.start`.  `Ok(None)` means it was
    /// whitespace or a comment.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let kind = match self.bump() {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,

            b'!' => self.with_equal(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.with_equal(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.with_equal(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.with_equal(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' if self.eat(b'/') => {
                // Leave the newline for `bump` to count.
                self.pos = match memchr(b'\n', &self.bytes[self.pos..]) {
                    Some(offset) => self.pos + offset,
                    None => self.bytes.len(),
                };
                return Ok(None);
            }
            b'/' => TokenType::SLASH,

            b' ' | b'\r' | b'\t' | b'\n' => return Ok(None),

            b'"' => self.string()?,
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                let ch: char = self.source[self.start..]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                self.pos = self.start + ch.len_utf8();

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", ch),
                ));
            }
        };

        Ok(Some(kind))
    }

    /// String literal; may span lines.  The opening quote is already consumed.
    fn string(&mut self) -> Result<TokenType> {
        while !self.at_end() && self.look(0) != b'"' {
            self.bump();
        }

        if !self.eat(b'"') {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        let contents: &str = &self.source[self.start + 1..self.pos - 1];
        Ok(TokenType::STRING(contents.to_owned()))
    }

    /// Digits with an optional fraction.  A dot must have digits on both sides.
    fn number(&mut self) -> TokenType {
        let skip_digits = |scanner: &mut Self| {
            while scanner.look(0).is_ascii_digit() {
                scanner.pos += 1;
            }
        };

        skip_digits(self);
        if self.look(0) == b'.' && self.look(1).is_ascii_digit() {
            self.pos += 1;
            skip_digits(self);
        }

        let text: &str = &self.source[self.start..self.pos];
        TokenType::NUMBER(text.parse().unwrap_or_default())
    }

    fn identifier(&mut self) -> TokenType {
        while matches!(self.look(0), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.pos += 1;
        }

        KEYWORDS
            .get(&self.bytes[self.start..self.pos])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while !self.at_end() {
            self.start = self.pos;

            match self.scan_token() {
                Ok(Some(kind)) => {
                    debug!("Scanned {} on line {}", kind.name(), self.line);
                    let lexeme: &str = &self.source[self.start..self.pos];
                    return Some(Ok(Token::new(kind, lexeme, self.line)));
                }
                Ok(None) => {}
                Err(e) => return Some(Err(e)),
            }
        }

        self.done = true;
        Some(Ok(Token::new(TokenType::EOF, "", self.line)))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Drain a scanner over `source`, separating tokens from lexical errors.
pub fn scan_tokens(source: &str) -> (Vec<Token>, Vec<LoxError>) {
    let (tokens, errors): (Vec<_>, Vec<_>) = Scanner::new(source).partition(|item| item.is_ok());

    let tokens: Vec<Token> = tokens.into_iter().filter_map(|item| item.ok()).collect();
    let errors: Vec<LoxError> = errors.into_iter().filter_map(|item| item.err()).collect();

    info!(
        "Scanned {} tokens with {} error(s)",
        tokens.len(),
        errors.len()
    );

    (tokens, errors)
}
