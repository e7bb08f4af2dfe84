use std::fmt;
use std::mem;

use log::info;
use serde::Serialize;

/// Lexical category of a [`Token`].  Literal kinds carry their decoded value.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    // Single-character punctuation.
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,
    COMMA,
    DOT,
    MINUS,
    PLUS,
    SEMICOLON,
    SLASH,
    STAR,

    // One or two characters.
    BANG,
    BANG_EQUAL,
    EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,

    // Literals.  `STRING` holds the contents without quotes.
    IDENTIFIER,
    STRING(String),
    NUMBER(f64),

    // Keywords.
    AND,
    CLASS,
    ELSE,
    FALSE,
    FUN,
    FOR,
    IF,
    NIL,
    OR,
    PRINT,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VAR,
    WHILE,

    EOF,
}

impl TokenType {
    /// The kind's name as the tokenizer dump prints it.
    pub fn name(&self) -> &'static str {
        use TokenType::*;

        match self {
            LEFT_PAREN => "LEFT_PAREN",
            RIGHT_PAREN => "RIGHT_PAREN",
            LEFT_BRACE => "LEFT_BRACE",
            RIGHT_BRACE => "RIGHT_BRACE",
            COMMA => "COMMA",
            DOT => "DOT",
            MINUS => "MINUS",
            PLUS => "PLUS",
            SEMICOLON => "SEMICOLON",
            SLASH => "SLASH",
            STAR => "STAR",
            BANG => "BANG",
            BANG_EQUAL => "BANG_EQUAL",
            EQUAL => "EQUAL",
            EQUAL_EQUAL => "EQUAL_EQUAL",
            GREATER => "GREATER",
            GREATER_EQUAL => "GREATER_EQUAL",
            LESS => "LESS",
            LESS_EQUAL => "LESS_EQUAL",
            IDENTIFIER => "IDENTIFIER",
            STRING(_) => "STRING",
            NUMBER(_) => "NUMBER",
            AND => "AND",
            CLASS => "CLASS",
            ELSE => "ELSE",
            FALSE => "FALSE",
            FUN => "FUN",
            FOR => "FOR",
            IF => "IF",
            NIL => "NIL",
            OR => "OR",
            PRINT => "PRINT",
            RETURN => "RETURN",
            SUPER => "SUPER",
            THIS => "THIS",
            TRUE => "TRUE",
            VAR => "VAR",
            WHILE => "WHILE",
            EOF => "EOF",
        }
    }
}

/// Kinds compare by variant only; a `NUMBER(1.0)` matches any `NUMBER`.
impl PartialEq for TokenType {
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
}

/// One lexeme with its kind and 1-based source line.  Tokens own their text
/// so parsed declarations outlive the source buffer (the REPL relies on it).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    pub fn new<S: Into<String>>(token_type: TokenType, lexeme: S, line: usize) -> Self {
        let lexeme: String = lexeme.into();
        info!("New token {} '{}' on line {}", token_type.name(), lexeme, line);

        Self {
            token_type,
            lexeme,
            line,
        }
    }

    /// Decoded value of a `STRING` or `NUMBER` token.
    pub fn literal(&self) -> Option<Literal> {
        match &self.token_type {
            TokenType::STRING(s) => Some(Literal::Str(s.clone())),
            TokenType::NUMBER(n) => Some(Literal::Number(*n)),
            _ => None,
        }
    }
}

/// Numbers in the dump always show a fraction: `3` prints as `3.0`.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    let whole: bool = n.fract() == 0.0 && n.abs() < i64::MAX as f64;
    if !whole {
        return write!(f, "{}", n);
    }

    let mut buf = itoa::Buffer::new();
    write!(f, "{}.0", buf.format(n as i64))
}

/// `KIND lexeme literal`, with `null` for tokens that carry no literal.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.token_type.name(), self.lexeme)?;

        match self.literal() {
            Some(Literal::Str(s)) => write!(f, "{}", s),
            Some(Literal::Number(n)) => write_number(f, n),
            None => f.write_str("null"),
        }
    }
}
