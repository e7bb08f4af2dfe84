//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  Static
//! phases (scanner, parser, resolver) *collect* their diagnostics and hand
//! them back as a list; the runtime aborts on its first [`RuntimeError`].
//!
//! The module **does not** print diagnostics itself.

use std::fmt;
use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.  `location` is either ` at 'lexeme'` or
    /// ` at end`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static‑analysis failure found by the resolver.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**, located at `token`.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            location: location_of(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**, located at `token`.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            location: location_of(token),
            line: token.line,
        }
    }

    /// Source line the diagnostic points at, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. } => Some(*line),
            LoxError::Runtime(e) => Some(e.line),
            LoxError::Io(_) | LoxError::Utf8(_) => None,
        }
    }
}

fn location_of(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// A failure raised while executing a program.  Aborts the current run.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}\n[line {line}]")]
pub struct RuntimeError {
    pub message: String,
    pub line: usize,
}

impl RuntimeError {
    /// Build an error pointing at the line of `token`.
    pub fn new<S: Into<String>>(token: &Token, msg: S) -> Self {
        Self {
            message: msg.into(),
            line: token.line,
        }
    }
}

/// Why a run did not complete.
///
/// `Static` carries every diagnostic produced by the scanner, parser or
/// resolver (interpretation never started); `Runtime` carries the single
/// error that aborted interpretation.
#[derive(Debug)]
pub enum Failure {
    Static(Vec<LoxError>),
    Runtime(LoxError),
}

impl Failure {
    /// Process exit code the driver reports for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Failure::Static(_) => 65,
            Failure::Runtime(_) => 70,
        }
    }

    /// The individual diagnostics, in report order.
    pub fn errors(&self) -> &[LoxError] {
        match self {
            Failure::Static(errors) => errors,
            Failure::Runtime(error) => std::slice::from_ref(error),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for Failure {}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
