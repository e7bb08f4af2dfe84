pub mod ast;
pub mod ast_printer;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use std::io::Write;

use log::{debug, info};

use crate::ast::{ExprId, Stmt};
use crate::error::{Failure, LoxError};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::value::Value;

/// An interpreter session: scanner → parser → resolver → interpreter, with
/// global state kept between runs.
///
/// Each phase hands its product (or its diagnostics) to the next; a phase
/// that reports anything stops the pipeline before interpretation.
pub struct Lox {
    interpreter: Interpreter,
    resolver: Resolver,
    next_id: ExprId,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// A session printing to stdout.
    pub fn new() -> Self {
        Self::from_interpreter(Interpreter::new())
    }

    /// A session printing to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        Self::from_interpreter(Interpreter::with_output(output))
    }

    fn from_interpreter(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            resolver: Resolver::new(),
            next_id: ExprId(0),
        }
    }

    /// Seed a host function into the globals.  Call before running user code.
    pub fn define_native<F>(&mut self, name: &str, arity: usize, func: F) -> &mut Self
    where
        F: Fn(&[Value]) -> std::result::Result<Value, String> + 'static,
    {
        self.interpreter.define_native(name, arity, func);
        self
    }

    /// Run a whole program.
    pub fn run_script(&mut self, source: &str) -> Result<(), Failure> {
        info!("Running script ({} bytes)", source.len());
        self.run(source)
    }

    /// Run one line of interactive input.  Declarations persist into later
    /// lines; a failing line leaves the session usable.
    pub fn run_line(&mut self, line: &str) -> Result<(), Failure> {
        debug!("Running REPL line: {}", line.trim_end());
        self.run(line)
    }

    /// Scan, parse and resolve without executing anything.
    pub fn check(&mut self, source: &str) -> Result<Vec<Stmt>, Failure> {
        let (tokens, lex_errors) = scanner::scan_tokens(source);

        let mut parser = Parser::new(&tokens).starting_at(self.next_id);
        let parsed = parser.parse();
        self.next_id = parser.next_id();

        let statements: Vec<Stmt> = match parsed {
            Ok(statements) if lex_errors.is_empty() => statements,
            Ok(_) => return Err(Failure::Static(lex_errors)),
            Err(parse_errors) => {
                let mut errors: Vec<LoxError> = lex_errors;
                errors.extend(parse_errors);
                return Err(Failure::Static(errors));
            }
        };

        let locals = self.resolver.resolve(&statements).map_err(Failure::Static)?;
        self.interpreter.resolve(locals);

        Ok(statements)
    }

    fn run(&mut self, source: &str) -> Result<(), Failure> {
        let statements: Vec<Stmt> = self.check(source)?;

        self.interpreter
            .interpret(&statements)
            .map_err(Failure::Runtime)
    }
}
