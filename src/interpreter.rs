//! Tree‑walking evaluator.
//!
//! Statements execute to a [`Flow`]: either they completed normally or a
//! `return` is unwinding towards the nearest call boundary.  Failures travel
//! separately in the `Err` side of [`Result`], so a `return` is never mistaken
//! for an error and an error never stops at a call boundary.

use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::callable::{LoxFunction, NativeFunction};
use crate::class::{Instance, LoxClass};
use crate::environment::{self, EnvRef, Environment};
use crate::error::{Result, RuntimeError};
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::{Callable, Value};

/// Outcome of executing a statement that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: Locals,
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an interpreter printing to `output`, with native functions
    /// such as `clock` already defined.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Environment::new().into_ref();

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        };

        debug!("Defining native function 'clock'");
        interpreter.define_native("clock", 0, |_args: &[Value]| {
            let micros: i64 = Utc::now().timestamp_micros();
            Ok(Value::Number(micros as f64 / 1_000_000.0))
        });

        interpreter
    }

    /// Bind a host function in the global environment.
    pub fn define_native<F>(&mut self, name: &str, arity: usize, func: F)
    where
        F: Fn(&[Value]) -> std::result::Result<Value, String> + 'static,
    {
        let native = NativeFunction {
            name: name.to_string(),
            arity,
            func: Box::new(func),
        };

        self.globals
            .borrow_mut()
            .define(name, Value::Callable(Callable::Native(Rc::new(native))));
    }

    /// Merge a resolver table.  Tables from successive REPL lines accumulate.
    pub fn resolve(&mut self, locals: Locals) {
        debug!("Recording {} resolved binding(s)", locals.len());
        self.locals.extend(locals);
    }

    /// Interprets a list of statements (a "program").  Stops at the first
    /// failure.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Flow::Return(_) = self.execute(stmt)? {
                break;
            }
        }

        self.output.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ───────────────────────────── statements ──────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment: EnvRef =
                    Environment::with_enclosing(Rc::clone(&self.environment)).into_ref();
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let flow @ Flow::Return(_) = self.execute(body)? {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);
                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment.borrow_mut().define(
                    &decl.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let superclass: Option<Rc<LoxClass>> = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Callable(Callable::Class(class)) => Some(class),
                        _ => {
                            let token: &Token = match expr {
                                Expr::Variable {
                                    name: super_name, ..
                                } => super_name,
                                _ => name,
                            };
                            return Err(RuntimeError::new(token, "Superclass must be a class.").into());
                        }
                    },
                    None => None,
                };

                // Bound first so methods can refer to the class by name.
                self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

                let method_env: EnvRef = match &superclass {
                    Some(class) => {
                        let env: EnvRef =
                            Environment::with_enclosing(Rc::clone(&self.environment)).into_ref();
                        env.borrow_mut()
                            .define("super", Value::Callable(Callable::Class(Rc::clone(class))));
                        env
                    }
                    None => Rc::clone(&self.environment),
                };

                let mut table: HashMap<String, Rc<LoxFunction>> = HashMap::new();
                for method in methods {
                    let is_initializer: bool = method.name.lexeme == "init";
                    let function = LoxFunction::new(Rc::clone(method), Rc::clone(&method_env), is_initializer);
                    table.insert(method.name.lexeme.clone(), Rc::new(function));
                }

                let class = LoxClass::new(name.lexeme.clone(), superclass, table);
                debug!("Defined class {:?}", class);

                self.environment
                    .borrow_mut()
                    .assign(name, Value::Callable(Callable::Class(Rc::new(class))))?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` inside `environment`, restoring the current
    /// environment afterwards whatever the outcome.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<Flow> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, environment);

        let mut result: Result<Flow> = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    // ───────────────────────────── expressions ─────────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;
                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::new(operator, "Operand must be a number.").into()),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(RuntimeError::new(operator, "Invalid unary operator.").into()),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;
                Ok(binary(operator, left, right)?)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let short_circuit: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.lookup_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;
                match self.locals.get(id) {
                    Some(&distance) => {
                        environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let Value::Callable(callable) = callee else {
                    return Err(
                        RuntimeError::new(paren, "Can only call functions and classes.").into(),
                    );
                };

                if values.len() != callable.arity() {
                    let message = format!(
                        "Expected {} arguments but got {}.",
                        callable.arity(),
                        values.len()
                    );
                    return Err(RuntimeError::new(paren, message).into());
                }

                callable.call(self, values, paren)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),
                _ => Err(RuntimeError::new(name, "Only instances have properties.").into()),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::new(name, "Only instances have fields.").into());
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => self.lookup_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.super_method(*id, keyword, method),
        }
    }

    fn lookup_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        let value: Value = match self.locals.get(&id) {
            Some(&distance) => environment::get_at(&self.environment, distance, name)?,
            None => self.globals.borrow().get(name)?,
        };
        Ok(value)
    }

    /// `super.method` binds the superclass method to the current `this`.  The
    /// superclass is the one captured where the enclosing class was declared,
    /// never the runtime class of `this`.
    fn super_method(&self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let distance: usize = *self
            .locals
            .get(&id)
            .ok_or_else(|| RuntimeError::new(keyword, "Can't use 'super' outside of a class."))?;

        let Value::Callable(Callable::Class(superclass)) =
            environment::get_at(&self.environment, distance, keyword)?
        else {
            return Err(RuntimeError::new(keyword, "Superclass must be a class.").into());
        };

        // `this` lives in the frame just inside the one binding `super`.
        let this_token = Token::new(TokenType::THIS, "this", keyword.line);
        let object: Value =
            environment::get_at(&self.environment, distance.saturating_sub(1), &this_token)?;

        let function = superclass.find_method(&method.lexeme).ok_or_else(|| {
            RuntimeError::new(method, format!("Undefined property '{}'.", method.lexeme))
        })?;

        Ok(Value::Callable(Callable::Function(Rc::new(function.bind(object)))))
    }
}

/// Arithmetic, comparison and equality.
fn binary(operator: &Token, left: Value, right: Value) -> std::result::Result<Value, RuntimeError> {
    let numbers = |left: &Value, right: &Value| match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::new(operator, "Operands must be numbers.")),
    };

    match operator.token_type {
        TokenType::PLUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            _ => Err(RuntimeError::new(
                operator,
                "Operands must be two numbers or two strings.",
            )),
        },
        TokenType::MINUS => numbers(&left, &right).map(|(a, b)| Value::Number(a - b)),
        TokenType::STAR => numbers(&left, &right).map(|(a, b)| Value::Number(a * b)),
        // Division by zero yields inf / NaN, as IEEE‑754 says.
        TokenType::SLASH => numbers(&left, &right).map(|(a, b)| Value::Number(a / b)),
        TokenType::GREATER => numbers(&left, &right).map(|(a, b)| Value::Bool(a > b)),
        TokenType::GREATER_EQUAL => numbers(&left, &right).map(|(a, b)| Value::Bool(a >= b)),
        TokenType::LESS => numbers(&left, &right).map(|(a, b)| Value::Bool(a < b)),
        TokenType::LESS_EQUAL => numbers(&left, &right).map(|(a, b)| Value::Bool(a <= b)),
        TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
        TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),
        _ => Err(RuntimeError::new(operator, "Invalid binary operator.")),
    }
}
