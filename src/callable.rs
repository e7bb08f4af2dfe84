use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::LoxClass;
use crate::environment::{EnvRef, Environment};
use crate::error::{Result, RuntimeError};
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;
use crate::value::{Callable, Value};

/// Host implementation of a native function.  An `Err` becomes a runtime
/// failure located at the call's closing parenthesis.
pub type NativeFn = Box<dyn Fn(&[Value]) -> std::result::Result<Value, String>>;

/// A user function or method: its declaration plus the environment it closes
/// over.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A copy of this method whose closure additionally binds `this`.
    pub fn bind(&self, instance: Value) -> LoxFunction {
        let environment: EnvRef = Environment::with_enclosing(Rc::clone(&self.closure)).into_ref();
        environment.borrow_mut().define("this", instance);

        LoxFunction::new(
            Rc::clone(&self.declaration),
            environment,
            self.is_initializer,
        )
    }

    /// Run the body in a fresh frame parented at the closure, not at the
    /// caller's environment.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        let environment: EnvRef = Environment::with_enclosing(Rc::clone(&self.closure)).into_ref();
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        let flow: Flow = interpreter.execute_block(&self.declaration.body, environment)?;

        if self.is_initializer {
            return Ok(self.closure.borrow().get_here("this").unwrap_or(Value::Nil));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

/// A function implemented by the host and seeded into the globals.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({}/{})", self.name, self.arity)
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn>")
    }
}

impl Callable {
    /// Number of arguments a call must supply.
    pub fn arity(&self) -> usize {
        match self {
            Callable::Function(function) => function.arity(),
            Callable::Class(class) => class.arity(),
            Callable::Native(native) => native.arity,
        }
    }

    /// Invoke with already‑evaluated, arity‑checked arguments.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value> {
        match self {
            Callable::Function(function) => function.call(interpreter, arguments),
            Callable::Class(class) => LoxClass::instantiate(class, interpreter, arguments),
            Callable::Native(native) => {
                debug!("Calling native function '{}'", native.name);
                (native.func)(&arguments).map_err(|message| RuntimeError::new(paren, message).into())
            }
        }
    }
}
