use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::callable::{LoxFunction, NativeFunction};
use crate::class::{Instance, LoxClass};

/// Anything that can appear on the left of `(...)`.
#[derive(Debug, Clone)]
pub enum Callable {
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
    Native(Rc<NativeFunction>),
}

impl PartialEq for Callable {
    /// Callables compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Callable(Callable),
    Instance(Rc<RefCell<Instance>>),
}

impl Value {
    /// `nil` and `false` are falsy; everything else, `0` and `""` included,
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Callable(Callable::Function(function)) => write!(f, "{}", function),

            Value::Callable(Callable::Class(class)) => write!(f, "{}", class),

            Value::Callable(Callable::Native(native)) => write!(f, "{}", native),

            Value::Instance(instance) => write!(f, "{}", instance.borrow()),
        }
    }
}
